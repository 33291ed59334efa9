//! In-memory wallet provider shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash, U256};
use anyhow::Result;
use tokio::sync::mpsc;

use keyboards::domain::{ContractEvent, Keyboard, KeyboardKind, NewKeyboard};
use keyboards::infrastructure::ethereum::{EventSubscription, WalletProvider};
use keyboards::infrastructure::runtime::RuntimeEvent;

pub fn me() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn other() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn contract() -> Address {
    Address::repeat_byte(0xee)
}

pub fn keyboard(owner: Address, kind: KeyboardKind) -> Keyboard {
    Keyboard {
        kind,
        is_pbt: false,
        filter: String::new(),
        owner,
    }
}

#[derive(Default)]
pub struct MockProvider {
    /// Returned by eth_accounts
    pub authorized: Vec<Address>,
    /// Returned by eth_requestAccounts
    pub granted: Vec<Address>,
    pub keyboards: Mutex<Vec<Keyboard>>,
    pub fail_fetch: bool,
    /// Number of upcoming subscribe calls that fail
    pub subscribe_failures: AtomicUsize,
    pub subscribe_attempts: AtomicUsize,
    /// Sender side of every feed handed out, in subscription order
    pub feeds: Mutex<Vec<mpsc::Sender<ContractEvent>>>,
    pub created: Mutex<Vec<(Address, NewKeyboard)>>,
    pub tips: Mutex<Vec<(Address, usize, U256)>>,
}

impl MockProvider {
    pub fn attempts(&self) -> usize {
        self.subscribe_attempts.load(Ordering::SeqCst)
    }

    pub fn feed(&self, index: usize) -> Option<mpsc::Sender<ContractEvent>> {
        self.feeds.lock().unwrap().get(index).cloned()
    }
}

#[async_trait::async_trait]
impl WalletProvider for MockProvider {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.authorized.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.granted.clone())
    }

    async fn keyboards(&self, contract_addr: Address) -> Result<Vec<Keyboard>> {
        assert_eq!(contract_addr, contract());
        if self.fail_fetch {
            anyhow::bail!("execution reverted");
        }
        Ok(self.keyboards.lock().unwrap().clone())
    }

    async fn subscribe_events(&self, _contract: Address) -> Result<EventSubscription> {
        self.subscribe_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .subscribe_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("transient ws error");
        }
        let (tx, rx) = mpsc::channel(16);
        self.feeds.lock().unwrap().push(tx);
        Ok(EventSubscription::from_receiver(rx))
    }

    async fn create_keyboard(
        &self,
        _contract: Address,
        from: Address,
        keyboard: &NewKeyboard,
    ) -> Result<TxHash> {
        self.created.lock().unwrap().push((from, keyboard.clone()));
        self.keyboards.lock().unwrap().push(Keyboard {
            kind: keyboard.kind,
            is_pbt: keyboard.is_pbt,
            filter: keyboard.filter.clone(),
            owner: from,
        });
        Ok(TxHash::repeat_byte(0x01))
    }

    async fn tip(
        &self,
        _contract: Address,
        from: Address,
        index: usize,
        amount: U256,
    ) -> Result<TxHash> {
        if index >= self.keyboards.lock().unwrap().len() {
            anyhow::bail!("execution reverted: no such keyboard");
        }
        self.tips.lock().unwrap().push((from, index, amount));
        Ok(TxHash::repeat_byte(0x02))
    }

    fn endpoint_name(&self) -> String {
        "mock://wallet".to_string()
    }
}

/// Wait for the next worker event, failing the test after two seconds
pub async fn next_event(rx: &Receiver<RuntimeEvent>) -> RuntimeEvent {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Ok(event) = rx.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "timed out waiting for worker event");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until `check` holds, failing the test after two seconds
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
