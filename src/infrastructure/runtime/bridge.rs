//! Runtime bridge - connects the sync TUI thread with the async Tokio runtime
//!
//! The UI thread owns all state. It sends [`RuntimeCommand`]s and drains
//! [`RuntimeEvent`]s once per frame; the worker never touches UI state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use alloy::primitives::{Address, TxHash, U256};
use tokio::runtime::Runtime;

use crate::domain::{ContractEvent, Keyboard, NewKeyboard};
use crate::infrastructure::ethereum::ProviderConfig;
use crate::infrastructure::runtime::worker::run_async_worker;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Resolve accounts; `interactive` asks the wallet for access
    RequestAccounts { interactive: bool },
    /// Read the keyboard list; the reply carries the same `seq`
    FetchKeyboards { seq: u64 },
    /// Replace any live subscription with a new one tagged `epoch`
    Subscribe { epoch: u64 },
    /// Drop the live subscription
    Unsubscribe,
    /// Send a `create` transaction
    CreateKeyboard { from: Address, keyboard: NewKeyboard },
    /// Send a `tip` transaction
    Tip {
        from: Address,
        index: usize,
        amount: U256,
    },
    /// Shutdown the worker
    Shutdown,
}

/// Which transaction a [`RuntimeEvent::TxConfirmed`] or
/// [`RuntimeEvent::TxFailed`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Create,
    Tip { index: usize },
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A wallet endpoint is configured and reachable
    ProviderReady { endpoint: String },
    /// No usable wallet endpoint
    ProviderMissing { reason: String },
    /// Account list returned by the wallet
    Accounts {
        interactive: bool,
        accounts: Vec<Address>,
    },
    /// Keyboard list for fetch `seq`
    KeyboardsLoaded { seq: u64, keyboards: Vec<Keyboard> },
    /// Fetch `seq` failed
    KeyboardsFailed { seq: u64, message: String },
    /// Subscription `epoch` is live
    Subscribed { epoch: u64 },
    /// Subscription `epoch` could not be established
    SubscriptionFailed { epoch: u64, message: String },
    /// The feed behind subscription `epoch` closed on its own
    SubscriptionEnded { epoch: u64 },
    /// Contract event received on subscription `epoch`
    Contract { epoch: u64, event: ContractEvent },
    /// Transaction included
    TxConfirmed { kind: TxKind, hash: TxHash },
    /// Transaction rejected or dropped
    TxFailed { kind: TxKind, message: String },
    /// Error occurred
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread. `endpoint` is the injected wallet provider;
    /// `None` means no wallet is available.
    pub fn new(endpoint: Option<ProviderConfig>, contract: Address) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new()?;
        thread::Builder::new()
            .name("keyboards-runtime".into())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) =
                        run_async_worker(endpoint, contract, cmd_rx, evt_tx.clone()).await
                    {
                        tracing::error!(error = %format!("{err:#}"), "runtime worker exited");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
