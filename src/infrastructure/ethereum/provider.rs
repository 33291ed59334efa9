//! Wallet provider abstraction and the Alloy implementation
//!
//! A "wallet provider" here is a JSON-RPC endpoint that manages accounts on
//! the user's behalf: it answers `eth_accounts` / `eth_requestAccounts` and
//! signs `eth_sendTransaction` requests itself.

use std::path::PathBuf;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy::transports::RpcError;
use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::{ContractEvent, Keyboard, NewKeyboard};
use crate::infrastructure::ethereum::contract::Keyboards;
use crate::infrastructure::ethereum::types::{decode_event, event_signatures};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Classify a URL by scheme. Anything that is not `ws://`/`wss://` is
    /// treated as HTTP.
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("ws://") || lower.starts_with("wss://") {
            ProviderConfig::WebSocket(url.to_string())
        } else {
            ProviderConfig::Http(url.to_string())
        }
    }

    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Check if this endpoint can push log subscriptions
    pub fn is_pubsub(&self) -> bool {
        match self {
            ProviderConfig::Http(_) => false,
            ProviderConfig::WebSocket(_) => true,
            #[cfg(unix)]
            ProviderConfig::Ipc(_) => true,
        }
    }
}

/// Live contract event feed. Dropping it tears down the background task that
/// feeds it, which ends the node-side subscription or filter polling.
pub struct EventSubscription {
    events: mpsc::Receiver<ContractEvent>,
    task: Option<JoinHandle<()>>,
}

impl EventSubscription {
    pub fn new(events: mpsc::Receiver<ContractEvent>, task: JoinHandle<()>) -> Self {
        Self {
            events,
            task: Some(task),
        }
    }

    /// Feed with no background task of its own (the sender side is owned by
    /// the caller)
    pub fn from_receiver(events: mpsc::Receiver<ContractEvent>) -> Self {
        Self { events, task: None }
    }

    pub async fn recv(&mut self) -> Option<ContractEvent> {
        self.events.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Operations the client needs from a wallet provider and the Keyboards
/// contract behind it.
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync + 'static {
    /// Already-authorized accounts (`eth_accounts`), never prompts
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Ask the wallet for account access (`eth_requestAccounts`), may prompt
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Read every keyboard record from the contract
    async fn keyboards(&self, contract: Address) -> Result<Vec<Keyboard>>;

    /// Subscribe to `KeyboardCreated` and `TipSent`
    async fn subscribe_events(&self, contract: Address) -> Result<EventSubscription>;

    /// Send `create(kind, isPBT, filter)` from `from` and wait for inclusion
    async fn create_keyboard(
        &self,
        contract: Address,
        from: Address,
        keyboard: &NewKeyboard,
    ) -> Result<TxHash>;

    /// Send `tip(index)` with `amount` wei attached and wait for inclusion
    async fn tip(
        &self,
        contract: Address,
        from: Address,
        index: usize,
        amount: U256,
    ) -> Result<TxHash>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

pub struct AlloyProvider {
    provider: DynProvider,
    endpoint: String,
    pubsub: bool,
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn WalletProvider>> {
    let endpoint = config.display();
    let pubsub = config.is_pubsub();
    let provider = match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            ProviderBuilder::new().connect_http(rpc_url).erased()
        }
        ProviderConfig::WebSocket(url) => ProviderBuilder::new()
            .connect(&url)
            .await
            .context("Failed to create WebSocket provider")?
            .erased(),
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?
                .erased()
        }
    };

    tracing::info!(endpoint = %endpoint, pubsub, "wallet provider ready");
    Ok(Box::new(AlloyProvider {
        provider,
        endpoint,
        pubsub,
    }))
}

/// JSON-RPC "method not found"
const METHOD_NOT_FOUND: i64 = -32601;
/// EIP-1193 "unsupported method"
const UNSUPPORTED_METHOD: i64 = 4200;

/// Whether the endpoint rejected the call because it does not implement the
/// method. User rejections (4001) and transport failures do not count.
fn is_unsupported_method<E>(err: &RpcError<E>) -> bool {
    err.as_error_resp()
        .is_some_and(|payload| matches!(payload.code, METHOD_NOT_FOUND | UNSUPPORTED_METHOD))
}

#[async_trait::async_trait]
impl WalletProvider for AlloyProvider {
    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let requested: std::result::Result<Vec<Address>, _> = self
            .provider
            .raw_request("eth_requestAccounts".into(), ())
            .await;

        match requested {
            Ok(accounts) => Ok(accounts),
            // Plain nodes (anvil, geth --dev) only know eth_accounts
            Err(err) if is_unsupported_method(&err) => {
                tracing::debug!(error = %err, "eth_requestAccounts unsupported, using eth_accounts");
                self.accounts().await
            }
            Err(err) => Err(err).context("eth_requestAccounts failed"),
        }
    }

    async fn keyboards(&self, contract: Address) -> Result<Vec<Keyboard>> {
        let instance = Keyboards::new(contract, self.provider.clone());
        let raw = instance
            .getKeyboards()
            .call()
            .await
            .context("getKeyboards call failed")?;
        Ok(raw.into_iter().map(Keyboard::from).collect())
    }

    async fn subscribe_events(&self, contract: Address) -> Result<EventSubscription> {
        let filter = Filter::new()
            .address(contract)
            .event_signature(event_signatures());
        let (tx, rx) = mpsc::channel(64);

        let task = if self.pubsub {
            let sub = self
                .provider
                .subscribe_logs(&filter)
                .await
                .context("Failed to subscribe to contract logs")?;
            tokio::spawn(async move {
                let mut stream = sub.into_stream();
                while let Some(log) = stream.next().await {
                    let Some(event) = decode_event(&log) else {
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            })
        } else {
            let poller = self
                .provider
                .watch_logs(&filter)
                .await
                .context("Failed to install log filter")?;
            tokio::spawn(async move {
                let mut stream = poller.into_stream();
                while let Some(logs) = stream.next().await {
                    for log in logs {
                        let Some(event) = decode_event(&log) else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            })
        };

        Ok(EventSubscription::new(rx, task))
    }

    async fn create_keyboard(
        &self,
        contract: Address,
        from: Address,
        keyboard: &NewKeyboard,
    ) -> Result<TxHash> {
        let instance = Keyboards::new(contract, self.provider.clone());
        let pending = instance
            .create(keyboard.kind.raw(), keyboard.is_pbt, keyboard.filter.clone())
            .from(from)
            .send()
            .await
            .context("create transaction rejected")?;
        pending
            .watch()
            .await
            .context("create transaction was not confirmed")
    }

    async fn tip(
        &self,
        contract: Address,
        from: Address,
        index: usize,
        amount: U256,
    ) -> Result<TxHash> {
        let instance = Keyboards::new(contract, self.provider.clone());
        let pending = instance
            .tip(U256::from(index))
            .from(from)
            .value(amount)
            .send()
            .await
            .context("tip transaction rejected")?;
        pending
            .watch()
            .await
            .context("tip transaction was not confirmed")
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::{TransportError, TransportErrorKind};

    fn error_response(code: i64, message: &'static str) -> TransportError {
        TransportError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_only_unsupported_method_falls_back() {
        assert!(is_unsupported_method(&error_response(
            -32601,
            "the method eth_requestAccounts does not exist/is not available"
        )));
        assert!(is_unsupported_method(&error_response(4200, "Unsupported method")));

        assert!(!is_unsupported_method(&error_response(
            4001,
            "User rejected the request."
        )));
        assert!(!is_unsupported_method(&error_response(-32603, "internal error")));
        assert!(!is_unsupported_method(&TransportErrorKind::backend_gone()));
    }

    #[test]
    fn test_from_url_picks_transport() {
        assert_eq!(
            ProviderConfig::from_url("ws://127.0.0.1:8546"),
            ProviderConfig::WebSocket("ws://127.0.0.1:8546".into())
        );
        assert_eq!(
            ProviderConfig::from_url(" WSS://node.example "),
            ProviderConfig::WebSocket("WSS://node.example".into())
        );
        assert_eq!(
            ProviderConfig::from_url("http://localhost:8545"),
            ProviderConfig::Http("http://localhost:8545".into())
        );
        assert!(!ProviderConfig::from_url("http://localhost:8545").is_pubsub());
    }
}
