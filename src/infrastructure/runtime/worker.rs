//! Async worker - runs in the Tokio runtime and talks to the wallet provider

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::Result;
use tokio::task::JoinHandle;

use crate::infrastructure::ethereum::{create_provider, ProviderConfig, WalletProvider};
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, TxKind};

/// Run the async worker loop
pub async fn run_async_worker(
    endpoint: Option<ProviderConfig>,
    contract: Address,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let Some(config) = endpoint else {
        tracing::warn!("no wallet endpoint configured");
        let _ = evt_tx.send(RuntimeEvent::ProviderMissing {
            reason: "No wallet endpoint configured".to_string(),
        });
        return idle_until_shutdown(cmd_rx).await;
    };

    let endpoint_label = config.display();
    let provider = match create_provider(config).await {
        Ok(provider) => provider,
        Err(err) => {
            tracing::warn!(endpoint = %endpoint_label, error = %format!("{err:#}"), "wallet provider unavailable");
            let _ = evt_tx.send(RuntimeEvent::ProviderMissing {
                reason: format!("{endpoint_label}: {err:#}"),
            });
            return idle_until_shutdown(cmd_rx).await;
        }
    };

    let _ = evt_tx.send(RuntimeEvent::ProviderReady {
        endpoint: provider.endpoint_name(),
    });
    serve(Arc::from(provider), contract, cmd_rx, evt_tx).await
}

/// A forwarding task for one subscription epoch. Dropping it aborts the task,
/// which drops the provider feed with it.
struct ActiveSubscription {
    epoch: u64,
    task: JoinHandle<()>,
}

impl Drop for ActiveSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve commands against a connected provider until shutdown.
///
/// Reads and transactions run as independent tasks, so replies may arrive in
/// any order; the sequence and epoch numbers they carry let the UI discard
/// stale ones.
pub async fn serve(
    provider: Arc<dyn WalletProvider>,
    contract: Address,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut subscription: Option<ActiveSubscription> = None;

    loop {
        loop {
            let cmd = match cmd_rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            };

            match cmd {
                RuntimeCommand::Shutdown => {
                    tracing::info!("runtime worker shutting down");
                    return Ok(());
                }

                RuntimeCommand::RequestAccounts { interactive } => {
                    let provider = Arc::clone(&provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let result = if interactive {
                            provider.request_accounts().await
                        } else {
                            provider.accounts().await
                        };
                        let event = match result {
                            Ok(accounts) => RuntimeEvent::Accounts {
                                interactive,
                                accounts,
                            },
                            Err(err) => RuntimeEvent::Error {
                                message: format!("Account request failed: {:#}", err),
                            },
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::FetchKeyboards { seq } => {
                    let provider = Arc::clone(&provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let event = match provider.keyboards(contract).await {
                            Ok(keyboards) => {
                                tracing::debug!(seq, count = keyboards.len(), "keyboards fetched");
                                RuntimeEvent::KeyboardsLoaded { seq, keyboards }
                            }
                            Err(err) => RuntimeEvent::KeyboardsFailed {
                                seq,
                                message: format!("{:#}", err),
                            },
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::Subscribe { epoch } => {
                    // Tear down the previous listeners before attaching new ones
                    if let Some(previous) = subscription.take() {
                        tracing::debug!(epoch = previous.epoch, "dropping subscription");
                    }
                    match provider.subscribe_events(contract).await {
                        Ok(mut feed) => {
                            let forward_tx = evt_tx.clone();
                            let task = tokio::spawn(async move {
                                while let Some(event) = feed.recv().await {
                                    if forward_tx
                                        .send(RuntimeEvent::Contract { epoch, event })
                                        .is_err()
                                    {
                                        return;
                                    }
                                }
                                // Feed closed by the provider side, not by an abort
                                tracing::warn!(epoch, "contract event feed ended");
                                let _ = forward_tx.send(RuntimeEvent::SubscriptionEnded { epoch });
                            });
                            subscription = Some(ActiveSubscription { epoch, task });
                            tracing::info!(epoch, "subscribed to contract events");
                            let _ = evt_tx.send(RuntimeEvent::Subscribed { epoch });
                        }
                        Err(err) => {
                            tracing::warn!(epoch, error = %format!("{err:#}"), "event subscription failed");
                            let _ = evt_tx.send(RuntimeEvent::SubscriptionFailed {
                                epoch,
                                message: format!("Event subscription failed: {:#}", err),
                            });
                        }
                    }
                }

                RuntimeCommand::Unsubscribe => {
                    if let Some(previous) = subscription.take() {
                        tracing::info!(epoch = previous.epoch, "unsubscribed from contract events");
                    }
                }

                RuntimeCommand::CreateKeyboard { from, keyboard } => {
                    let provider = Arc::clone(&provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let kind = TxKind::Create;
                        let event = match provider.create_keyboard(contract, from, &keyboard).await
                        {
                            Ok(hash) => RuntimeEvent::TxConfirmed { kind, hash },
                            Err(err) => RuntimeEvent::TxFailed {
                                kind,
                                message: format!("{:#}", err),
                            },
                        };
                        let _ = evt_tx.send(event);
                    });
                }

                RuntimeCommand::Tip {
                    from,
                    index,
                    amount,
                } => {
                    let provider = Arc::clone(&provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let kind = TxKind::Tip { index };
                        let event = match provider.tip(contract, from, index, amount).await {
                            Ok(hash) => RuntimeEvent::TxConfirmed { kind, hash },
                            Err(err) => RuntimeEvent::TxFailed {
                                kind,
                                message: format!("{:#}", err),
                            },
                        };
                        let _ = evt_tx.send(event);
                    });
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Without a provider there is nothing to serve; drain commands until told
/// to stop.
async fn idle_until_shutdown(cmd_rx: Receiver<RuntimeCommand>) -> Result<()> {
    loop {
        match cmd_rx.try_recv() {
            Ok(RuntimeCommand::Shutdown) | Err(TryRecvError::Disconnected) => return Ok(()),
            Ok(cmd) => tracing::debug!(?cmd, "ignored, no wallet provider"),
            Err(TryRecvError::Empty) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
}
