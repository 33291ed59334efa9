//! Errors surfaced to the user by the app layer

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("A wallet provider is required to connect an account")]
    MissingProvider,

    #[error("Connect an account first")]
    NotConnected,

    #[error("No keyboard at position {0}")]
    NoSuchKeyboard(usize),

    #[error("You own this keyboard")]
    OwnKeyboard,
}
