//! Ethereum infrastructure - wallet provider and Keyboards contract binding

pub mod contract;
mod provider;
pub(crate) mod types;

pub use provider::{
    create_provider, AlloyProvider, EventSubscription, ProviderConfig, WalletProvider,
};
