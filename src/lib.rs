//! Terminal client for the Keyboards contract: connect a wallet, browse the
//! on-chain keyboards, create new ones and tip their owners.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod ui;
