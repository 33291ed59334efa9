//! Domain layer - keyboard records, notifications and screen selection

pub mod keyboard;
pub mod notify;
pub mod view;

pub use keyboard::{format_ether, ContractEvent, Keyboard, KeyboardKind, NewKeyboard, FILTERS};
pub use notify::{Notifications, Toast, TOAST_LIFETIME};
pub use view::{select_screen, Screen, Tile, TileAction};
