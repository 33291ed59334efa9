pub mod keyboard_tile;

pub use keyboard_tile::{KeyboardTile, TILE_HEIGHT};
