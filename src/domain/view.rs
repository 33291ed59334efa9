//! Screen selection
//!
//! The whole screen is a pure function of connection state and the keyboard
//! list, evaluated top to bottom:
//!
//! 1. no wallet provider      -> [`Screen::InstallWallet`]
//! 2. no connected account    -> [`Screen::Connect`]
//! 3. non-empty keyboard list -> [`Screen::Grid`]
//! 4. fetch in flight         -> [`Screen::Loading`]
//! 5. otherwise               -> [`Screen::Empty`]

use alloy::primitives::Address;

use super::keyboard::Keyboard;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen<'a> {
    InstallWallet,
    Connect,
    Grid(Vec<Tile<'a>>),
    Loading,
    Empty,
}

impl Screen<'_> {
    /// Whether the create action is offered on this screen
    pub fn offers_create(&self) -> bool {
        matches!(self, Screen::Grid(_) | Screen::Loading | Screen::Empty)
    }
}

/// One grid cell: the record plus the single action rendered in its corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile<'a> {
    pub index: usize,
    pub keyboard: &'a Keyboard,
    pub action: TileAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileAction {
    /// Viewer owns the keyboard
    OwnerBadge,
    /// Viewer may tip the owner
    Tip,
}

pub fn select_screen<'a>(
    has_provider: bool,
    account: Option<Address>,
    keyboards: &'a [Keyboard],
    loading: bool,
) -> Screen<'a> {
    if !has_provider {
        return Screen::InstallWallet;
    }
    let Some(account) = account else {
        return Screen::Connect;
    };
    if !keyboards.is_empty() {
        let tiles = keyboards
            .iter()
            .enumerate()
            .map(|(index, keyboard)| Tile {
                index,
                keyboard,
                action: if keyboard.is_owned_by(account) {
                    TileAction::OwnerBadge
                } else {
                    TileAction::Tip
                },
            })
            .collect();
        return Screen::Grid(tiles);
    }
    if loading {
        Screen::Loading
    } else {
        Screen::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keyboard::KeyboardKind;

    fn keyboard(owner: Address) -> Keyboard {
        Keyboard {
            kind: KeyboardKind::SeventyFivePercent,
            is_pbt: false,
            filter: "grayscale".into(),
            owner,
        }
    }

    #[test]
    fn test_missing_provider_wins() {
        let me = Address::repeat_byte(1);
        let list = vec![keyboard(me)];
        for loading in [false, true] {
            assert_eq!(
                select_screen(false, Some(me), &list, loading),
                Screen::InstallWallet
            );
            assert_eq!(select_screen(false, None, &[], loading), Screen::InstallWallet);
        }
    }

    #[test]
    fn test_no_account_shows_connect() {
        let list = vec![keyboard(Address::repeat_byte(2))];
        assert_eq!(select_screen(true, None, &list, true), Screen::Connect);
        assert_eq!(select_screen(true, None, &[], false), Screen::Connect);
    }

    #[test]
    fn test_grid_marks_owned_tiles() {
        let me = Address::repeat_byte(1);
        let other = Address::repeat_byte(2);
        let list = vec![keyboard(me), keyboard(other), keyboard(me)];

        let Screen::Grid(tiles) = select_screen(true, Some(me), &list, true) else {
            panic!("expected grid");
        };
        let actions: Vec<_> = tiles.iter().map(|t| t.action).collect();
        assert_eq!(
            actions,
            vec![TileAction::OwnerBadge, TileAction::Tip, TileAction::OwnerBadge]
        );
        assert_eq!(tiles[1].index, 1);
    }

    #[test]
    fn test_empty_list_loading_vs_empty() {
        let me = Address::repeat_byte(1);
        assert_eq!(select_screen(true, Some(me), &[], true), Screen::Loading);
        assert_eq!(select_screen(true, Some(me), &[], false), Screen::Empty);
        assert!(Screen::Loading.offers_create());
        assert!(!Screen::Connect.offers_create());
    }
}
