//! Keyboard records as returned by the Keyboards contract

use alloy::primitives::{Address, U256};
use serde::{Serialize, Serializer};

/// Layout of a keyboard, stored on chain as a `uint8` enum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardKind {
    SixtyPercent,
    SeventyFivePercent,
    EightyPercent,
    Iso105,
    /// Value outside the known enum range, kept verbatim
    Unknown(u8),
}

impl KeyboardKind {
    pub const ALL: [KeyboardKind; 4] = [
        KeyboardKind::SixtyPercent,
        KeyboardKind::SeventyFivePercent,
        KeyboardKind::EightyPercent,
        KeyboardKind::Iso105,
    ];

    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => KeyboardKind::SixtyPercent,
            1 => KeyboardKind::SeventyFivePercent,
            2 => KeyboardKind::EightyPercent,
            3 => KeyboardKind::Iso105,
            other => KeyboardKind::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match self {
            KeyboardKind::SixtyPercent => 0,
            KeyboardKind::SeventyFivePercent => 1,
            KeyboardKind::EightyPercent => 2,
            KeyboardKind::Iso105 => 3,
            KeyboardKind::Unknown(value) => *value,
        }
    }

    pub fn label(&self) -> String {
        match self {
            KeyboardKind::SixtyPercent => "60%".to_string(),
            KeyboardKind::SeventyFivePercent => "75%".to_string(),
            KeyboardKind::EightyPercent => "80%".to_string(),
            KeyboardKind::Iso105 => "ISO-105".to_string(),
            KeyboardKind::Unknown(value) => format!("kind #{value}"),
        }
    }

    /// Cycle through the known kinds (used by the create form)
    pub fn cycle(&self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let pos = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        Self::ALL[next]
    }
}

/// Serialized as the on-chain value, matching the event payload
impl Serialize for KeyboardKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.raw())
    }
}

/// Filter tags offered when creating a keyboard. Empty means no filter.
pub const FILTERS: [&str; 6] = [
    "",
    "sepia",
    "grayscale",
    "invert",
    "hue-rotate-90",
    "hue-rotate-180",
];

/// A keyboard record read from contract storage.
///
/// Records carry no id; they are addressed by their position in the list the
/// contract returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keyboard {
    pub kind: KeyboardKind,
    #[serde(rename = "isPBT")]
    pub is_pbt: bool,
    pub filter: String,
    pub owner: Address,
}

impl Keyboard {
    pub fn is_owned_by(&self, account: Address) -> bool {
        self.owner == account
    }

    pub fn keycaps(&self) -> &'static str {
        if self.is_pbt {
            "PBT"
        } else {
            "ABS"
        }
    }

    pub fn filter_label(&self) -> &str {
        if self.filter.trim().is_empty() {
            "none"
        } else {
            self.filter.as_str()
        }
    }

    /// Stable id for notifications about this record
    pub fn notification_id(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Parameters of a keyboard to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeyboard {
    pub kind: KeyboardKind,
    pub is_pbt: bool,
    pub filter: String,
}

impl Default for NewKeyboard {
    fn default() -> Self {
        Self {
            kind: KeyboardKind::SixtyPercent,
            is_pbt: false,
            filter: String::new(),
        }
    }
}

/// Events emitted by the Keyboards contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    KeyboardCreated(Keyboard),
    TipSent { recipient: Address, amount: U256 },
}

/// Format a wei amount as ether the way wallets print it: trailing zeros
/// trimmed, at least one fractional digit ("1.0", "0.01").
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(1_000_000_000_000_000_000u64);
    let whole = wei / unit;
    let frac = wei % unit;

    if frac.is_zero() {
        return format!("{whole}.0");
    }
    let frac_str = format!("{:0>18}", frac.to_string());
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

pub fn short_addr(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}..{}", &full[..6], &full[full.len() - 4..])
}
