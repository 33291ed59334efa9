//! Type conversions between contract binding types and domain types

use alloy::primitives::B256;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;

use crate::domain::{ContractEvent, Keyboard, KeyboardKind};
use crate::infrastructure::ethereum::contract::Keyboards;

impl From<Keyboards::Keyboard> for Keyboard {
    fn from(raw: Keyboards::Keyboard) -> Self {
        Keyboard {
            kind: KeyboardKind::from_raw(raw.kind),
            is_pbt: raw.isPBT,
            filter: raw.filter,
            owner: raw.owner,
        }
    }
}

/// Topic0 values of the events the client listens to
pub fn event_signatures() -> Vec<B256> {
    vec![
        Keyboards::KeyboardCreated::SIGNATURE_HASH,
        Keyboards::TipSent::SIGNATURE_HASH,
    ]
}

/// Decode a raw log into a contract event. Logs with other topics, or that
/// fail to decode, are skipped.
pub fn decode_event(log: &Log) -> Option<ContractEvent> {
    let topic0 = *log.inner.data.topics().first()?;

    if topic0 == Keyboards::KeyboardCreated::SIGNATURE_HASH {
        let decoded = log.log_decode::<Keyboards::KeyboardCreated>().ok()?;
        return Some(ContractEvent::KeyboardCreated(
            decoded.inner.data.keyboard.into(),
        ));
    }
    if topic0 == Keyboards::TipSent::SIGNATURE_HASH {
        let decoded = log.log_decode::<Keyboards::TipSent>().ok()?;
        let Keyboards::TipSent { recipient, amount } = decoded.inner.data;
        return Some(ContractEvent::TipSent { recipient, amount });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, LogData, U256};

    fn rpc_log(data: LogData) -> Log {
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0xee),
                data,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_tip_sent() {
        let event = Keyboards::TipSent {
            recipient: Address::repeat_byte(0x42),
            amount: U256::from(10_000_000_000_000_000u64),
        };
        let log = rpc_log(event.encode_log_data());

        assert_eq!(
            decode_event(&log),
            Some(ContractEvent::TipSent {
                recipient: Address::repeat_byte(0x42),
                amount: U256::from(10_000_000_000_000_000u64),
            })
        );
    }

    #[test]
    fn test_decode_keyboard_created() {
        let event = Keyboards::KeyboardCreated {
            keyboard: Keyboards::Keyboard {
                kind: 3,
                isPBT: true,
                filter: "sepia".into(),
                owner: Address::repeat_byte(0x07),
            },
        };
        let log = rpc_log(event.encode_log_data());

        let Some(ContractEvent::KeyboardCreated(keyboard)) = decode_event(&log) else {
            panic!("expected KeyboardCreated");
        };
        assert_eq!(keyboard.kind, KeyboardKind::Iso105);
        assert!(keyboard.is_pbt);
        assert_eq!(keyboard.filter, "sepia");
        assert_eq!(keyboard.owner, Address::repeat_byte(0x07));
    }

    #[test]
    fn test_unrelated_log_is_skipped() {
        let data = LogData::new_unchecked(vec![B256::repeat_byte(0x01)], Default::default());
        assert_eq!(decode_event(&rpc_log(data)), None);
        assert_eq!(decode_event(&rpc_log(LogData::default())), None);
    }
}
