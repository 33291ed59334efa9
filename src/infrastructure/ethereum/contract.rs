//! Keyboards contract binding
//!
//! The contract declares `kind` as a Solidity enum; enums are encoded as
//! `uint8` on the wire, so the binding uses the plain integer and the domain
//! layer maps it to [`crate::domain::KeyboardKind`].

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Keyboards {
        struct Keyboard {
            uint8 kind;
            bool isPBT;
            string filter;
            address owner;
        }

        event KeyboardCreated(Keyboard keyboard);

        event TipSent(address recipient, uint256 amount);

        function getKeyboards() external view returns (Keyboard[] memory);

        function create(uint8 kind, bool isPBT, string calldata filter) external;

        function tip(uint256 index) external payable;
    }
}
