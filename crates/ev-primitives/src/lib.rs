//! Primitive types shared by the ev-cosmos modules.
//!
//! Everything here is plain data: coin amounts, the Ethereum message envelope carried inside
//! cosmos transactions, ERC20 token pairs, authorization grants and ICS-20 packets. Behavior
//! that touches state lives in the keeper crates.

pub mod account;
pub mod authz;
pub mod coin;
pub mod contracts;
pub mod ibc;
pub mod token_pair;
pub mod tx;

pub use account::Account;
pub use authz::{AcceptResponse, Authorization, GenericAuthorization, Grant};
pub use coin::{Coin, CoinError, Coins};
pub use ibc::{Acknowledgement, DenomTrace, FungibleTokenPacketData, IbcError, Packet};
pub use token_pair::{Owner, TokenPair};
pub use tx::{EthTxData, EvmMessage, Msg, MsgEthereumTx, Tx, TxError};
