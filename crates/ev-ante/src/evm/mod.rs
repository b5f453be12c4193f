//! Stages specific to Ethereum transactions.

mod eth;
mod fees;
mod gas_wanted;
mod setup;

pub use eth::{
    CanTransferDecorator, EthAccountVerificationDecorator, EthGasConsumeDecorator,
    EthIncrementSenderSequenceDecorator, ATTRIBUTE_KEY_FEE, EVENT_TYPE_TX,
};
pub use fees::{intrinsic_gas, tx_priority, verify_fee};
pub use gas_wanted::GasWantedDecorator;
pub use setup::EthSetUpContextDecorator;

use crate::error::AnteError;
use ev_common::MSG_ETHEREUM_TX_TYPE_URL;
use ev_primitives::{Msg, MsgEthereumTx};

/// The Ethereum payload of `msg`, or an `InvalidType` error.
pub(crate) fn eth_msg(msg: &Msg) -> Result<&MsgEthereumTx, AnteError> {
    msg.as_ethereum().ok_or_else(|| {
        AnteError::InvalidType(format!(
            "invalid message type {}, expected {MSG_ETHEREUM_TX_TYPE_URL}",
            msg.type_url()
        ))
    })
}
