//! Ethereum transactions wrapped in cosmos messages.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxLegacy};
use alloy_eips::eip2930::AccessList;
use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use ev_common::MSG_ETHEREUM_TX_TYPE_URL;
use thiserror::Error;

/// Errors raised while interpreting an Ethereum message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Neither a `from` address nor a signature is present.
    #[error("sender address not set and no signature to recover it from")]
    MissingSender,
    /// The signature could not be recovered.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    /// The declared sender differs from the recovered signer.
    #[error("declared sender {declared} does not match signer {recovered}")]
    SenderMismatch {
        /// Address set in the message.
        declared: Address,
        /// Address recovered from the signature.
        recovered: Address,
    },
}

/// Body of an Ethereum transaction, in one of the supported envelope formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthTxData {
    /// Pre-EIP-2718 transaction.
    Legacy(TxLegacy),
    /// EIP-2930 access list transaction.
    AccessList(TxEip2930),
    /// EIP-1559 dynamic fee transaction.
    DynamicFee(TxEip1559),
}

impl EthTxData {
    /// Transaction nonce.
    pub const fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::AccessList(tx) => tx.nonce,
            Self::DynamicFee(tx) => tx.nonce,
        }
    }

    /// Gas limit.
    pub const fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.gas_limit,
            Self::AccessList(tx) => tx.gas_limit,
            Self::DynamicFee(tx) => tx.gas_limit,
        }
    }

    /// Transferred value.
    pub const fn value(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.value,
            Self::AccessList(tx) => tx.value,
            Self::DynamicFee(tx) => tx.value,
        }
    }

    /// Call target, `None` for contract creation.
    pub fn to(&self) -> Option<Address> {
        let kind = match self {
            Self::Legacy(tx) => tx.to,
            Self::AccessList(tx) => tx.to,
            Self::DynamicFee(tx) => tx.to,
        };
        kind.to().copied()
    }

    /// Returns true for contract creation.
    pub fn is_create(&self) -> bool {
        self.to().is_none()
    }

    /// Call data.
    pub const fn input(&self) -> &Bytes {
        match self {
            Self::Legacy(tx) => &tx.input,
            Self::AccessList(tx) => &tx.input,
            Self::DynamicFee(tx) => &tx.input,
        }
    }

    /// Access list; legacy transactions have none.
    pub const fn access_list(&self) -> Option<&AccessList> {
        match self {
            Self::Legacy(_) => None,
            Self::AccessList(tx) => Some(&tx.access_list),
            Self::DynamicFee(tx) => Some(&tx.access_list),
        }
    }

    /// Returns true for EIP-1559 transactions.
    pub const fn is_dynamic_fee(&self) -> bool {
        matches!(self, Self::DynamicFee(_))
    }

    /// Gas price for legacy formats, fee cap for dynamic fee transactions.
    pub const fn gas_price(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::AccessList(tx) => tx.gas_price,
            Self::DynamicFee(tx) => tx.max_fee_per_gas,
        }
    }

    /// Maximum price per gas the sender pays.
    pub const fn gas_fee_cap(&self) -> u128 {
        self.gas_price()
    }

    /// Maximum tip per gas; equal to the gas price for legacy formats.
    pub const fn gas_tip_cap(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::AccessList(tx) => tx.gas_price,
            Self::DynamicFee(tx) => tx.max_priority_fee_per_gas,
        }
    }

    /// Price actually paid per gas: `min(tip + base_fee, fee_cap)` for dynamic fee
    /// transactions, the plain gas price otherwise.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match (self, base_fee) {
            (Self::DynamicFee(tx), Some(base_fee)) => {
                let cap = U256::from(tx.max_fee_per_gas);
                base_fee.saturating_add(U256::from(tx.max_priority_fee_per_gas)).min(cap)
            }
            _ => U256::from(self.gas_price()),
        }
    }

    /// `effective_gas_price × gas_limit`.
    pub fn effective_fee(&self, base_fee: Option<U256>) -> U256 {
        self.effective_gas_price(base_fee).saturating_mul(U256::from(self.gas_limit()))
    }

    /// Maximum fee the sender can be charged: `gas_price × gas_limit`.
    pub fn fee(&self) -> U256 {
        U256::from(self.gas_price()).saturating_mul(U256::from(self.gas_limit()))
    }

    /// Maximum total cost: fee plus value.
    pub fn cost(&self) -> U256 {
        self.fee().saturating_add(self.value())
    }

    /// Chain id the transaction is bound to, if any.
    pub const fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::AccessList(tx) => Some(tx.chain_id),
            Self::DynamicFee(tx) => Some(tx.chain_id),
        }
    }

    /// Hash signed by the sender.
    pub fn signature_hash(&self) -> B256 {
        match self {
            Self::Legacy(tx) => tx.signature_hash(),
            Self::AccessList(tx) => tx.signature_hash(),
            Self::DynamicFee(tx) => tx.signature_hash(),
        }
    }
}

/// An Ethereum transaction carried as a cosmos message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgEthereumTx {
    /// Transaction body.
    pub data: EthTxData,
    /// Declared sender.
    pub from: Option<Address>,
    /// Account the transaction is executed for, through an authorization grant.
    pub on_behalf: Option<Address>,
    /// Sender signature over [`EthTxData::signature_hash`].
    pub signature: Option<Signature>,
}

impl MsgEthereumTx {
    /// Wraps an unsigned transaction body.
    pub const fn new(data: EthTxData) -> Self {
        Self { data, from: None, on_behalf: None, signature: None }
    }

    /// Sets the declared sender.
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the on-behalf account.
    pub fn with_on_behalf(mut self, on_behalf: Address) -> Self {
        self.on_behalf = Some(on_behalf);
        self
    }

    /// Attaches a signature.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Resolves the sender. When both a declared address and a signature are present they
    /// must agree.
    pub fn sender(&self) -> Result<Address, TxError> {
        let recovered = self
            .signature
            .as_ref()
            .map(|signature| {
                signature
                    .recover_address_from_prehash(&self.data.signature_hash())
                    .map_err(|err| TxError::InvalidSignature(err.to_string()))
            })
            .transpose()?;

        match (self.from, recovered) {
            (Some(declared), Some(recovered)) if declared != recovered => {
                Err(TxError::SenderMismatch { declared, recovered })
            }
            (Some(address), _) | (None, Some(address)) => Ok(address),
            (None, None) => Err(TxError::MissingSender),
        }
    }

    /// Re-derives the message the EVM executes for this transaction.
    pub fn as_message(&self, from: Address, base_fee: Option<U256>) -> EvmMessage {
        EvmMessage {
            from,
            to: self.data.to(),
            nonce: self.data.nonce(),
            value: self.data.value(),
            gas_limit: self.data.gas_limit(),
            gas_price: self.data.effective_gas_price(base_fee),
            gas_fee_cap: U256::from(self.data.gas_fee_cap()),
            gas_tip_cap: U256::from(self.data.gas_tip_cap()),
            data: self.data.input().clone(),
            access_list: self.data.access_list().cloned().unwrap_or_default(),
        }
    }
}

/// The message handed to the EVM once the envelope has been interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmMessage {
    /// Sender.
    pub from: Address,
    /// Target, `None` for contract creation.
    pub to: Option<Address>,
    /// Sender nonce.
    pub nonce: u64,
    /// Transferred value.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Effective gas price.
    pub gas_price: U256,
    /// Fee cap.
    pub gas_fee_cap: U256,
    /// Tip cap.
    pub gas_tip_cap: U256,
    /// Call data.
    pub data: Bytes,
    /// Access list.
    pub access_list: AccessList,
}

/// A message inside a cosmos transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Ethereum transaction.
    Ethereum(MsgEthereumTx),
    /// Any other cosmos message, identified by its type URL.
    Other {
        /// Protobuf type URL.
        type_url: String,
    },
}

impl Msg {
    /// Protobuf type URL of the message.
    pub fn type_url(&self) -> &str {
        match self {
            Self::Ethereum(_) => MSG_ETHEREUM_TX_TYPE_URL,
            Self::Other { type_url } => type_url,
        }
    }

    /// Returns the Ethereum message, if this is one.
    pub const fn as_ethereum(&self) -> Option<&MsgEthereumTx> {
        match self {
            Self::Ethereum(msg) => Some(msg),
            Self::Other { .. } => None,
        }
    }
}

impl From<MsgEthereumTx> for Msg {
    fn from(msg: MsgEthereumTx) -> Self {
        Self::Ethereum(msg)
    }
}

/// A cosmos transaction as seen by the admission pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tx {
    /// Messages in execution order.
    pub msgs: Vec<Msg>,
}

impl Tx {
    /// Builds a transaction from messages.
    pub const fn new(msgs: Vec<Msg>) -> Self {
        Self { msgs }
    }

    /// Builds a transaction holding a single Ethereum message.
    pub fn from_eth(msg: MsgEthereumTx) -> Self {
        Self { msgs: vec![Msg::Ethereum(msg)] }
    }

    /// Total gas limit over the Ethereum messages.
    pub fn gas(&self) -> u64 {
        self.msgs
            .iter()
            .filter_map(Msg::as_ethereum)
            .fold(0u64, |acc, msg| acc.saturating_add(msg.data.gas_limit()))
    }
}
