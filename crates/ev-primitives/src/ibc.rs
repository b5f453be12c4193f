//! ICS-20 packets, acknowledgements and denomination traces.

use crate::coin::Coin;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Result bytes of a successful ICS-20 acknowledgement (`0x01`, base64).
pub const SUCCESS_ACK_RESULT: &str = "AQ==";

/// Errors raised while decoding packet payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IbcError {
    /// Packet data is not valid ICS-20 JSON.
    #[error("cannot unmarshal ICS-20 transfer packet data: {0}")]
    InvalidPacketData(String),
    /// Acknowledgement is not valid JSON.
    #[error("cannot unmarshal ICS-20 transfer packet acknowledgement: {0}")]
    InvalidAcknowledgement(String),
    /// Amount is not a base-10 unsigned integer.
    #[error("invalid transfer amount {0:?}")]
    InvalidAmount(String),
    /// Packet data or an acknowledgement could not be serialized.
    #[error("cannot marshal ICS-20 payload: {0}")]
    Encode(String),
}

/// An IBC packet as delivered to application callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    /// Sequence number on the sending channel end.
    pub sequence: u64,
    /// Port on the sending chain.
    pub source_port: String,
    /// Channel on the sending chain.
    pub source_channel: String,
    /// Port on the receiving chain.
    pub destination_port: String,
    /// Channel on the receiving chain.
    pub destination_channel: String,
    /// Opaque application payload.
    pub data: Vec<u8>,
}

/// ICS-20 fungible token transfer payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    /// Denomination trace as seen by the sender.
    pub denom: String,
    /// Base-10 amount.
    pub amount: String,
    /// Sender address on the sending chain.
    pub sender: String,
    /// Receiver address on the receiving chain.
    pub receiver: String,
    /// Optional memo.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
}

impl FungibleTokenPacketData {
    /// Parses a JSON payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self, IbcError> {
        serde_json::from_slice(data).map_err(|err| IbcError::InvalidPacketData(err.to_string()))
    }

    /// Serializes to JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IbcError> {
        serde_json::to_vec(self).map_err(|err| IbcError::Encode(err.to_string()))
    }

    /// Parses the transfer amount.
    pub fn amount(&self) -> Result<U256, IbcError> {
        U256::from_str_radix(&self.amount, 10).map_err(|_| IbcError::InvalidAmount(self.amount.clone()))
    }
}

/// Acknowledgement written by the receiving chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Base64 result bytes.
    Result(String),
    /// Error description.
    Error(String),
}

impl Acknowledgement {
    /// The standard ICS-20 success acknowledgement.
    pub fn success() -> Self {
        Self::Result(SUCCESS_ACK_RESULT.to_string())
    }

    /// An error acknowledgement carrying `err`.
    pub fn error(err: impl ToString) -> Self {
        Self::Error(err.to_string())
    }

    /// Returns true for a result acknowledgement.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Result(_))
    }

    /// Parses a JSON acknowledgement.
    pub fn from_bytes(data: &[u8]) -> Result<Self, IbcError> {
        serde_json::from_slice(data).map_err(|err| IbcError::InvalidAcknowledgement(err.to_string()))
    }

    /// Serializes to JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, IbcError> {
        serde_json::to_vec(self).map_err(|err| IbcError::Encode(err.to_string()))
    }
}

/// Returns `"{port}/{channel}/"`.
pub fn denom_prefix(port: &str, channel: &str) -> String {
    format!("{port}/{channel}/")
}

/// A denomination is returning to its source when the sender prefixed it with its own
/// port and channel.
pub fn receiver_chain_is_source(source_port: &str, source_channel: &str, denom: &str) -> bool {
    denom.starts_with(&denom_prefix(source_port, source_channel))
}

/// Returns true for identifiers of the form `channel-<n>`.
pub fn is_valid_channel_id(id: &str) -> bool {
    id.strip_prefix("channel-")
        .is_some_and(|seq| !seq.is_empty() && seq.parse::<u64>().is_ok())
}

/// Path of port/channel hops plus the base denomination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenomTrace {
    /// `port/channel` pairs joined by `/`; empty for native denominations.
    pub path: String,
    /// Denomination on the origin chain.
    pub base_denom: String,
}

impl DenomTrace {
    /// Splits a full denomination into trace path and base denom. Hops are recognised by a
    /// valid channel identifier; anything after the last recognised hop is the base.
    pub fn parse(raw: &str) -> Self {
        let items: Vec<&str> = raw.split('/').collect();
        if items.len() == 1 {
            return Self { path: String::new(), base_denom: raw.to_string() };
        }

        let mut path = Vec::new();
        let mut base: &[&str] = &[];
        let mut i = 0;
        while i < items.len() {
            if i + 1 < items.len() && items.len() > 2 && is_valid_channel_id(items[i + 1]) {
                path.extend_from_slice(&items[i..i + 2]);
                i += 2;
            } else {
                base = &items[i..];
                break;
            }
        }
        Self { path: path.join("/"), base_denom: base.join("/") }
    }

    /// `path/base_denom`, or the base alone for native denominations.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            self.base_denom.clone()
        } else {
            format!("{}/{}", self.path, self.base_denom)
        }
    }

    /// Hash of the full path as an upper-case hex string.
    pub fn hash_hex(&self) -> String {
        hex::encode_upper(Sha256::digest(self.full_path().as_bytes()))
    }

    /// On-chain denomination: `ibc/<HASH>` for vouchers, the base otherwise.
    pub fn ibc_denom(&self) -> String {
        if self.path.is_empty() {
            self.base_denom.clone()
        } else {
            format!("ibc/{}", self.hash_hex())
        }
    }
}

/// Coin credited on this chain when receiving `raw_denom` over the given channel ends.
pub fn received_coin(
    source_port: &str,
    source_channel: &str,
    destination_port: &str,
    destination_channel: &str,
    raw_denom: &str,
    amount: U256,
) -> Coin {
    if receiver_chain_is_source(source_port, source_channel, raw_denom) {
        let unprefixed = &raw_denom[denom_prefix(source_port, source_channel).len()..];
        let trace = DenomTrace::parse(unprefixed);
        let denom = if trace.path.is_empty() { unprefixed.to_string() } else { trace.ibc_denom() };
        return Coin::new(denom, amount);
    }

    let prefixed = format!("{}{raw_denom}", denom_prefix(destination_port, destination_channel));
    Coin::new(DenomTrace::parse(&prefixed).ibc_denom(), amount)
}

/// Coin debited on this chain when `raw_denom` was sent out.
pub fn sent_coin(raw_denom: &str, amount: U256) -> Coin {
    Coin::new(DenomTrace::parse(raw_denom).ibc_denom(), amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_traces() {
        assert_eq!(
            DenomTrace::parse("transfer/channel-0/uatom"),
            DenomTrace { path: "transfer/channel-0".into(), base_denom: "uatom".into() }
        );
        assert_eq!(DenomTrace::parse("uatom"), DenomTrace { path: String::new(), base_denom: "uatom".into() });
        assert_eq!(
            DenomTrace::parse("gamm/pool/1"),
            DenomTrace { path: String::new(), base_denom: "gamm/pool/1".into() }
        );
        assert_eq!(
            DenomTrace::parse("transfer/channel-1/transfer/channel-2/erc20/0xabc"),
            DenomTrace {
                path: "transfer/channel-1/transfer/channel-2".into(),
                base_denom: "erc20/0xabc".into()
            }
        );
    }

    #[test]
    fn voucher_denom_is_hashed_path() {
        let trace = DenomTrace::parse("transfer/channel-0/uatom");
        assert_eq!(
            trace.ibc_denom(),
            "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"
        );
    }

    #[test]
    fn received_coin_prefixes_foreign_denoms() {
        let coin = received_coin("transfer", "channel-0", "transfer", "channel-0", "uatom", U256::from(5));
        assert_eq!(coin.denom, "ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2");
        assert_eq!(coin.amount, U256::from(5));
    }

    #[test]
    fn received_coin_unwraps_returning_denoms() {
        let coin =
            received_coin("transfer", "channel-3", "transfer", "channel-0", "transfer/channel-3/aevmos", U256::from(1));
        assert_eq!(coin.denom, "aevmos");
    }

    #[test]
    fn acknowledgement_json() {
        let ack = Acknowledgement::success();
        assert_eq!(String::from_utf8(ack.to_bytes().expect("encodes")).expect("utf8"), r#"{"result":"AQ=="}"#);
        let err = Acknowledgement::from_bytes(br#"{"error":"boom"}"#).expect("parses");
        assert!(!err.is_success());
        assert!(Acknowledgement::from_bytes(b"nope").is_err());
    }

    #[test]
    fn packet_data_amount() {
        let data = FungibleTokenPacketData {
            denom: "uatom".into(),
            amount: "1000".into(),
            sender: "cosmos1".into(),
            receiver: "evmos1".into(),
            memo: String::new(),
        };
        let decoded = FungibleTokenPacketData::from_bytes(&data.to_bytes().expect("encodes")).expect("roundtrip");
        assert_eq!(decoded.amount(), Ok(U256::from(1000)));
        assert!(FungibleTokenPacketData { amount: "-1".into(), ..data }.amount().is_err());
    }
}
