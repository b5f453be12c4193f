//! Authorization grants for delegated execution.

use crate::{coin::Coin, coin::Coins, tx::Msg};
use serde::{Deserialize, Serialize};

/// Unconditional permission to execute any message of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericAuthorization {
    /// Type URL of the permitted message.
    pub msg: String,
}

impl GenericAuthorization {
    /// Creates a grant for `msg_type_url`.
    pub fn new(msg_type_url: impl Into<String>) -> Self {
        Self { msg: msg_type_url.into() }
    }

    /// A generic grant accepts every message it was issued for.
    pub fn accept(&self, msg: &Msg) -> AcceptResponse {
        AcceptResponse { accept: msg.type_url() == self.msg, delete: false }
    }
}

/// Permission record stored by the authz module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authorization {
    /// Type based, unconditional.
    Generic(GenericAuthorization),
    /// Bank send with a spend limit.
    Send {
        /// Remaining amount the grantee may spend.
        spend_limit: Coins,
    },
    /// Staking delegation with an optional cap.
    Stake {
        /// Remaining amount the grantee may delegate.
        max_tokens: Option<Coin>,
    },
}

impl Authorization {
    /// Type URL of the message this authorization applies to.
    pub fn msg_type_url(&self) -> &str {
        match self {
            Self::Generic(generic) => &generic.msg,
            Self::Send { .. } => "/cosmos.bank.v1beta1.MsgSend",
            Self::Stake { .. } => "/cosmos.staking.v1beta1.MsgDelegate",
        }
    }

    /// Returns the generic grant, if this is one.
    pub const fn as_generic(&self) -> Option<&GenericAuthorization> {
        match self {
            Self::Generic(generic) => Some(generic),
            _ => None,
        }
    }
}

/// Outcome of asking an authorization whether it permits a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptResponse {
    /// The message may be executed.
    pub accept: bool,
    /// The grant is used up and should be removed.
    pub delete: bool,
}

/// An authorization together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Granted permission.
    pub authorization: Authorization,
    /// Unix timestamp (seconds) after which the grant is void.
    pub expiration: Option<u64>,
}

impl Grant {
    /// Returns true when the grant expired before `block_time`.
    pub fn is_expired(&self, block_time: u64) -> bool {
        self.expiration.is_some_and(|expiration| expiration < block_time)
    }
}
