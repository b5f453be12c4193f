//! Native coin amounts.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or combining coin sets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoinError {
    /// Denomination does not follow the SDK format.
    #[error("invalid denom: {0}")]
    InvalidDenom(String),
    /// The same denomination appears twice.
    #[error("duplicate denomination {0}")]
    DuplicateDenom(String),
    /// Subtraction would go below zero.
    #[error("insufficient amount of {denom}: {available} < {required}")]
    Negative {
        /// Denomination that underflowed.
        denom: String,
        /// Amount held.
        available: U256,
        /// Amount requested.
        required: U256,
    },
    /// Addition overflowed 256 bits.
    #[error("amount overflow for {0}")]
    Overflow(String),
}

/// Validates a denomination: 3 to 128 characters, starting with a letter, followed by letters,
/// digits or one of `/ : . _ -`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let mut chars = denom.chars();
    let valid = (3..=128).contains(&denom.len())
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(CoinError::InvalidDenom(denom.to_string()))
    }
}

/// A single denomination and amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount in base units.
    pub amount: U256,
}

impl Coin {
    /// Creates a coin.
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Self { denom: denom.into(), amount }
    }

    /// Returns a zero amount of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, U256::ZERO)
    }

    /// Returns true when the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Checks the denomination format.
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins sorted by denomination, without zero amounts or duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Builds a sorted coin set. Zero amounts are dropped.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Result<Self, CoinError> {
        let mut coins: Vec<Coin> = coins.into_iter().filter(|c| !c.is_zero()).collect();
        for coin in &coins {
            coin.validate()?;
        }
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        if let Some(pair) = coins.windows(2).find(|pair| pair[0].denom == pair[1].denom) {
            return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
        }
        Ok(Self(coins))
    }

    /// The empty set.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wraps a single coin. A zero coin yields the empty set.
    pub fn from_coin(coin: Coin) -> Result<Self, CoinError> {
        Self::new([coin])
    }

    /// Returns true when no coin is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of denominations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the coins in denomination order.
    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    /// Amount held of `denom`, zero when absent.
    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0.iter().find(|c| c.denom == denom).map(|c| c.amount).unwrap_or_default()
    }

    /// Returns true when every coin in `self` is covered by `other`.
    pub fn is_all_lte(&self, other: &Self) -> bool {
        self.0.iter().all(|coin| coin.amount <= other.amount_of(&coin.denom))
    }

    /// Adds two coin sets.
    pub fn checked_add(&self, other: &Self) -> Result<Self, CoinError> {
        let mut out = self.0.clone();
        for coin in &other.0 {
            match out.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => {
                    existing.amount = existing
                        .amount
                        .checked_add(coin.amount)
                        .ok_or_else(|| CoinError::Overflow(coin.denom.clone()))?;
                }
                None => out.push(coin.clone()),
            }
        }
        Self::new(out)
    }

    /// Subtracts `other` from `self`, failing if any denomination would become negative.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, CoinError> {
        let mut out = self.0.clone();
        for coin in &other.0 {
            let available = self.amount_of(&coin.denom);
            let remaining = available.checked_sub(coin.amount).ok_or_else(|| CoinError::Negative {
                denom: coin.denom.clone(),
                available,
                required: coin.amount,
            })?;
            match out.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => existing.amount = remaining,
                None => continue,
            }
        }
        Self::new(out)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Coins {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(","))
    }
}
