//! Coins and coin sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The chain's native staking denomination.
pub const BOND_DENOM: &str = "stake";

/// A single denomination and amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A zero-amount coin of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Checks the denom against `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
    pub fn is_valid_denom(denom: &str) -> bool {
        let bytes = denom.as_bytes();
        if !(3..=128).contains(&bytes.len()) || !bytes[0].is_ascii_alphabetic() {
            return false;
        }
        bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins, kept sorted by denom with no zero entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a normalized set, merging duplicate denoms and dropping zeros.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut set = Self::new();
        for coin in coins {
            set.add(&coin);
        }
        set
    }

    /// Wrap coins as given, without normalizing. Used to carry user input
    /// that still has to pass `is_valid`.
    pub fn from_raw(coins: Vec<Coin>) -> Self {
        Self(coins)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Amount held in `denom` (zero if absent).
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    /// Add a coin, keeping the set sorted.
    pub fn add(&mut self, coin: &Coin) {
        if coin.amount == 0 {
            return;
        }
        match self.0.binary_search_by(|c| c.denom.as_str().cmp(&coin.denom)) {
            Ok(idx) => self.0[idx].amount = self.0[idx].amount.saturating_add(coin.amount),
            Err(idx) => self.0.insert(idx, coin.clone()),
        }
    }

    /// Subtract a coin; `None` when the balance in that denom is insufficient.
    pub fn checked_sub(&self, coin: &Coin) -> Option<Coins> {
        if coin.amount == 0 {
            return Some(self.clone());
        }
        let mut out = self.clone();
        let idx = out
            .0
            .binary_search_by(|c| c.denom.as_str().cmp(&coin.denom))
            .ok()?;
        let remaining = out.0[idx].amount.checked_sub(coin.amount)?;
        if remaining == 0 {
            out.0.remove(idx);
        } else {
            out.0[idx].amount = remaining;
        }
        Some(out)
    }

    /// Subtract every coin of `other`; `None` on any shortfall.
    pub fn checked_sub_all(&self, other: &Coins) -> Option<Coins> {
        other
            .iter()
            .try_fold(self.clone(), |acc, coin| acc.checked_sub(coin))
    }

    /// Valid denoms, strictly increasing order, all amounts positive.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|c| Coin::is_valid_denom(&c.denom) && c.amount > 0)
            && self.0.windows(2).all(|w| w[0].denom < w[1].denom)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::from_coins([coin])
    }
}
