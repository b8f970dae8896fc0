use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::traits::FetchError;

// ---------------------------------------------------------------------------
// Currency Pair
// ---------------------------------------------------------------------------

/// A currency pair as the upstream API names it (e.g. USD-BRL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// US dollar priced in Brazilian real.
    pub fn usd_brl() -> Self {
        Self::new("USD", "BRL")
    }

    /// Segment used in the upstream URL (`USD-BRL`).
    pub fn path_segment(&self) -> String {
        format!("{}-{}", self.base, self.quote)
    }

    /// Key the upstream nests the quote under (`USDBRL`).
    pub fn key(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self::usd_brl()
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.quote)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency pair '{0}', expected BASE-QUOTE (e.g. USD-BRL)")]
pub struct InvalidPair(pub String);

impl FromStr for CurrencyPair {
    type Err = InvalidPair;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('-') {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains('-') =>
            {
                Ok(Self::new(base.to_uppercase(), quote.to_uppercase()))
            }
            _ => Err(InvalidPair(s.to_string())),
        }
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// One snapshot of a currency pair as reported by the upstream API.
///
/// Every field is kept as the upstream string so that numeric formatting
/// survives storage and the round trip to the client untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub code: String,
    pub codein: String,
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    /// Price at which the quoted currency can be sold.
    pub bid: String,
    pub ask: String,
}

impl Quote {
    /// Decode an upstream response body shaped as `{"USDBRL": {...}}`.
    ///
    /// Either all nine fields decode or no quote is produced. Extra fields
    /// sent by the upstream are ignored.
    pub fn from_upstream(body: &[u8], pair: &CurrencyPair) -> Result<Self, FetchError> {
        let mut envelope: HashMap<String, Quote> = serde_json::from_slice(body)
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        let key = pair.key();
        envelope
            .remove(&key)
            .ok_or_else(|| FetchError::Decode(format!("Response has no '{}' entry", key)))
    }
}
