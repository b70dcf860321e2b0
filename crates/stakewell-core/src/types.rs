// crates/stakewell-core/src/types.rs
//
// Account and asset identifiers plus the scalar aliases used for amounts
// and timestamps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::StakewellError;

/// Token amounts, balances, indexes, and reward units.
pub type Amount = u128;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Sentinel amount meaning "everything available" in claim calls.
pub const MAX_AMOUNT: Amount = u128::MAX;

pub const MINUTE: Timestamp = 60;
pub const HOUR: Timestamp = 60 * MINUTE;
pub const DAY: Timestamp = 24 * HOUR;
pub const YEAR: Timestamp = 365 * DAY;

/// A 32-byte account identifier.
///
/// Used for stakers, vaults, managers, and for the token ledgers themselves.
/// Serializes as a `0x`-prefixed hex string so it can appear in TOML configs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 32]);

/// Assets are identified by the address of the ledger that tracks them.
pub type AssetId = Address;

impl Address {
    /// Derive a deterministic address from a human-readable label.
    ///
    /// The address is the SHA-256 digest of the label, which keeps fixtures
    /// and configs readable ("rewards-vault", "alice") without colliding.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Address(bytes)
    }

    /// Full hex encoding with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shortened form keeps logs and assertion output readable.
        let encoded = hex::encode(self.0);
        write!(f, "Address(0x{}..{})", &encoded[..8], &encoded[56..])
    }
}

impl FromStr for Address {
    type Err = StakewellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(trimmed)
            .map_err(|e| StakewellError::Config(format!("Invalid address {}: {}", s, e)))?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|_| {
            StakewellError::Config(format!("Address {} must be exactly 32 bytes", s))
        })?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
