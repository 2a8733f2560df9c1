//! Account addressing
//!
//! Addresses are opaque client identifiers handed out by the identity
//! provider. Escrow addresses are synthetic and derived from the staging
//! transaction id, so each staged transfer gets its own single-use account.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix of every synthetic escrow address
pub const ESCROW_PREFIX: &str = "escrow:";

/// Sender used in mint events
pub const MINT_ORIGIN: &str = "0x0";

// ============================================================================
// World-state keys
// ============================================================================

pub const BALANCE_KEY_PREFIX: &str = "balance:";
pub const PENDING_KEY_PREFIX: &str = "pending:";
pub const PARAMS_KEY: &str = "params:pedersen";
pub const TOKEN_METADATA_KEY: &str = "meta:token";
pub const TOTAL_SUPPLY_KEY: &str = "supply:total";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must not be empty")]
    Empty,

    #[error("address {0} uses the reserved escrow prefix")]
    Reserved(String),
}

/// An account address on the ledger
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(id: impl Into<String>) -> Result<Self, AddressError> {
        let id = id.into();
        if id.is_empty() {
            return Err(AddressError::Empty);
        }
        if id.starts_with(ESCROW_PREFIX) {
            return Err(AddressError::Reserved(id));
        }
        Ok(Self(id))
    }

    /// The escrow account holding the amount staged by `tx_id`.
    ///
    /// The only way to build an escrow address; [`Address::new`] refuses them.
    pub fn escrow(tx_id: &str) -> Self {
        Self(format!("{ESCROW_PREFIX}{tx_id}"))
    }

    pub fn mint_origin() -> Self {
        Self(MINT_ORIGIN.to_string())
    }

    pub fn is_escrow(&self) -> bool {
        self.0.starts_with(ESCROW_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// World-state key of this address' committed balance
    pub fn balance_key(&self) -> String {
        format!("{BALANCE_KEY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// World-state key of the pending transfer staged by `tx_id`
pub fn pending_key(tx_id: &str) -> String {
    format!("{PENDING_KEY_PREFIX}{tx_id}")
}
