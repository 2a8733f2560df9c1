//! Host capabilities
//!
//! The ledger never touches global state. Everything it may observe or
//! change arrives through a [`TransactionContext`]: world-state reads and
//! writes, the calling client's identity, the transaction header
//! (id + timestamp) and event emission.
//!
//! The host guarantees that one call sees a single consistent snapshot and
//! that its writes are committed all-or-nothing.

use cloak_account::Address;

use crate::error::LedgerResult;

/// Key-value world state as seen by one call
pub trait WorldState {
    /// `None` when the key was never written
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()>;
}

/// Resolved identity of the submitting client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub id: Address,
    /// Organisational role (MSP id) used for role-gated operations
    pub org_role: String,
}

impl ClientIdentity {
    pub fn new(id: Address, org_role: impl Into<String>) -> Self {
        Self {
            id,
            org_role: org_role.into(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.org_role == role
    }
}

/// Header of the transaction being executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHeader {
    /// Unique per call, assigned by the host
    pub tx_id: String,
    /// Unix seconds
    pub timestamp_secs: i64,
}

/// Everything a contract call may use from its host
pub trait TransactionContext: WorldState {
    fn client_identity(&self) -> LedgerResult<ClientIdentity>;

    fn tx_header(&self) -> LedgerResult<TxHeader>;

    /// Fire-and-forget; delivery is not part of ledger correctness
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> LedgerResult<()>;
}
