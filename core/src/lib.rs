//! Cloak core
//!
//! Confidential-balance token ledger. Balances and transfer amounts only
//! ever exist as Pedersen commitments; transfers go through a timelocked
//! escrow.
//!
//! ```text
//!   LocalHost ──► TokenContract ──► EscrowProtocol ──► AccountLedger ──► ParameterStore
//!       │              │                                     │
//!       │         role policy                        cloak-commitment
//!       ▼
//!   StateStore (MemoryStore | RocksDbStore)
//! ```

pub mod config;
pub mod context;
pub mod contract;
pub mod error;
pub mod events;
pub mod host;
pub mod ledger;
pub mod storage;

pub use config::CloakConfig;
pub use context::{ClientIdentity, TransactionContext, TxHeader, WorldState};
pub use contract::{ContractPolicy, TokenContract, TokenMetadata};
pub use error::{LedgerError, LedgerResult};
pub use events::{EventKind, TransferEvent};
pub use host::{EmittedEvent, Invocation, LocalContext, LocalHost};
pub use ledger::{
    AccountLedger, CommitmentParameters, EscrowProtocol, ParameterStore, PendingTransfer,
    Settlement, Timelock,
};
pub use storage::{MemoryStore, RocksDbStore, StateBatch, StateStore};

#[cfg(test)]
mod tests;
