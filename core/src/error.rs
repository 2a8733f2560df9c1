//! Ledger error taxonomy
//!
//! Every failure is returned synchronously to the host. Nothing is retried
//! inside the ledger; a host may resubmit the whole call.

use cloak_commitment::CommitmentError;
use thiserror::Error;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("commitment parameters are not initialized, call initialize first")]
    NotInitialized,

    #[error("commitment parameters are already initialized")]
    AlreadyInitialized,

    #[error("client {client} with role {role} is not authorized to {action}")]
    Unauthorized {
        client: String,
        role: String,
        action: &'static str,
    },

    #[error("committed amount does not open to the declared value")]
    InvalidEncryption,

    #[error("amount must be a positive integer, got {0}")]
    InvalidAmount(i64),

    #[error("cannot transfer to and from the same account {0}")]
    SelfTransfer(String),

    #[error("account {0} has no balance")]
    NoBalance(String),

    #[error("transfer {0} is unknown or already settled")]
    UnknownOrConsumed(String),

    #[error("transfer {tx_id} has expired: {elapsed} blocks elapsed, timelock is {timelock}")]
    Expired {
        tx_id: String,
        elapsed: i64,
        timelock: i64,
    },

    #[error("transfer {tx_id} has not expired: {elapsed} of {timelock} blocks elapsed")]
    NotYetExpired {
        tx_id: String,
        elapsed: i64,
        timelock: i64,
    },

    #[error("total supply overflow: {current} + {amount}")]
    Overflow { current: u64, amount: u64 },

    #[error("transaction id {0} already has a pending transfer")]
    DuplicateTransaction(String),

    #[error("serialization failure: {0}")]
    SerializationFailure(String),

    #[error("world state access failure: {0}")]
    StateAccessFailure(String),
}

impl From<CommitmentError> for LedgerError {
    fn from(err: CommitmentError) -> Self {
        LedgerError::SerializationFailure(err.to_string())
    }
}
