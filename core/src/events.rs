//! Contract events
//!
//! Payloads are JSON objects `{from, to, message}` handed to the host's
//! event sink. Delivery is best effort.

use serde::{Deserialize, Serialize};

use crate::context::TransactionContext;
use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Mint and propose
    Transfer,
    Approve,
    Reject,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Transfer => "Transfer",
            EventKind::Approve => "Approve",
            EventKind::Reject => "Reject",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: String,
    pub to: String,
    pub message: String,
}

impl TransferEvent {
    pub fn new(from: impl Into<String>, to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }
}

pub fn emit<C: TransactionContext + ?Sized>(
    ctx: &mut C,
    kind: EventKind,
    event: &TransferEvent,
) -> LedgerResult<()> {
    let payload =
        serde_json::to_vec(event).map_err(|e| LedgerError::SerializationFailure(e.to_string()))?;
    ctx.set_event(kind.name(), payload)
}
