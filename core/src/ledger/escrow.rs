//! Escrow transfer protocol
//!
//! A transfer is staged into a single-use escrow account and settled later,
//! either by the recipient inside the timelock window or by a refund to the
//! sender once the window has closed.
//!
//! ```text
//!                    propose(sender, C)
//!                           │
//!          sender ──C──► escrow:<txId>      pending:<txId> = {consumed: false}
//!                           │
//!            ┌──────────────┴──────────────┐
//!   elapsed <= TIMELOCK             elapsed > TIMELOCK
//!            │                             │
//!       approve(txId)                 reject(txId)
//!   escrow ──C──► caller          escrow ──C──► sender
//!            │                             │
//!            └──────► consumed: true ◄─────┘
//! ```
//!
//! `consumed` is read before anything else and written exactly once, so at
//! most one settlement succeeds per transaction id.

use std::num::NonZeroU64;

use cloak_account::{Address, pending_key};
use cloak_commitment::{FixedEncoding, Point};
use log::{info, warn};
use wincode::{SchemaRead, SchemaWrite};

use crate::context::TransactionContext;
use crate::error::{LedgerError, LedgerResult};
use crate::events::{self, EventKind, TransferEvent};
use crate::ledger::accounts::AccountLedger;
use crate::ledger::params::ParameterStore;

pub const DEFAULT_TIMELOCK_BLOCKS: i64 = 1000;
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 10;

const PROPOSE_MESSAGE: &str = "Money sent";
const APPROVE_MESSAGE: &str = "Contract approved!";
const REJECT_MESSAGE: &str = "Contract rejected!";

// ============================================================================
// Pending transfers
// ============================================================================

/// A staged transfer, keyed by the proposing transaction id
#[derive(Debug, Clone, PartialEq, Eq, SchemaRead, SchemaWrite)]
pub struct PendingTransfer {
    pub sender: String,
    /// Compressed commitment held in escrow
    pub committed_amount: [u8; 32],
    pub proposal_height: i64,
    pub consumed: bool,
}

impl PendingTransfer {
    pub fn sender(&self) -> LedgerResult<Address> {
        Address::new(self.sender.clone())
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))
    }

    pub fn amount(&self) -> LedgerResult<Point> {
        Ok(Point::from_fixed_bytes(&self.committed_amount)?)
    }

    fn encode(&self) -> LedgerResult<Vec<u8>> {
        wincode::serialize(self).map_err(|e| LedgerError::SerializationFailure(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> LedgerResult<Self> {
        wincode::deserialize::<PendingTransfer>(bytes)
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))
    }
}

// ============================================================================
// Timelock
// ============================================================================

/// Block-height window of a staged transfer.
///
/// Heights are approximated as `timestamp / block_time_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timelock {
    pub blocks: i64,
    pub block_time_secs: NonZeroU64,
}

impl Default for Timelock {
    fn default() -> Self {
        Self {
            blocks: DEFAULT_TIMELOCK_BLOCKS,
            block_time_secs: NonZeroU64::new(DEFAULT_BLOCK_TIME_SECS)
                .unwrap_or(NonZeroU64::MIN),
        }
    }
}

impl Timelock {
    pub fn new(blocks: i64, block_time_secs: NonZeroU64) -> Self {
        Self {
            blocks,
            block_time_secs,
        }
    }

    pub fn height_at(&self, timestamp_secs: i64) -> i64 {
        let block_time = i64::try_from(self.block_time_secs.get()).unwrap_or(i64::MAX);
        timestamp_secs.div_euclid(block_time)
    }

    /// Approval is allowed while this holds; refund only once it no longer does.
    pub fn is_open(&self, elapsed: i64) -> bool {
        elapsed <= self.blocks
    }
}

/// How a pending transfer was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Approved,
    Rejected,
}

// ============================================================================
// Protocol
// ============================================================================

pub struct EscrowProtocol<'a, C: TransactionContext + ?Sized> {
    ctx: &'a mut C,
    timelock: Timelock,
}

impl<'a, C: TransactionContext + ?Sized> EscrowProtocol<'a, C> {
    pub fn new(ctx: &'a mut C, timelock: Timelock) -> Self {
        Self { ctx, timelock }
    }

    fn ensure_initialized(&mut self) -> LedgerResult<()> {
        if ParameterStore::new(&mut *self.ctx).is_initialized()? {
            Ok(())
        } else {
            Err(LedgerError::NotInitialized)
        }
    }

    fn current_height(&self) -> LedgerResult<i64> {
        Ok(self.timelock.height_at(self.ctx.tx_header()?.timestamp_secs))
    }

    pub fn pending_transfer(&self, tx_id: &str) -> LedgerResult<Option<PendingTransfer>> {
        match self.ctx.get_state(&pending_key(tx_id))? {
            Some(bytes) => Ok(Some(PendingTransfer::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stage `committed` from `sender` into the escrow account of this call.
    ///
    /// `amount` is the plaintext the commitment must open to. It is checked
    /// and then dropped.
    pub fn propose(
        &mut self,
        sender: &Address,
        amount: i64,
        committed: &Point,
    ) -> LedgerResult<String> {
        self.ensure_initialized()?;
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let header = self.ctx.tx_header()?;
        let height = self.timelock.height_at(header.timestamp_secs);

        if self.pending_transfer(&header.tx_id)?.is_some() {
            return Err(LedgerError::DuplicateTransaction(header.tx_id));
        }

        let escrow = Address::escrow(&header.tx_id);
        let pending = PendingTransfer {
            sender: sender.to_string(),
            committed_amount: committed.to_fixed_bytes(),
            proposal_height: height,
            consumed: false,
        }
        .encode()?;

        {
            let mut ledger = AccountLedger::load(&mut *self.ctx)?;
            if !ledger.params().validate(amount, committed) {
                return Err(LedgerError::InvalidEncryption);
            }
            ledger.transfer(sender, &escrow, committed)?;
        }

        self.ctx.put_state(&pending_key(&header.tx_id), pending)?;
        events::emit(
            &mut *self.ctx,
            EventKind::Transfer,
            &TransferEvent::new(sender.as_str(), escrow.as_str(), PROPOSE_MESSAGE),
        )?;

        info!(
            "proposed transfer {} from {sender} at height {height}",
            header.tx_id
        );
        Ok(header.tx_id)
    }

    /// Release the escrowed amount of `tx_id` to `caller`.
    pub fn approve(&mut self, tx_id: &str, caller: &Address) -> LedgerResult<String> {
        self.settle(tx_id, caller, Settlement::Approved)
    }

    /// Refund the escrowed amount of `tx_id` to its sender.
    pub fn reject(&mut self, tx_id: &str, caller: &Address) -> LedgerResult<String> {
        self.settle(tx_id, caller, Settlement::Rejected)
    }

    fn settle(
        &mut self,
        tx_id: &str,
        caller: &Address,
        settlement: Settlement,
    ) -> LedgerResult<String> {
        self.ensure_initialized()?;
        let mut pending = match self.pending_transfer(tx_id)? {
            Some(pending) if !pending.consumed => pending,
            _ => return Err(LedgerError::UnknownOrConsumed(tx_id.to_string())),
        };

        let elapsed = self.current_height()?.saturating_sub(pending.proposal_height);
        let open = self.timelock.is_open(elapsed);

        let (recipient, kind, message) = match settlement {
            Settlement::Approved if !open => {
                return Err(LedgerError::Expired {
                    tx_id: tx_id.to_string(),
                    elapsed,
                    timelock: self.timelock.blocks,
                });
            }
            Settlement::Rejected if open => {
                return Err(LedgerError::NotYetExpired {
                    tx_id: tx_id.to_string(),
                    elapsed,
                    timelock: self.timelock.blocks,
                });
            }
            Settlement::Approved => (caller.clone(), EventKind::Approve, APPROVE_MESSAGE),
            Settlement::Rejected => (pending.sender()?, EventKind::Reject, REJECT_MESSAGE),
        };

        let escrow = Address::escrow(tx_id);
        let amount = pending.amount()?;
        pending.consumed = true;
        let consumed = pending.encode()?;

        AccountLedger::load(&mut *self.ctx)?.transfer(&escrow, &recipient, &amount)?;
        self.ctx.put_state(&pending_key(tx_id), consumed)?;
        events::emit(
            &mut *self.ctx,
            kind,
            &TransferEvent::new(escrow.as_str(), recipient.as_str(), message),
        )?;

        match settlement {
            Settlement::Approved => info!("transfer {tx_id} approved by {caller}"),
            Settlement::Rejected => {
                warn!("transfer {tx_id} refunded to {recipient} (rejected by {caller})")
            }
        }

        Ok(self.ctx.tx_header()?.tx_id)
    }
}
