//! Local host
//!
//! Runs contract calls against a [`StateStore`] with the guarantees a
//! ledger peer gives: one snapshot per call and all-or-nothing writes.
//!
//! ```text
//!   invoke(caller, ts, f)
//!        │
//!        ▼
//!   LocalContext ── get ──► write buffer ──miss──► StateStore
//!        │          put ──► write buffer
//!        │          event ► event buffer
//!        ▼
//!   f returned Ok  ──► apply_batch(writes), publish events
//!   f returned Err ──► drop both buffers
//! ```
//!
//! Calls are serialized by `&mut self`, so two settlements of the same
//! transfer can never interleave.

use std::collections::BTreeMap;

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::context::{ClientIdentity, TransactionContext, TxHeader, WorldState};
use crate::error::{LedgerError, LedgerResult};
use crate::storage::{StateBatch, StateStore};

/// Who is calling, and when
#[derive(Debug, Clone)]
pub struct Invocation {
    pub caller: ClientIdentity,
    pub timestamp_secs: i64,
    /// Host-assigned when `None`
    pub tx_id: Option<String>,
}

impl Invocation {
    pub fn new(caller: ClientIdentity, timestamp_secs: i64) -> Self {
        Self {
            caller,
            timestamp_secs,
            tx_id: None,
        }
    }

    /// Replay under a fixed transaction id
    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }
}

/// An event published by a committed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    pub tx_id: String,
    pub name: String,
    pub payload: Vec<u8>,
}

pub struct LocalHost<S: StateStore> {
    store: S,
    events: Vec<EmittedEvent>,
    call_counter: u64,
}

impl<S: StateStore> LocalHost<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            events: Vec::new(),
            call_counter: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Events of every committed call, oldest first
    pub fn events(&self) -> &[EmittedEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<EmittedEvent> {
        std::mem::take(&mut self.events)
    }

    fn next_tx_id(&mut self, invocation: &Invocation) -> String {
        self.call_counter += 1;
        let salt: [u8; 16] = rand::random();

        let mut hasher = Sha256::new();
        hasher.update(self.call_counter.to_be_bytes());
        hasher.update(invocation.timestamp_secs.to_be_bytes());
        hasher.update(invocation.caller.id.as_str().as_bytes());
        hasher.update(salt);
        hex::encode(hasher.finalize())
    }

    /// Execute `call` as one atomic unit of work.
    pub fn invoke<T, F>(&mut self, invocation: Invocation, call: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut LocalContext<'_, S>) -> LedgerResult<T>,
    {
        let tx_id = match &invocation.tx_id {
            Some(tx_id) => tx_id.clone(),
            None => self.next_tx_id(&invocation),
        };

        let mut ctx = LocalContext {
            store: &self.store,
            writes: BTreeMap::new(),
            events: Vec::new(),
            client: invocation.caller,
            header: TxHeader {
                tx_id: tx_id.clone(),
                timestamp_secs: invocation.timestamp_secs,
            },
        };

        let output = match call(&mut ctx) {
            Ok(output) => output,
            Err(err) => {
                debug!("call {tx_id} failed, discarding {} writes: {err}", ctx.writes.len());
                return Err(err);
            }
        };

        let LocalContext { writes, events, .. } = ctx;
        let batch: StateBatch = writes.into_iter().collect();
        let write_count = batch.len();
        self.store
            .apply_batch(batch)
            .map_err(|e| LedgerError::StateAccessFailure(e.to_string()))?;

        self.events
            .extend(events.into_iter().map(|(name, payload)| EmittedEvent {
                tx_id: tx_id.clone(),
                name,
                payload,
            }));

        info!("committed call {tx_id} ({write_count} writes)");
        Ok(output)
    }
}

/// Per-call view of the world state
pub struct LocalContext<'a, S: StateStore> {
    store: &'a S,
    writes: BTreeMap<String, Vec<u8>>,
    events: Vec<(String, Vec<u8>)>,
    client: ClientIdentity,
    header: TxHeader,
}

impl<S: StateStore> WorldState for LocalContext<'_, S> {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        self.store
            .get(key)
            .map_err(|e| LedgerError::StateAccessFailure(e.to_string()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.writes.insert(key.to_string(), value);
        Ok(())
    }
}

impl<S: StateStore> TransactionContext for LocalContext<'_, S> {
    fn client_identity(&self) -> LedgerResult<ClientIdentity> {
        Ok(self.client.clone())
    }

    fn tx_header(&self) -> LedgerResult<TxHeader> {
        Ok(self.header.clone())
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> LedgerResult<()> {
        self.events.push((name.to_string(), payload));
        Ok(())
    }
}
