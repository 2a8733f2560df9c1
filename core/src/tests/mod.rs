mod contract;

use std::collections::HashMap;

use cloak_account::Address;
use cloak_commitment::{Point, Scalar, commit, commit_amount, h_from_label, random_blinding};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::context::{ClientIdentity, TransactionContext, TxHeader, WorldState};
use crate::error::LedgerResult;
use crate::events::TransferEvent;
use crate::ledger::ParameterStore;

pub const ADMIN_ROLE: &str = "Org1MSP";
pub const OTHER_ROLE: &str = "Org2MSP";

/// 1000 blocks of 10 seconds
pub const TIMELOCK_SECS: i64 = 10_000;
pub const GENESIS_TS: i64 = 1_700_000_000;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn addr(id: &str) -> Address {
    Address::new(id).unwrap()
}

/// Deterministic H and binding factor
pub fn test_params() -> (Point, Scalar) {
    let h = h_from_label(b"cloak-test-h");
    let bf = random_blinding(&mut rng(7));
    (h, bf)
}

/// Commitment with `n` copies of the binding factor
pub fn committed(h: &Point, bf: &Scalar, n: u64, value: i64) -> Point {
    let blinding = bf * Scalar::from(n);
    commit(h, &blinding, &cloak_commitment::amount_scalar(value))
}

pub fn opening(h: &Point, bf: &Scalar, value: i64) -> Point {
    commit_amount(h, bf, value)
}

// ============================================================================
// In-memory transaction context
// ============================================================================

/// A context with no buffering: every write lands immediately.
pub struct MockContext {
    pub state: HashMap<String, Vec<u8>>,
    pub client: ClientIdentity,
    pub header: TxHeader,
    pub events: Vec<(String, Vec<u8>)>,
}

impl MockContext {
    pub fn new(caller: &str) -> Self {
        Self {
            state: HashMap::new(),
            client: ClientIdentity::new(addr(caller), ADMIN_ROLE),
            header: TxHeader {
                tx_id: "tx-0".to_string(),
                timestamp_secs: GENESIS_TS,
            },
            events: Vec::new(),
        }
    }

    /// Fresh context with parameters already written
    pub fn initialized(caller: &str) -> (Self, Point, Scalar) {
        let mut ctx = Self::new(caller);
        let (h, bf) = test_params();
        ParameterStore::new(&mut ctx).initialize(h, bf).unwrap();
        (ctx, h, bf)
    }

    pub fn call_as(&mut self, caller: &str, tx_id: &str, timestamp_secs: i64) {
        self.client.id = addr(caller);
        self.header = TxHeader {
            tx_id: tx_id.to_string(),
            timestamp_secs,
        };
    }

    pub fn last_event(&self) -> (String, TransferEvent) {
        let (name, payload) = self.events.last().unwrap();
        (name.clone(), serde_json::from_slice(payload).unwrap())
    }
}

impl WorldState for MockContext {
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.state.insert(key.to_string(), value);
        Ok(())
    }
}

impl TransactionContext for MockContext {
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
