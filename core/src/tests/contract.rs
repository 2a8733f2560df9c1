use cloak_account::{Address, PARAMS_KEY};
use cloak_commitment::{add, commit_amount};

use super::*;
use crate::contract::{ContractPolicy, TokenContract};
use crate::error::LedgerError;
use crate::events::TransferEvent;
use crate::host::{Invocation, LocalHost};
use crate::storage::{MemoryStore, StateStore};

const MINTER_ROLE: &str = "MinterMSP";

fn contract() -> TokenContract {
    TokenContract::new(ContractPolicy {
        minter_role: MINTER_ROLE.to_string(),
        ..ContractPolicy::default()
    })
}

fn as_client(id: &str, role: &str, ts: i64) -> Invocation {
    Invocation::new(ClientIdentity::new(addr(id), role), ts)
}

/// Host with the token initialized by `admin`
fn setup() -> (LocalHost<MemoryStore>, TokenContract, Point, Scalar) {
    init_logger();
    let mut host = LocalHost::new(MemoryStore::new());
    let token = contract();
    let (h, bf) = test_params();

    let ok = host
        .invoke(as_client("admin", ADMIN_ROLE, GENESIS_TS), |ctx| {
            token.initialize(ctx, "Cloak", "CLK", 2, h, bf)
        })
        .unwrap();
    assert!(ok);

    (host, token, h, bf)
}

fn mint(
    host: &mut LocalHost<MemoryStore>,
    token: &TokenContract,
    who: &str,
    amount: i64,
    c: &Point,
) -> LedgerResult<String> {
    host.invoke(as_client(who, MINTER_ROLE, GENESIS_TS), |ctx| {
        token.mint(ctx, amount, c)
    })
}

fn balance_of(
    host: &mut LocalHost<MemoryStore>,
    token: &TokenContract,
    who: &Address,
) -> Point {
    host.invoke(as_client("anyone", OTHER_ROLE, GENESIS_TS), |ctx| {
        token.balance_of(ctx, who)
    })
    .unwrap()
}

#[test]
fn initialize_requires_admin_role() {
    let mut host = LocalHost::new(MemoryStore::new());
    let token = contract();
    let (h, bf) = test_params();

    let err = host
        .invoke(as_client("mallory", OTHER_ROLE, GENESIS_TS), |ctx| {
            token.initialize(ctx, "Cloak", "CLK", 2, h, bf)
        })
        .unwrap_err();

    assert_eq!(
        err,
        LedgerError::Unauthorized {
            client: "mallory".to_string(),
            role: OTHER_ROLE.to_string(),
            action: "initialize",
        }
    );
    assert!(host.store().is_empty().unwrap());
}

#[test]
fn initialize_twice_keeps_first_parameters() {
    let (mut host, token, _, _) = setup();
    let before = host.store().get(PARAMS_KEY).unwrap();
    let (h2, bf2) = (
        cloak_commitment::h_from_label(b"other"),
        Scalar::from(42u64),
    );

    let err = host
        .invoke(as_client("admin", ADMIN_ROLE, GENESIS_TS), |ctx| {
            token.initialize(ctx, "Other", "OTH", 9, h2, bf2)
        })
        .unwrap_err();

    assert_eq!(err, LedgerError::AlreadyInitialized);
    assert_eq!(host.store().get(PARAMS_KEY).unwrap(), before);
}

#[test]
fn metadata_queries() {
    let (mut host, token, _, _) = setup();

    let (name, symbol, decimals, supply) = host
        .invoke(as_client("anyone", OTHER_ROLE, GENESIS_TS), |ctx| {
            Ok((
                token.name(ctx)?,
                token.symbol(ctx)?,
                token.decimals(ctx)?,
                token.total_supply(ctx)?,
            ))
        })
        .unwrap();

    assert_eq!(name, "Cloak");
    assert_eq!(symbol, "CLK");
    assert_eq!(decimals, 2);
    assert_eq!(supply, 0);
}

#[test]
fn queries_require_initialization() {
    let mut host = LocalHost::new(MemoryStore::new());
    let token = contract();
    let caller = as_client("alice", OTHER_ROLE, GENESIS_TS);

    let results = host
        .invoke(caller, |ctx| {
            Ok([
                token.name(ctx).err(),
                token.total_supply(ctx).err(),
                token.client_account_id(ctx).err(),
                token.client_account_balance(ctx).err(),
                token.pending_transfer(ctx, "tx").err(),
            ])
        })
        .unwrap();

    for result in results {
        assert_eq!(result, Some(LedgerError::NotInitialized));
    }
}

#[test]
fn mint_before_initialize() {
    let mut host = LocalHost::new(MemoryStore::new());
    let token = contract();
    let (h, bf) = test_params();

    let err = mint(&mut host, &token, "minter", 10, &opening(&h, &bf, 10)).unwrap_err();
    assert_eq!(err, LedgerError::NotInitialized);
}

#[test]
fn mint_requires_minter_role() {
    let (mut host, token, h, bf) = setup();

    let err = host
        .invoke(as_client("admin", ADMIN_ROLE, GENESIS_TS), |ctx| {
            token.mint(ctx, 10, &opening(&h, &bf, 10))
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized { action: "mint", .. }));
}

#[test]
fn mint_updates_balance_supply_and_emits() {
    let (mut host, token, h, bf) = setup();
    host.drain_events();

    let tx_id = mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 100)).unwrap();
    assert_eq!(tx_id.len(), 64);
    mint(&mut host, &token, "minter", 50, &opening(&h, &bf, 50)).unwrap();

    assert_eq!(balance_of(&mut host, &token, &addr("minter")), committed(&h, &bf, 3, 150));
    let (supply, own) = host
        .invoke(as_client("minter", MINTER_ROLE, GENESIS_TS), |ctx| {
            Ok((token.total_supply(ctx)?, token.client_account_balance(ctx)?))
        })
        .unwrap();
    assert_eq!(supply, 150);
    assert_eq!(own, committed(&h, &bf, 3, 150));

    let events = host.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].tx_id, tx_id);
    assert_eq!(events[0].name, "Transfer");
    let event: TransferEvent = serde_json::from_slice(&events[0].payload).unwrap();
    assert_eq!(event, TransferEvent::new("0x0", "minter", "Token Mint"));
}

#[test]
fn failed_mint_leaves_no_trace() {
    let (mut host, token, h, bf) = setup();
    let keys_before = host.store().len().unwrap();
    let events_before = host.events().len();

    let err = mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 101)).unwrap_err();

    assert_eq!(err, LedgerError::InvalidEncryption);
    assert_eq!(host.store().len().unwrap(), keys_before);
    assert_eq!(host.events().len(), events_before);
}

#[test]
fn client_account_id_reports_caller() {
    let (mut host, token, _, _) = setup();

    let id = host
        .invoke(as_client("alice", OTHER_ROLE, GENESIS_TS), |ctx| {
            token.client_account_id(ctx)
        })
        .unwrap();
    assert_eq!(id, addr("alice"));
}

#[test]
fn transfer_and_approve_lifecycle() {
    let (mut host, token, h, bf) = setup();
    let five = opening(&h, &bf, 5);
    mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 100)).unwrap();
    let minter_before = balance_of(&mut host, &token, &addr("minter"));
    let bob_before = balance_of(&mut host, &token, &addr("bob"));

    let tx_id = host
        .invoke(as_client("minter", MINTER_ROLE, GENESIS_TS), |ctx| {
            token.transfer(ctx, 5, &five)
        })
        .unwrap();

    let pending = host
        .invoke(as_client("bob", OTHER_ROLE, GENESIS_TS), |ctx| {
            token.pending_transfer(ctx, &tx_id)
        })
        .unwrap()
        .unwrap();
    assert_eq!(pending.sender, "minter");
    assert!(!pending.consumed);

    let settle_id = host
        .invoke(as_client("bob", OTHER_ROLE, GENESIS_TS + 100), |ctx| {
            token.approve(ctx, &tx_id)
        })
        .unwrap();
    assert_ne!(settle_id, tx_id);

    assert_eq!(
        balance_of(&mut host, &token, &addr("minter")),
        cloak_commitment::sub(&minter_before, &five)
    );
    assert_eq!(balance_of(&mut host, &token, &addr("bob")), add(&bob_before, &five));
    assert_eq!(
        balance_of(&mut host, &token, &Address::escrow(&tx_id)),
        commit_amount(&h, &bf, 0)
    );

    let again = host.invoke(as_client("bob", OTHER_ROLE, GENESIS_TS + 200), |ctx| {
        token.approve(ctx, &tx_id)
    });
    assert_eq!(again, Err(LedgerError::UnknownOrConsumed(tx_id.clone())));

    let names: Vec<_> = host.events().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Transfer", "Transfer", "Approve"]);
}

#[test]
fn transfer_then_reject_after_expiry() {
    let (mut host, token, h, bf) = setup();
    let five = opening(&h, &bf, 5);
    mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 100)).unwrap();
    let before = balance_of(&mut host, &token, &addr("minter"));

    let tx_id = host
        .invoke(as_client("minter", MINTER_ROLE, GENESIS_TS), |ctx| {
            token.transfer(ctx, 5, &five)
        })
        .unwrap();

    let early = host.invoke(as_client("minter", MINTER_ROLE, GENESIS_TS + 10), |ctx| {
        token.reject(ctx, &tx_id)
    });
    assert!(matches!(early, Err(LedgerError::NotYetExpired { .. })));

    host.invoke(
        as_client("minter", MINTER_ROLE, GENESIS_TS + TIMELOCK_SECS + 10),
        |ctx| token.reject(ctx, &tx_id),
    )
    .unwrap();

    assert_eq!(balance_of(&mut host, &token, &addr("minter")), before);
    let late = host.invoke(
        as_client("bob", OTHER_ROLE, GENESIS_TS + TIMELOCK_SECS + 20),
        |ctx| token.approve(ctx, &tx_id),
    );
    assert_eq!(late, Err(LedgerError::UnknownOrConsumed(tx_id)));
}

#[test]
fn transfer_rejects_zero_amount() {
    let (mut host, token, h, bf) = setup();

    let err = host
        .invoke(as_client("alice", OTHER_ROLE, GENESIS_TS), |ctx| {
            token.transfer(ctx, 0, &opening(&h, &bf, 0))
        })
        .unwrap_err();
    assert_eq!(err, LedgerError::InvalidAmount(0));
}

#[test]
fn replayed_transaction_id_is_refused() {
    let (mut host, token, h, bf) = setup();
    let five = opening(&h, &bf, 5);
    mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 100)).unwrap();

    let call = as_client("minter", MINTER_ROLE, GENESIS_TS).with_tx_id("fixed");
    host.invoke(call.clone(), |ctx| token.transfer(ctx, 5, &five))
        .unwrap();
    let err = host
        .invoke(call, |ctx| token.transfer(ctx, 5, &five))
        .unwrap_err();

    assert_eq!(err, LedgerError::DuplicateTransaction("fixed".to_string()));
}

#[test]
fn host_assigns_distinct_tx_ids() {
    let (mut host, token, h, bf) = setup();
    let mut ids = std::collections::HashSet::new();

    for _ in 0..8 {
        let id = mint(&mut host, &token, "minter", 1, &opening(&h, &bf, 1)).unwrap();
        assert!(ids.insert(id));
    }
}

#[test]
fn ledger_persists_in_rocksdb() {
    init_logger();
    let dir = tempfile::TempDir::new().unwrap();
    let token = contract();
    let (h, bf) = test_params();

    {
        let mut host = LocalHost::new(crate::storage::RocksDbStore::open(dir.path()).unwrap());
        host.invoke(as_client("admin", ADMIN_ROLE, GENESIS_TS), |ctx| {
            token.initialize(ctx, "Cloak", "CLK", 2, h, bf)
        })
        .unwrap();
        host.invoke(as_client("minter", MINTER_ROLE, GENESIS_TS), |ctx| {
            token.mint(ctx, 70, &opening(&h, &bf, 70))
        })
        .unwrap();

        let store = host.into_store();
        assert_eq!(
            store.get(cloak_account::TOTAL_SUPPLY_KEY).unwrap(),
            Some(70u64.to_be_bytes().to_vec())
        );
    }

    let mut host = LocalHost::new(crate::storage::RocksDbStore::open(dir.path()).unwrap());
    let supply = host
        .invoke(as_client("anyone", OTHER_ROLE, GENESIS_TS), |ctx| {
            token.total_supply(ctx)
        })
        .unwrap();
    assert_eq!(supply, 70);
}

#[test]
fn settlement_calls_require_initialization() {
    let mut host = LocalHost::new(MemoryStore::new());
    let token = contract();
    let (h, bf) = test_params();

    let transfer = host.invoke(as_client("alice", OTHER_ROLE, GENESIS_TS), |ctx| {
        token.transfer(ctx, 0, &opening(&h, &bf, 0))
    });
    let approve = host.invoke(as_client("bob", OTHER_ROLE, GENESIS_TS), |ctx| {
        token.approve(ctx, "x")
    });
    let reject = host.invoke(as_client("alice", OTHER_ROLE, GENESIS_TS), |ctx| {
        token.reject(ctx, "x")
    });

    assert_eq!(transfer, Err(LedgerError::NotInitialized));
    assert_eq!(approve, Err(LedgerError::NotInitialized));
    assert_eq!(reject, Err(LedgerError::NotInitialized));
}

#[test]
fn escrow_addresses_cannot_be_client_identities() {
    let (mut host, token, h, bf) = setup();
    mint(&mut host, &token, "minter", 100, &opening(&h, &bf, 100)).unwrap();
    let staged = host
        .invoke(
            as_client("minter", MINTER_ROLE, GENESIS_TS).with_tx_id("t1"),
            |ctx| token.transfer(ctx, 5, &opening(&h, &bf, 5)),
        )
        .unwrap();

    let escrow_id = Address::escrow(&staged);
    assert!(Address::new(escrow_id.as_str()).is_err());

    // the staged amount is still claimable exactly once
    let claimed = host.invoke(as_client("bob", OTHER_ROLE, GENESIS_TS + 10), |ctx| {
        token.approve(ctx, &staged)
    });
    assert!(claimed.is_ok());
    assert_eq!(balance_of(&mut host, &token, &escrow_id), commit_amount(&h, &bf, 0));
}

#[test]
fn policy_follows_config() {
    let mut config = crate::config::CloakConfig::default();
    config.roles.minter = MINTER_ROLE.to_string();
    config.timelock.blocks = 3;

    let token = TokenContract::new(config.to_policy().unwrap());
    assert_eq!(token.policy().minter_role, MINTER_ROLE);
    assert_eq!(token.policy().admin_role, ADMIN_ROLE);
    assert_eq!(token.policy().timelock.blocks, 3);
}
