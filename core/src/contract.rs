//! Token contract
//!
//! Thin dispatch layer over the ledger. It resolves the calling client,
//! enforces the role policy and hands off to [`AccountLedger`] or
//! [`EscrowProtocol`]. Every check runs before the first write.

use cloak_account::{Address, TOKEN_METADATA_KEY};
use cloak_commitment::{Point, Scalar};
use log::info;
use wincode::{SchemaRead, SchemaWrite};

use crate::context::{ClientIdentity, TransactionContext};
use crate::error::{LedgerError, LedgerResult};
use crate::events::{self, EventKind, TransferEvent};
use crate::ledger::{AccountLedger, EscrowProtocol, ParameterStore, PendingTransfer, Timelock};

const MINT_MESSAGE: &str = "Token Mint";

/// Who may do what, and how long transfers stay claimable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractPolicy {
    pub admin_role: String,
    pub minter_role: String,
    pub timelock: Timelock,
}

impl Default for ContractPolicy {
    fn default() -> Self {
        Self {
            admin_role: "Org1MSP".to_string(),
            minter_role: "Org1MSP".to_string(),
            timelock: Timelock::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, SchemaRead, SchemaWrite)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Default)]
pub struct TokenContract {
    policy: ContractPolicy,
}

impl TokenContract {
    pub fn new(policy: ContractPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ContractPolicy {
        &self.policy
    }

    fn authorize<C: TransactionContext + ?Sized>(
        ctx: &C,
        role: &str,
        action: &'static str,
    ) -> LedgerResult<ClientIdentity> {
        let client = ctx.client_identity()?;
        if !client.has_role(role) {
            return Err(LedgerError::Unauthorized {
                client: client.id.to_string(),
                role: client.org_role,
                action,
            });
        }
        Ok(client)
    }

    fn ensure_initialized<C: TransactionContext + ?Sized>(ctx: &mut C) -> LedgerResult<()> {
        if ParameterStore::new(ctx).is_initialized()? {
            Ok(())
        } else {
            Err(LedgerError::NotInitialized)
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// One-time setup of the token and its commitment parameters.
    pub fn initialize<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        name: &str,
        symbol: &str,
        decimals: u8,
        h: Point,
        binding_factor: Scalar,
    ) -> LedgerResult<bool> {
        let client = Self::authorize(ctx, &self.policy.admin_role, "initialize")?;

        ParameterStore::new(&mut *ctx).initialize(h, binding_factor)?;

        let metadata = TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        };
        let bytes = wincode::serialize(&metadata)
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))?;
        ctx.put_state(TOKEN_METADATA_KEY, bytes)?;

        info!("token {symbol} ({name}) initialized by {}", client.id);
        Ok(true)
    }

    /// Issue `amount` new tokens to the calling minter.
    pub fn mint<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        amount: i64,
        committed: &Point,
    ) -> LedgerResult<String> {
        Self::ensure_initialized(ctx)?;
        let minter = Self::authorize(ctx, &self.policy.minter_role, "mint")?.id;

        AccountLedger::load(&mut *ctx)?.mint(&minter, amount, committed)?;
        let origin = Address::mint_origin();
        let event = TransferEvent::new(origin.as_str(), minter.as_str(), MINT_MESSAGE);
        events::emit(&mut *ctx, EventKind::Transfer, &event)?;

        Ok(ctx.tx_header()?.tx_id)
    }

    /// Stage a transfer from the caller into escrow.
    pub fn transfer<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        amount: i64,
        committed: &Point,
    ) -> LedgerResult<String> {
        let sender = ctx.client_identity()?.id;
        EscrowProtocol::new(ctx, self.policy.timelock).propose(&sender, amount, committed)
    }

    /// Claim a staged transfer for the caller.
    pub fn approve<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        tx_id: &str,
    ) -> LedgerResult<String> {
        let caller = ctx.client_identity()?.id;
        EscrowProtocol::new(ctx, self.policy.timelock).approve(tx_id, &caller)
    }

    /// Refund an expired transfer to its sender.
    pub fn reject<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        tx_id: &str,
    ) -> LedgerResult<String> {
        let caller = ctx.client_identity()?.id;
        EscrowProtocol::new(ctx, self.policy.timelock).reject(tx_id, &caller)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn balance_of<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        address: &Address,
    ) -> LedgerResult<Point> {
        AccountLedger::load(ctx)?.get_balance(address)
    }

    pub fn client_account_balance<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
    ) -> LedgerResult<Point> {
        let client = ctx.client_identity()?.id;
        self.balance_of(ctx, &client)
    }

    pub fn client_account_id<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
    ) -> LedgerResult<Address> {
        Self::ensure_initialized(ctx)?;
        Ok(ctx.client_identity()?.id)
    }

    pub fn total_supply<C: TransactionContext + ?Sized>(&self, ctx: &mut C) -> LedgerResult<u64> {
        AccountLedger::load(ctx)?.total_supply()
    }

    pub fn metadata<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
    ) -> LedgerResult<TokenMetadata> {
        let bytes = ctx
            .get_state(TOKEN_METADATA_KEY)?
            .ok_or(LedgerError::NotInitialized)?;
        wincode::deserialize::<TokenMetadata>(&bytes)
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))
    }

    pub fn name<C: TransactionContext + ?Sized>(&self, ctx: &mut C) -> LedgerResult<String> {
        Ok(self.metadata(ctx)?.name)
    }

    pub fn symbol<C: TransactionContext + ?Sized>(&self, ctx: &mut C) -> LedgerResult<String> {
        Ok(self.metadata(ctx)?.symbol)
    }

    pub fn decimals<C: TransactionContext + ?Sized>(&self, ctx: &mut C) -> LedgerResult<u8> {
        Ok(self.metadata(ctx)?.decimals)
    }

    pub fn pending_transfer<C: TransactionContext + ?Sized>(
        &self,
        ctx: &mut C,
        tx_id: &str,
    ) -> LedgerResult<Option<PendingTransfer>> {
        Self::ensure_initialized(ctx)?;
        EscrowProtocol::new(ctx, self.policy.timelock).pending_transfer(tx_id)
    }
}
