//! Committed account balances
//!
//! ```text
//!   balance:<address>  ──►  Point (32 bytes, compressed)
//!
//!   credit(a, x):  B[a] ← B[a] + x        (absent ⇒ zero commitment)
//!   debit(a, x):   B[a] ← B[a] - x        (absent ⇒ NoBalance)
//! ```
//!
//! Balances are never decrypted. The ledger cannot tell whether a debit
//! drives a balance below zero; that is the price of the opening-based
//! validation used on mint and propose.

use cloak_account::{Address, TOTAL_SUPPLY_KEY};
use cloak_commitment::{FixedEncoding, Point, add, sub};
use log::{debug, info};

use crate::context::WorldState;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::params::{CommitmentParameters, ParameterStore};

pub struct AccountLedger<'a, W: WorldState + ?Sized> {
    state: &'a mut W,
    params: CommitmentParameters,
}

impl<'a, W: WorldState + ?Sized> AccountLedger<'a, W> {
    /// Bind to `state`, failing with `NotInitialized` when no parameters exist.
    pub fn load(state: &'a mut W) -> LedgerResult<Self> {
        let params = ParameterStore::new(&mut *state).get()?;
        Ok(Self { state, params })
    }

    pub fn params(&self) -> &CommitmentParameters {
        &self.params
    }

    // ========================================================================
    // Balances
    // ========================================================================

    fn stored_balance(&self, address: &Address) -> LedgerResult<Option<Point>> {
        match self.state.get_state(&address.balance_key())? {
            Some(bytes) => Ok(Some(Point::from_fixed_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn store_balance(&mut self, address: &Address, balance: &Point) -> LedgerResult<()> {
        self.state
            .put_state(&address.balance_key(), balance.to_fixed_bytes().to_vec())
    }

    /// Stored commitment, or the zero commitment for an address never credited
    pub fn get_balance(&self, address: &Address) -> LedgerResult<Point> {
        Ok(self
            .stored_balance(address)?
            .unwrap_or(self.params.zero_commitment))
    }

    pub fn credit(&mut self, address: &Address, amount: &Point) -> LedgerResult<()> {
        let balance = self.get_balance(address)?;
        self.store_balance(address, &add(&balance, amount))?;
        debug!("credited {address}");
        Ok(())
    }

    pub fn debit(&mut self, address: &Address, amount: &Point) -> LedgerResult<()> {
        let balance = self
            .stored_balance(address)?
            .ok_or_else(|| LedgerError::NoBalance(address.to_string()))?;
        self.store_balance(address, &sub(&balance, amount))?;
        debug!("debited {address}");
        Ok(())
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// Both balances are read before either is written, so a failure leaves
    /// the state untouched.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Point,
    ) -> LedgerResult<()> {
        if from == to {
            return Err(LedgerError::SelfTransfer(from.to_string()));
        }

        let from_balance = self
            .stored_balance(from)?
            .ok_or_else(|| LedgerError::NoBalance(from.to_string()))?;
        let to_balance = self.get_balance(to)?;

        self.store_balance(from, &sub(&from_balance, amount))?;
        self.store_balance(to, &add(&to_balance, amount))?;

        debug!("transferred from {from} to {to}");
        Ok(())
    }

    // ========================================================================
    // Supply
    // ========================================================================

    pub fn total_supply(&self) -> LedgerResult<u64> {
        let Some(bytes) = self.state.get_state(TOTAL_SUPPLY_KEY)? else {
            return Ok(0);
        };

        let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
            LedgerError::SerializationFailure(format!(
                "total supply must be 8 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(u64::from_be_bytes(raw))
    }

    /// Credit freshly issued tokens to `minter`.
    ///
    /// The caller is responsible for checking that `minter` holds the
    /// minting role.
    pub fn mint(
        &mut self,
        minter: &Address,
        amount: i64,
        committed: &Point,
    ) -> LedgerResult<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if !self.params.validate(amount, committed) {
            return Err(LedgerError::InvalidEncryption);
        }

        let current = self.total_supply()?;
        let issued = amount as u64;
        let supply = current.checked_add(issued).ok_or(LedgerError::Overflow {
            current,
            amount: issued,
        })?;

        self.credit(minter, committed)?;
        self.state
            .put_state(TOTAL_SUPPLY_KEY, supply.to_be_bytes().to_vec())?;

        info!("minted {amount} to {minter}, total supply {supply}");
        Ok(())
    }
}
