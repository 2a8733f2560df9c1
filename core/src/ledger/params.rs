//! Commitment parameters
//!
//! `H`, the shared binding factor and the zero commitment are written once,
//! as a single record, and never change afterwards. Replacing `H` would make
//! every previously issued commitment inconsistent with new ones.

use cloak_account::PARAMS_KEY;
use cloak_commitment::{FixedEncoding, Point, Scalar, commit_amount};
use log::info;
use wincode::{SchemaRead, SchemaWrite};

use crate::context::WorldState;
use crate::error::{LedgerError, LedgerResult};

/// Fixed group parameters of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitmentParameters {
    /// Auxiliary generator
    pub h: Point,
    pub binding_factor: Scalar,
    /// `Commit(H, binding_factor, 0)`, balance of accounts with no entry
    pub zero_commitment: Point,
}

impl CommitmentParameters {
    pub fn new(h: Point, binding_factor: Scalar) -> Self {
        Self {
            h,
            binding_factor,
            zero_commitment: commit_amount(&h, &binding_factor, 0),
        }
    }

    /// Does `commitment` open to `value` under the ledger's binding factor?
    pub fn validate(&self, value: i64, commitment: &Point) -> bool {
        cloak_commitment::validate(value, commitment, &self.h, &self.binding_factor)
    }
}

/// On-disk layout of the parameter record
#[derive(Debug, Clone, SchemaRead, SchemaWrite)]
struct StoredParameters {
    h: [u8; 32],
    binding_factor: [u8; 32],
    zero_commitment: [u8; 32],
}

impl From<&CommitmentParameters> for StoredParameters {
    fn from(params: &CommitmentParameters) -> Self {
        Self {
            h: params.h.to_fixed_bytes(),
            binding_factor: params.binding_factor.to_fixed_bytes(),
            zero_commitment: params.zero_commitment.to_fixed_bytes(),
        }
    }
}

impl TryFrom<StoredParameters> for CommitmentParameters {
    type Error = LedgerError;

    fn try_from(stored: StoredParameters) -> LedgerResult<Self> {
        let params = Self {
            h: Point::from_fixed_bytes(&stored.h)?,
            binding_factor: Scalar::from_fixed_bytes(&stored.binding_factor)?,
            zero_commitment: Point::from_fixed_bytes(&stored.zero_commitment)?,
        };

        if params.zero_commitment != commit_amount(&params.h, &params.binding_factor, 0) {
            return Err(LedgerError::SerializationFailure(
                "stored zero commitment does not match H and binding factor".to_string(),
            ));
        }

        Ok(params)
    }
}

pub struct ParameterStore<'a, W: WorldState + ?Sized> {
    state: &'a mut W,
}

impl<'a, W: WorldState + ?Sized> ParameterStore<'a, W> {
    pub fn new(state: &'a mut W) -> Self {
        Self { state }
    }

    pub fn is_initialized(&self) -> LedgerResult<bool> {
        Ok(self.state.get_state(PARAMS_KEY)?.is_some())
    }

    /// Persist `H` and the binding factor, deriving the zero commitment.
    ///
    /// Authorization is the caller's job and must happen before this.
    pub fn initialize(
        &mut self,
        h: Point,
        binding_factor: Scalar,
    ) -> LedgerResult<CommitmentParameters> {
        if self.is_initialized()? {
            return Err(LedgerError::AlreadyInitialized);
        }

        let params = CommitmentParameters::new(h, binding_factor);
        let bytes = wincode::serialize(&StoredParameters::from(&params))
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))?;
        self.state.put_state(PARAMS_KEY, bytes)?;

        info!(
            "commitment parameters initialized (H = {})",
            hex::encode(params.h.to_fixed_bytes())
        );
        Ok(params)
    }

    pub fn get(&self) -> LedgerResult<CommitmentParameters> {
        let bytes = self
            .state
            .get_state(PARAMS_KEY)?
            .ok_or(LedgerError::NotInitialized)?;

        let stored = wincode::deserialize::<StoredParameters>(&bytes)
            .map_err(|e| LedgerError::SerializationFailure(e.to_string()))?;
        CommitmentParameters::try_from(stored)
    }
}
