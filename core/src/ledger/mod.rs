pub mod accounts;
pub mod escrow;
pub mod params;

pub use accounts::AccountLedger;
pub use escrow::{EscrowProtocol, PendingTransfer, Settlement, Timelock};
pub use params::{CommitmentParameters, ParameterStore};
