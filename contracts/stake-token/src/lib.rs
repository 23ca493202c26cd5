pub mod contract;
pub mod error;
pub mod execute;
pub mod gateway;
pub mod ledger;
pub mod msg;
pub mod query;
pub mod state;

pub use crate::error::ContractError;
