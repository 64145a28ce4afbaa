use cosmwasm_std::{OverflowError, StdError, Uint128};
use cw_utils::PaymentError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Payment(#[from] PaymentError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("Unknown operation: {op}")]
    UnknownOperation { op: u32 },

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Malformed batch: {reason}")]
    MalformedBatch { reason: String },

    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    #[error("Insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: Uint128, available: Uint128 },

    #[error("Sum of transfer amounts overflows")]
    AmountOverflow {},

    #[error("Invalid flag value {value}, expected 0 or 1")]
    InvalidFlag { value: u8 },

    #[error("Corrupt contract state: {reason}")]
    CorruptState { reason: String },

    #[error("Cannot migrate from {previous_contract} {previous_version}")]
    CannotMigrate {
        previous_contract: String,
        previous_version: String,
    },

    #[error("Semver parsing error: {0}")]
    SemVer(String),
}

impl From<semver::Error> for ContractError {
    fn from(err: semver::Error) -> Self {
        Self::SemVer(err.to_string())
    }
}
