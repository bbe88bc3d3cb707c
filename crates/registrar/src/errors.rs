//! Error types for the registrar

use crate::ledger::LedgerError;
use rns_registry::RegistryError;
use rns_types::{Address, Amount, LabelHash, SealedBid, Timestamp};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrarError {
    #[error("{caller} is not authorized for this operation")]
    NotAuthorized { caller: Address },

    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),

    #[error("label {label} is already registered to another owner")]
    AlreadyRegistered { label: LabelHash },

    #[error("label {label} has never been registered")]
    NotRegistered { label: LabelHash },

    #[error("grace period for label {label} ended at {ended_at}")]
    GracePeriodElapsed {
        label: LabelHash,
        ended_at: Timestamp,
    },

    #[error("insufficient value: required {required}, offered {offered}")]
    InsufficientValue { required: Amount, offered: Amount },

    #[error("sealed bid {0} already exists")]
    BidAlreadyExists(SealedBid),

    #[error("sealed bid {0} not found")]
    BidNotFound(SealedBid),

    #[error("sealed bid {0} was already revealed")]
    InvalidReveal(SealedBid),

    #[error("sealed bid {0} has not been revealed")]
    BidNotRevealed(SealedBid),

    #[error("reveal window of sealed bid {0} has closed")]
    BidExpired(SealedBid),

    #[error("sealed bid {sealed} is locked until {unlocks_at}")]
    BidNotExpired {
        sealed: SealedBid,
        unlocks_at: Timestamp,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid registrar configuration: {0}")]
    Config(String),

    #[error("arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

pub type Result<T> = std::result::Result<T, RegistrarError>;
