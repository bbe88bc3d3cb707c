//! Error types for the resolver

use crate::legacy::LegacyError;
use rns_types::{Address, Node};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("{caller} does not own node {node}")]
    NotAuthorized { node: Node, caller: Address },

    #[error("legacy resolver failed to answer: {0}")]
    InvalidFallback(#[from] LegacyError),
}

pub type Result<T> = std::result::Result<T, ResolverError>;
