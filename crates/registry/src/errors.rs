//! Error types for the authority registry

use rns_types::{Address, Node};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{caller} is not authorized to modify node {node}")]
    NotAuthorized { node: Node, caller: Address },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
