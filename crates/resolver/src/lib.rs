//! RNS Resolver
//!
//! Publishes per-node data for owners: a default address, any number of
//! chain-specific addresses and a content hash. Reads of the default address
//! and the content hash fall back to an optional legacy resolver while the
//! local value is unset; chain-specific reads never fall back.

pub mod errors;
pub mod legacy;
pub mod resolver;
pub mod types;

pub use errors::*;
pub use legacy::{LegacyError, LegacyResolver, PublicResolver};
pub use resolver::MultiChainResolver;
pub use types::*;
