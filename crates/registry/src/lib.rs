//! RNS Authority Registry
//!
//! Maps every node to its owner, resolver pointer and TTL. Owners delegate
//! subnodes to other identities; the registrar and the resolver both consult
//! one shared instance of this registry for every ownership decision.

pub mod errors;
pub mod registry;
pub mod types;

pub use errors::*;
pub use registry::AuthorityRegistry;
pub use types::*;
