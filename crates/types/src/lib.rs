//! RNS shared types
//!
//! Identifiers used across the authority registry, the registrar and the
//! resolver: namehash nodes, label hashes, chain identifiers, content hashes
//! and 20-byte account addresses. Also hosts the keccak helpers used to derive
//! them and the [`Clock`] seam every time-dependent component is built on.

pub mod address;
pub mod clock;
pub mod hash;

pub use address::*;
pub use clock::*;
pub use hash::*;

/// Token amount in the ledger's smallest unit.
pub type Amount = u64;

/// Seconds since UNIX_EPOCH.
pub type Timestamp = u64;
