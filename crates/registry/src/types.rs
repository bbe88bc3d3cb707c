//! Types for the authority registry

use rns_types::Address;
use serde::{Deserialize, Serialize};

/// Ownership record kept for every node that has ever been written.
///
/// A node with no record reads as the default: zero owner, zero resolver,
/// zero TTL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    /// Current owner; zero means unowned
    pub owner: Address,
    /// Resolver responsible for this node; zero when unset
    pub resolver: Address,
    /// Caching hint for clients, in seconds
    pub ttl: u64,
}
