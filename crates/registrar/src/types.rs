//! Types for the registrar

use rns_types::{Address, Amount, LabelHash, Node, SealedBid, Timestamp};
use serde::{Deserialize, Serialize};

/// Lifecycle position of a sealed bid.
///
/// A bid is `Committed` when its deposit is escrowed, `Revealed` once its
/// contents are proven, and finalized when it is consumed into a
/// registration (the record is removed at that point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidPhase {
    Committed,
    Revealed,
}

/// Escrowed sealed bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub sealed: SealedBid,
    pub bidder: Address,
    /// Funds currently held in escrow for this bid
    pub deposit: Amount,
    pub created_at: Timestamp,
    pub phase: BidPhase,
}

/// Registration of one label under the registrar's root node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub label: LabelHash,
    pub node: Node,
    /// Owner at the time of the last register/renew
    pub owner: Address,
    pub registered_at: Timestamp,
    pub expires_at: Timestamp,
    /// Total rent paid into this registration
    pub rent_balance: Amount,
    /// Total paid through register, renew and finalized bids
    pub total_paid: Amount,
}

impl Registration {
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.expires_at
    }
}

/// Derived state of a label at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameState {
    /// Never registered, or expired past the grace period
    Unregistered,
    Active,
    /// Active, but expiring within the rent-due window
    RentDue,
    /// Past expiry, still renewable by its owner
    Expired,
}
