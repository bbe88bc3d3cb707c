//! Bid / register / renew / rent state machine
//!
//! Every mutating call takes the registrar's write lock for its whole
//! duration and follows the same order: validate, pull funds, write state.
//! A failed pull therefore leaves bids, registrations and ownership exactly
//! as they were. If the ownership write fails after a successful pull the
//! funds are pushed back before the error is returned.

use crate::config::RegistrarConfig;
use crate::errors::*;
use crate::ledger::TokenLedger;
use crate::types::*;
use parking_lot::RwLock;
use rns_registry::{AuthorityRegistry, RegistryError};
use rns_types::{
    seal_bid, subnode, Address, Amount, Clock, LabelHash, Node, SealedBid, Timestamp,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct RegistrarState {
    /// Sealed commitment → escrowed bid
    bids: HashMap<SealedBid, BidRecord>,
    /// Label → registration
    registrations: HashMap<LabelHash, Registration>,
}

/// Outcome of the pre-payment checks for `register` / `finalize_bid`.
#[derive(Debug, Clone, Copy)]
struct RegistrationPlan {
    expires_at: Timestamp,
    /// The bidder already holds an active registration that is being extended
    extends: bool,
}

/// Registrar for the children of one root node.
///
/// The registrar must own `root_node` in the shared [`AuthorityRegistry`];
/// it hands `subnode(root_node, label)` to whoever registers `label`.
#[derive(Debug)]
pub struct Registrar {
    address: Address,
    root_node: Node,
    registry: Arc<AuthorityRegistry>,
    ledger: Arc<dyn TokenLedger>,
    clock: Arc<dyn Clock>,
    config: RegistrarConfig,
    state: RwLock<RegistrarState>,
}

impl Registrar {
    /// Create a registrar acting as `address` for the children of `root_node`.
    pub fn new(
        address: Address,
        root_node: Node,
        registry: Arc<AuthorityRegistry>,
        ledger: Arc<dyn TokenLedger>,
        clock: Arc<dyn Clock>,
        config: RegistrarConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            address,
            root_node,
            registry,
            ledger,
            clock,
            config,
            state: RwLock::new(RegistrarState::default()),
        })
    }

    /// Identity the registrar uses on the ledger and in the registry.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn root_node(&self) -> Node {
        self.root_node
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Node whose ownership is managed for `label`.
    pub fn node_for(&self, label: &LabelHash) -> Node {
        subnode(&self.root_node, label)
    }

    // -------------------------------------------------------------------------
    // Sealed bids
    // -------------------------------------------------------------------------

    /// Escrow `deposit` from `bidder` behind the commitment `sealed`.
    pub fn new_bid(&self, sealed: SealedBid, deposit: Amount, bidder: &Address) -> Result<BidRecord> {
        let mut state = self.state.write();
        if state.bids.contains_key(&sealed) {
            return Err(RegistrarError::BidAlreadyExists(sealed));
        }

        self.pull(bidder, deposit)?;

        let record = BidRecord {
            sealed,
            bidder: *bidder,
            deposit,
            created_at: self.clock.now(),
            phase: BidPhase::Committed,
        };
        state.bids.insert(sealed, record.clone());

        info!(
            target: "registrar",
            sealed = %sealed,
            bidder = %bidder,
            deposit,
            "Sealed bid committed"
        );
        Ok(record)
    }

    /// Prove the contents of a committed bid. Escrow above `value` is
    /// refunded to the bidder.
    pub fn unseal_bid(
        &self,
        label: &LabelHash,
        value: Amount,
        salt: &[u8; 32],
        bidder: &Address,
    ) -> Result<BidRecord> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let sealed = seal_bid(label, bidder, value, salt);

        let record = state
            .bids
            .get(&sealed)
            .cloned()
            .ok_or(RegistrarError::BidNotFound(sealed))?;
        if record.bidder != *bidder {
            return Err(RegistrarError::NotAuthorized { caller: *bidder });
        }
        if record.phase != BidPhase::Committed {
            return Err(RegistrarError::InvalidReveal(sealed));
        }
        if now >= record.created_at.saturating_add(self.config.bid_expiry_secs) {
            return Err(RegistrarError::BidExpired(sealed));
        }
        if value > record.deposit {
            return Err(RegistrarError::InsufficientValue {
                required: value,
                offered: record.deposit,
            });
        }

        self.refund(bidder, record.deposit - value)?;

        let revealed = BidRecord {
            deposit: value,
            phase: BidPhase::Revealed,
            ..record
        };
        state.bids.insert(sealed, revealed.clone());

        info!(target: "registrar", sealed = %sealed, value, "Sealed bid revealed");
        Ok(revealed)
    }

    /// Turn a revealed bid into a registration of `label`, paid from escrow.
    /// The bid record is consumed.
    pub fn finalize_bid(
        &self,
        label: &LabelHash,
        value: Amount,
        salt: &[u8; 32],
        bidder: &Address,
    ) -> Result<Registration> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let sealed = seal_bid(label, bidder, value, salt);

        let record = state
            .bids
            .get(&sealed)
            .cloned()
            .ok_or(RegistrarError::BidNotFound(sealed))?;
        if record.bidder != *bidder {
            return Err(RegistrarError::NotAuthorized { caller: *bidder });
        }
        if record.phase != BidPhase::Revealed {
            return Err(RegistrarError::BidNotRevealed(sealed));
        }
        self.ensure_price(record.deposit)?;
        let plan = self.plan_registration(&state, label, bidder, now)?;
        self.ensure_root_authority()?;

        // Escrow stays with the bid until ownership has moved.
        self.assign(label, bidder)?;
        state.bids.remove(&sealed);
        let registration = self.record_registration(&mut state, label, bidder, record.deposit, now, plan);

        info!(
            target: "registrar",
            sealed = %sealed,
            node = %registration.node,
            owner = %bidder,
            "Sealed bid finalized"
        );
        Ok(registration)
    }

    /// Withdraw an unfinalized bid once its reveal window has closed.
    /// Returns the refunded amount.
    pub fn cancel_bid(&self, sealed: &SealedBid, bidder: &Address) -> Result<Amount> {
        let mut state = self.state.write();
        let now = self.clock.now();

        let record = state
            .bids
            .get(sealed)
            .cloned()
            .ok_or(RegistrarError::BidNotFound(*sealed))?;
        if record.bidder != *bidder {
            return Err(RegistrarError::NotAuthorized { caller: *bidder });
        }
        let unlocks_at = record.created_at.saturating_add(self.config.bid_expiry_secs);
        if now < unlocks_at {
            return Err(RegistrarError::BidNotExpired {
                sealed: *sealed,
                unlocks_at,
            });
        }

        self.refund(bidder, record.deposit)?;
        state.bids.remove(sealed);

        info!(target: "registrar", sealed = %sealed, refunded = record.deposit, "Sealed bid cancelled");
        Ok(record.deposit)
    }

    // -------------------------------------------------------------------------
    // Registration lifecycle
    // -------------------------------------------------------------------------

    /// Register `label` for `bidder`, paying `value`.
    ///
    /// Succeeds when the label is unregistered or expired. When `bidder`
    /// already holds it actively, the registration is extended by one term.
    pub fn register(&self, label: &LabelHash, value: Amount, bidder: &Address) -> Result<Registration> {
        let mut state = self.state.write();
        let now = self.clock.now();

        self.ensure_price(value)?;
        let plan = self.plan_registration(&state, label, bidder, now)?;
        self.ensure_root_authority()?;

        self.pull(bidder, value)?;
        if let Err(error) = self.assign(label, bidder) {
            warn!(target: "registrar", label = %label, %error, "ownership write failed, refunding");
            self.refund(bidder, value)?;
            return Err(error);
        }
        let registration = self.record_registration(&mut state, label, bidder, value, now, plan);

        info!(
            target: "registrar",
            node = %registration.node,
            owner = %bidder,
            expires_at = registration.expires_at,
            extended = plan.extends,
            "Name registered"
        );
        Ok(registration)
    }

    /// Extend the registration of `label` by the duration `value` buys.
    ///
    /// Only the current owner may renew, and only until the grace period after
    /// expiry has passed.
    pub fn renew(&self, label: &LabelHash, value: Amount, bidder: &Address) -> Result<Registration> {
        let mut state = self.state.write();
        let now = self.clock.now();
        let node = self.node_for(label);

        let current = state
            .registrations
            .get(label)
            .ok_or(RegistrarError::NotRegistered { label: *label })?;
        if self.registry.owner(&node) != *bidder {
            return Err(RegistrarError::NotAuthorized { caller: *bidder });
        }
        let grace_ends = current.expires_at.saturating_add(self.config.grace_period_secs);
        if now >= grace_ends {
            return Err(RegistrarError::GracePeriodElapsed {
                label: *label,
                ended_at: grace_ends,
            });
        }
        let extension = self.purchased(value, self.config.renewal_price_per_term)?;
        let expires_at = current
            .expires_at
            .checked_add(extension)
            .ok_or(RegistrarError::Overflow("expiry"))?;

        self.pull(bidder, value)?;

        let registration = state
            .registrations
            .get_mut(label)
            .ok_or(RegistrarError::NotRegistered { label: *label })?;
        registration.owner = *bidder;
        registration.expires_at = expires_at;
        registration.total_paid = registration.total_paid.saturating_add(value);

        info!(target: "registrar", node = %node, expires_at, "Name renewed");
        Ok(registration.clone())
    }

    /// Add `deposit` to the rent balance of `label`, extending its expiry at
    /// the configured rent rate. Anyone may pay rent until the grace period
    /// after expiry has passed.
    pub fn pay_rent(&self, label: &LabelHash, deposit: Amount, payer: &Address) -> Result<Registration> {
        let mut state = self.state.write();
        let now = self.clock.now();

        let current = state
            .registrations
            .get(label)
            .ok_or(RegistrarError::NotRegistered { label: *label })?;
        // A lapsed name only comes back through `register`.
        let grace_ends = current.expires_at.saturating_add(self.config.grace_period_secs);
        if now >= grace_ends {
            return Err(RegistrarError::GracePeriodElapsed {
                label: *label,
                ended_at: grace_ends,
            });
        }
        let extension = self.purchased(deposit, self.config.rent_price_per_term)?;
        let expires_at = current
            .expires_at
            .checked_add(extension)
            .ok_or(RegistrarError::Overflow("expiry"))?;

        self.pull(payer, deposit)?;

        let registration = state
            .registrations
            .get_mut(label)
            .ok_or(RegistrarError::NotRegistered { label: *label })?;
        registration.rent_balance = registration.rent_balance.saturating_add(deposit);
        registration.expires_at = expires_at;

        info!(
            target: "registrar",
            node = %registration.node,
            payer = %payer,
            deposit,
            expires_at,
            "Rent paid"
        );
        Ok(registration.clone())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Lifecycle state of `label` at the current time.
    pub fn state(&self, label: &LabelHash) -> NameState {
        let now = self.clock.now();
        let state = self.state.read();
        match state.registrations.get(label) {
            None => NameState::Unregistered,
            Some(registration) => self.classify(registration, now),
        }
    }

    pub fn registration(&self, label: &LabelHash) -> Option<Registration> {
        self.state.read().registrations.get(label).cloned()
    }

    pub fn bid(&self, sealed: &SealedBid) -> Option<BidRecord> {
        self.state.read().bids.get(sealed).cloned()
    }

    /// Total escrow plus collected payments held by the registrar.
    pub fn held_funds(&self) -> Amount {
        self.ledger.balance_of(&self.address)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn classify(&self, registration: &Registration, now: Timestamp) -> NameState {
        if registration.is_active(now) {
            if registration.expires_at - now <= self.config.rent_due_window_secs {
                NameState::RentDue
            } else {
                NameState::Active
            }
        } else if now < registration.expires_at.saturating_add(self.config.grace_period_secs) {
            NameState::Expired
        } else {
            NameState::Unregistered
        }
    }

    fn plan_registration(
        &self,
        state: &RegistrarState,
        label: &LabelHash,
        bidder: &Address,
        now: Timestamp,
    ) -> Result<RegistrationPlan> {
        let term = self.config.base_term_secs;
        match state.registrations.get(label) {
            Some(current) if current.is_active(now) => {
                if self.registry.owner(&self.node_for(label)) != *bidder {
                    return Err(RegistrarError::AlreadyRegistered { label: *label });
                }
                let expires_at = current
                    .expires_at
                    .checked_add(term)
                    .ok_or(RegistrarError::Overflow("expiry"))?;
                Ok(RegistrationPlan {
                    expires_at,
                    extends: true,
                })
            }
            _ => {
                let expires_at = now
                    .checked_add(term)
                    .ok_or(RegistrarError::Overflow("expiry"))?;
                Ok(RegistrationPlan {
                    expires_at,
                    extends: false,
                })
            }
        }
    }

    fn record_registration(
        &self,
        state: &mut RegistrarState,
        label: &LabelHash,
        bidder: &Address,
        paid: Amount,
        now: Timestamp,
        plan: RegistrationPlan,
    ) -> Registration {
        let node = self.node_for(label);
        let registration = match state.registrations.get(label) {
            Some(current) if plan.extends => Registration {
                owner: *bidder,
                expires_at: plan.expires_at,
                total_paid: current.total_paid.saturating_add(paid),
                ..current.clone()
            },
            _ => Registration {
                label: *label,
                node,
                owner: *bidder,
                registered_at: now,
                expires_at: plan.expires_at,
                rent_balance: 0,
                total_paid: paid,
            },
        };
        state.registrations.insert(*label, registration.clone());
        registration
    }

    fn ensure_price(&self, value: Amount) -> Result<()> {
        if value < self.config.registration_price {
            return Err(RegistrarError::InsufficientValue {
                required: self.config.registration_price,
                offered: value,
            });
        }
        Ok(())
    }

    /// Seconds bought by `value`; a payment that buys nothing is rejected.
    fn purchased(&self, value: Amount, price_per_term: Amount) -> Result<u64> {
        let secs = self.config.duration_for(value, price_per_term)?;
        if secs == 0 {
            return Err(RegistrarError::InsufficientValue {
                required: self.config.min_payment(price_per_term),
                offered: value,
            });
        }
        Ok(secs)
    }

    fn ensure_root_authority(&self) -> Result<()> {
        if self.registry.owner(&self.root_node) != self.address {
            return Err(RegistryError::NotAuthorized {
                node: self.root_node,
                caller: self.address,
            }
            .into());
        }
        Ok(())
    }

    fn assign(&self, label: &LabelHash, owner: &Address) -> Result<Node> {
        Ok(self
            .registry
            .set_subnode_owner(&self.address, &self.root_node, label, *owner)?)
    }

    fn pull(&self, from: &Address, amount: Amount) -> Result<()> {
        self.ledger
            .transfer_from(&self.address, from, &self.address, amount)
            .map_err(|error| {
                debug!(target: "registrar", from = %from, amount, %error, "pull payment rejected");
                RegistrarError::TransferFailed(error)
            })
    }

    fn refund(&self, to: &Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        self.ledger.transfer(&self.address, to, amount)?;
        debug!(target: "registrar", to = %to, amount, "refund sent");
        Ok(())
    }
}
