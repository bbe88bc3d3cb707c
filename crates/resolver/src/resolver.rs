//! Multi-chain resolver with single-hop legacy fallback

use crate::errors::{ResolverError, Result};
use crate::legacy::LegacyResolver;
use crate::types::{
    interface_id, InterfaceId, ResolverRecord, ADDR_SIGNATURE, CHAIN_ADDR_SIGNATURE,
    CONTENT_SIGNATURE, SUPPORTS_INTERFACE_ID,
};
use parking_lot::RwLock;
use rns_registry::AuthorityRegistry;
use rns_types::{Address, ChainId, ContentHash, Node};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolver storing per-node default address, chain addresses and content.
///
/// Writes require the caller to own the node in the shared registry. Reads of
/// the default address and content consult the legacy resolver, if one was
/// supplied at construction, only while the local value is zero.
#[derive(Debug)]
pub struct MultiChainResolver {
    registry: Arc<AuthorityRegistry>,
    legacy: Option<Arc<dyn LegacyResolver>>,
    records: RwLock<HashMap<Node, ResolverRecord>>,
}

impl MultiChainResolver {
    pub fn new(
        registry: Arc<AuthorityRegistry>,
        legacy: Option<Arc<dyn LegacyResolver>>,
    ) -> Self {
        info!(
            target: "resolver",
            fallback = legacy.is_some(),
            "multi-chain resolver created"
        );
        Self {
            registry,
            legacy,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn has_legacy(&self) -> bool {
        self.legacy.is_some()
    }

    pub fn set_addr(&self, caller: &Address, node: &Node, addr: Address) -> Result<()> {
        self.ensure_owner(caller, node)?;
        self.records.write().entry(*node).or_default().addr = addr;
        debug!(target: "resolver", node = %node, addr = %addr, "address set");
        Ok(())
    }

    /// Default address of `node`, delegating to the legacy resolver while unset.
    pub fn addr(&self, node: &Node) -> Result<Address> {
        let local = self
            .records
            .read()
            .get(node)
            .map(|record| record.addr)
            .unwrap_or(Address::ZERO);
        if !local.is_zero() {
            return Ok(local);
        }

        match &self.legacy {
            Some(legacy) => legacy.addr(node).map_err(|err| {
                warn!(target: "resolver", node = %node, error = %err, "legacy addr lookup failed");
                ResolverError::InvalidFallback(err)
            }),
            None => Ok(Address::ZERO),
        }
    }

    pub fn set_chain_addr(
        &self,
        caller: &Address,
        node: &Node,
        chain: &ChainId,
        addr: impl Into<String>,
    ) -> Result<()> {
        self.ensure_owner(caller, node)?;
        let addr = addr.into();
        debug!(target: "resolver", node = %node, chain = %chain, addr = %addr, "chain address set");
        self.records
            .write()
            .entry(*node)
            .or_default()
            .chain_addrs
            .insert(*chain, addr);
        Ok(())
    }

    /// Address of `node` on `chain`, or the empty string when unset.
    ///
    /// Never consults the legacy resolver or the default address.
    pub fn chain_addr(&self, node: &Node, chain: &ChainId) -> String {
        self.records
            .read()
            .get(node)
            .and_then(|record| record.chain_addrs.get(chain).cloned())
            .unwrap_or_default()
    }

    pub fn set_content(&self, caller: &Address, node: &Node, hash: ContentHash) -> Result<()> {
        self.ensure_owner(caller, node)?;
        self.records.write().entry(*node).or_default().content = hash;
        debug!(target: "resolver", node = %node, content = %hash, "content set");
        Ok(())
    }

    /// Content hash of `node`, delegating to the legacy resolver while unset.
    pub fn content(&self, node: &Node) -> Result<ContentHash> {
        let local = self
            .records
            .read()
            .get(node)
            .map(|record| record.content)
            .unwrap_or(ContentHash::ZERO);
        if !local.is_zero() {
            return Ok(local);
        }

        match &self.legacy {
            Some(legacy) => legacy.content(node).map_err(|err| {
                warn!(target: "resolver", node = %node, error = %err, "legacy content lookup failed");
                ResolverError::InvalidFallback(err)
            }),
            None => Ok(ContentHash::ZERO),
        }
    }

    pub fn supports_interface(&self, id: InterfaceId) -> bool {
        id == SUPPORTS_INTERFACE_ID
            || id == interface_id(ADDR_SIGNATURE)
            || id == interface_id(CONTENT_SIGNATURE)
            || id == interface_id(CHAIN_ADDR_SIGNATURE)
    }

    /// Locally stored record for `node`, without any fallback.
    pub fn record(&self, node: &Node) -> Option<ResolverRecord> {
        self.records.read().get(node).cloned()
    }

    fn ensure_owner(&self, caller: &Address, node: &Node) -> Result<()> {
        let owner = self.registry.owner(node);
        if owner.is_zero() || owner != *caller {
            warn!(target: "resolver", node = %node, caller = %caller, "unauthorized resolver write");
            return Err(ResolverError::NotAuthorized {
                node: *node,
                caller: *caller,
            });
        }
        Ok(())
    }
}
