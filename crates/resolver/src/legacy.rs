//! Legacy resolver read interface and its in-memory implementation.

use crate::errors::{ResolverError, Result};
use parking_lot::RwLock;
use rns_registry::AuthorityRegistry;
use rns_types::{Address, ContentHash, Node};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors a legacy resolver may report for a delegated read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LegacyError {
    #[error("legacy resolver does not implement {0}")]
    Unsupported(&'static str),

    #[error("legacy resolver backend error: {0}")]
    Backend(String),
}

/// Narrow read interface of a previously deployed single-chain resolver.
pub trait LegacyResolver: Send + Sync + fmt::Debug {
    fn addr(&self, node: &Node) -> std::result::Result<Address, LegacyError>;

    fn content(&self, node: &Node) -> std::result::Result<ContentHash, LegacyError>;
}

#[derive(Debug, Default, Clone, Copy)]
struct PublicRecord {
    addr: Address,
    content: ContentHash,
}

/// Single-chain resolver storing one address and one content hash per node.
///
/// Writes are gated on ownership in the shared registry.
#[derive(Debug)]
pub struct PublicResolver {
    registry: Arc<AuthorityRegistry>,
    records: RwLock<HashMap<Node, PublicRecord>>,
}

impl PublicResolver {
    pub fn new(registry: Arc<AuthorityRegistry>) -> Self {
        Self {
            registry,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_addr(&self, caller: &Address, node: &Node, addr: Address) -> Result<()> {
        self.ensure_owner(caller, node)?;
        self.records.write().entry(*node).or_default().addr = addr;
        debug!(target: "resolver", node = %node, addr = %addr, "legacy address set");
        Ok(())
    }

    pub fn set_content(&self, caller: &Address, node: &Node, hash: ContentHash) -> Result<()> {
        self.ensure_owner(caller, node)?;
        self.records.write().entry(*node).or_default().content = hash;
        debug!(target: "resolver", node = %node, content = %hash, "legacy content set");
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address, node: &Node) -> Result<()> {
        let owner = self.registry.owner(node);
        if owner.is_zero() || owner != *caller {
            return Err(ResolverError::NotAuthorized {
                node: *node,
                caller: *caller,
            });
        }
        Ok(())
    }

    fn record(&self, node: &Node) -> PublicRecord {
        self.records.read().get(node).copied().unwrap_or_default()
    }
}

impl LegacyResolver for PublicResolver {
    fn addr(&self, node: &Node) -> std::result::Result<Address, LegacyError> {
        Ok(self.record(node).addr)
    }

    fn content(&self, node: &Node) -> std::result::Result<ContentHash, LegacyError> {
        Ok(self.record(node).content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rns_types::{namehash, LabelHash};

    const OWNER: Address = Address::repeat_byte(1);
    const NOT_OWNER: Address = Address::repeat_byte(2);

    fn resolver() -> (PublicResolver, Node) {
        let registry = Arc::new(AuthorityRegistry::new(OWNER));
        registry
            .set_subnode_owner(&OWNER, &Node::ROOT, &LabelHash::of("tld"), OWNER)
            .unwrap();
        (PublicResolver::new(registry), namehash("tld"))
    }

    #[test]
    fn unset_values_read_as_zero() {
        let (resolver, node) = resolver();
        assert!(resolver.addr(&node).unwrap().is_zero());
        assert!(resolver.content(&node).unwrap().is_zero());
    }

    #[test]
    fn owner_writes_are_readable() {
        let (resolver, node) = resolver();
        let target = Address::repeat_byte(9);
        resolver.set_addr(&OWNER, &node, target).unwrap();
        resolver
            .set_content(&OWNER, &node, ContentHash::of(b"site"))
            .unwrap();

        assert_eq!(resolver.addr(&node).unwrap(), target);
        assert_eq!(resolver.content(&node).unwrap(), ContentHash::of(b"site"));
    }

    #[test]
    fn non_owner_writes_are_rejected() {
        let (resolver, node) = resolver();
        let err = resolver
            .set_addr(&NOT_OWNER, &node, NOT_OWNER)
            .unwrap_err();
        assert!(matches!(err, ResolverError::NotAuthorized { .. }));
        assert!(resolver.addr(&node).unwrap().is_zero());
    }
}
