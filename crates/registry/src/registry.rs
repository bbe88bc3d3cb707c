//! Node ownership storage and delegation

use crate::errors::*;
use crate::types::*;
use parking_lot::RwLock;
use rns_types::{subnode, Address, LabelHash, Node};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct RegistryState {
    /// Node → ownership record
    records: HashMap<Node, OwnershipRecord>,
    /// Owner → nodes currently held (reverse lookup)
    owner_to_nodes: HashMap<Address, Vec<Node>>,
}

impl RegistryState {
    fn owner(&self, node: &Node) -> Address {
        self.records
            .get(node)
            .map(|record| record.owner)
            .unwrap_or_default()
    }

    fn ensure_owner(&self, caller: &Address, node: &Node) -> Result<()> {
        let owner = self.owner(node);
        if owner.is_zero() || owner != *caller {
            return Err(RegistryError::NotAuthorized {
                node: *node,
                caller: *caller,
            });
        }
        Ok(())
    }

    fn assign_owner(&mut self, node: Node, new_owner: Address) {
        let record = self.records.entry(node).or_default();
        let previous = std::mem::replace(&mut record.owner, new_owner);

        if previous == new_owner {
            return;
        }
        if let Some(nodes) = self.owner_to_nodes.get_mut(&previous) {
            nodes.retain(|n| n != &node);
            if nodes.is_empty() {
                self.owner_to_nodes.remove(&previous);
            }
        }
        if !new_owner.is_zero() {
            self.owner_to_nodes.entry(new_owner).or_default().push(node);
        }
    }
}

/// Authority registry
///
/// The single ownership view shared (by `Arc`) between the registrar and the
/// resolver. The root node is owned by the root authority given at
/// construction; everything below it is created through
/// [`AuthorityRegistry::set_subnode_owner`].
#[derive(Debug)]
pub struct AuthorityRegistry {
    state: RwLock<RegistryState>,
}

impl AuthorityRegistry {
    /// Create a registry whose root node belongs to `root_authority`.
    pub fn new(root_authority: Address) -> Self {
        let mut state = RegistryState::default();
        state.assign_owner(Node::ROOT, root_authority);
        Self {
            state: RwLock::new(state),
        }
    }

    /// Assign `subnode(parent, label)` to `new_owner`.
    ///
    /// Only the current owner of `parent` may delegate its children. Returns
    /// the child node.
    pub fn set_subnode_owner(
        &self,
        caller: &Address,
        parent: &Node,
        label: &LabelHash,
        new_owner: Address,
    ) -> Result<Node> {
        let mut state = self.state.write();
        state.ensure_owner(caller, parent)?;

        let node = subnode(parent, label);
        state.assign_owner(node, new_owner);

        info!(
            target: "registry",
            parent = %parent,
            node = %node,
            owner = %new_owner,
            "Subnode owner set"
        );
        Ok(node)
    }

    /// Transfer `node` to `new_owner`. Transferring to the zero address
    /// releases the node.
    pub fn set_owner(&self, caller: &Address, node: &Node, new_owner: Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(caller, node)?;
        state.assign_owner(*node, new_owner);

        info!(target: "registry", node = %node, owner = %new_owner, "Node transferred");
        Ok(())
    }

    /// Point `node` at a resolver.
    pub fn set_resolver(&self, caller: &Address, node: &Node, resolver: Address) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(caller, node)?;
        state.records.entry(*node).or_default().resolver = resolver;

        debug!(target: "registry", node = %node, resolver = %resolver, "Resolver set");
        Ok(())
    }

    pub fn set_ttl(&self, caller: &Address, node: &Node, ttl: u64) -> Result<()> {
        let mut state = self.state.write();
        state.ensure_owner(caller, node)?;
        state.records.entry(*node).or_default().ttl = ttl;

        debug!(target: "registry", node = %node, ttl, "TTL set");
        Ok(())
    }

    /// Current owner of `node`; the zero address when unowned.
    pub fn owner(&self, node: &Node) -> Address {
        self.state.read().owner(node)
    }

    pub fn resolver(&self, node: &Node) -> Address {
        self.record(node).resolver
    }

    pub fn ttl(&self, node: &Node) -> u64 {
        self.record(node).ttl
    }

    /// Full ownership record of `node`.
    pub fn record(&self, node: &Node) -> OwnershipRecord {
        self.state
            .read()
            .records
            .get(node)
            .copied()
            .unwrap_or_default()
    }

    /// Nodes currently held by `owner`, in assignment order.
    pub fn nodes_owned_by(&self, owner: &Address) -> Vec<Node> {
        self.state
            .read()
            .owner_to_nodes
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }
}
