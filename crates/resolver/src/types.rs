//! Types for the resolver

use rns_types::{keccak256, Address, ChainId, ContentHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Data published for one node.
///
/// `addr` and `chain_addrs` are separate namespaces: neither is ever read or
/// written through the other. Zero values mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverRecord {
    pub addr: Address,
    pub content: ContentHash,
    #[serde(default)]
    pub chain_addrs: BTreeMap<ChainId, String>,
}

/// 4-byte interface identifier (ERC-165 style).
pub type InterfaceId = [u8; 4];

/// Selector of a function signature: the first four bytes of its keccak-256.
pub fn interface_id(signature: &str) -> InterfaceId {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// ERC-165 `supportsInterface(bytes4)`.
pub const SUPPORTS_INTERFACE_ID: InterfaceId = [0x01, 0xff, 0xc9, 0xa7];

/// Signatures of the read interfaces served by [`crate::MultiChainResolver`].
pub const ADDR_SIGNATURE: &str = "addr(bytes32)";
pub const CONTENT_SIGNATURE: &str = "content(bytes32)";
pub const CHAIN_ADDR_SIGNATURE: &str = "chainAddr(bytes32,bytes32)";
