//! 32-byte identifiers and keccak-256 derivations.
//!
//! Nodes follow the ENS namehash scheme: the root is 32 zero bytes and a
//! child is `keccak256(parent ++ keccak256(label))`. Chain identifiers and
//! label hashes are plain keccak digests of their symbol or label.

use crate::address::Address;
use crate::Amount;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Number of raw bytes in every hash-derived identifier.
pub const HASH_BYTES: usize = 32;

/// Errors raised when parsing a hex-encoded identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
    #[error("identifier is not valid hexadecimal: {0}")]
    InvalidHex(String),
    #[error("identifier must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Decode an optionally `0x`-prefixed hex string into a fixed-size array.
pub(crate) fn decode_fixed<const N: usize>(value: &str) -> Result<[u8; N], HashParseError> {
    let payload = value.strip_prefix("0x").unwrap_or(value);
    let decoded =
        hex::decode(payload).map_err(|err| HashParseError::InvalidHex(err.to_string()))?;
    let actual = decoded.len();
    decoded.try_into().map_err(|_| HashParseError::InvalidLength {
        expected: N,
        actual,
    })
}

macro_rules! hash_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(pub [u8; HASH_BYTES]);

        impl $name {
            /// All-zero value, read as "unset" by every component.
            pub const ZERO: Self = Self([0u8; HASH_BYTES]);

            pub const fn new(bytes: [u8; HASH_BYTES]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; HASH_BYTES]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = HashParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_fixed::<HASH_BYTES>(s).map(Self)
            }
        }

        impl From<[u8; HASH_BYTES]> for $name {
            fn from(value: [u8; HASH_BYTES]) -> Self {
                Self(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = HashParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

hash_identifier!(
    /// Namehash of a hierarchical name; the universal key of every subsystem.
    Node
);

hash_identifier!(
    /// keccak-256 of a single name label.
    LabelHash
);

hash_identifier!(
    /// Identifier of an external address namespace, e.g. `keccak256("BTC")`.
    ChainId
);

hash_identifier!(
    /// Content identifier published for a node.
    ContentHash
);

hash_identifier!(
    /// Commitment to a sealed bid's contents.
    SealedBid
);

/// keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; HASH_BYTES] {
    Keccak256::digest(data).into()
}

impl Node {
    /// The root of the namespace.
    pub const ROOT: Node = Node::ZERO;
}

impl LabelHash {
    /// Hash a single label (no dots).
    pub fn of(label: &str) -> Self {
        Self(keccak256(label.as_bytes()))
    }
}

impl ChainId {
    /// Chain identifier for a ticker symbol such as `BTC` or `RBTC`.
    pub fn of(symbol: &str) -> Self {
        Self(keccak256(symbol.as_bytes()))
    }
}

impl ContentHash {
    /// Content hash of an arbitrary byte payload.
    pub fn of(content: &[u8]) -> Self {
        Self(keccak256(content))
    }
}

/// Child node of `parent` for `label`.
pub fn subnode(parent: &Node, label: &LabelHash) -> Node {
    let mut hasher = Keccak256::new();
    hasher.update(parent.as_bytes());
    hasher.update(label.as_bytes());
    Node(hasher.finalize().into())
}

/// Namehash of a dotted name. The empty name is the root node.
///
/// No normalization is applied; callers pass already-normalized names.
pub fn namehash(name: &str) -> Node {
    if name.is_empty() {
        return Node::ROOT;
    }
    name.rsplit('.')
        .fold(Node::ROOT, |node, label| subnode(&node, &LabelHash::of(label)))
}

/// Commitment for a sealed bid: `keccak256(label ++ bidder ++ uint256(value) ++ salt)`.
pub fn seal_bid(label: &LabelHash, bidder: &Address, value: Amount, salt: &[u8; HASH_BYTES]) -> SealedBid {
    let mut value_word = [0u8; HASH_BYTES];
    value_word[HASH_BYTES - 8..].copy_from_slice(&value.to_be_bytes());

    let mut hasher = Keccak256::new();
    hasher.update(label.as_bytes());
    hasher.update(bidder.as_bytes());
    hasher.update(value_word);
    hasher.update(salt);
    SealedBid(hasher.finalize().into())
}
