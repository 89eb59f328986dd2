//! Deterministic hash-based identity for templates and instantiations.
//!
//! This module provides [`TypeHash`], a 64-bit hash that identifies a template
//! type, one of its members, or one concrete instantiation. Hashes are computed
//! from names and argument hashes, so the same declaration always hashes the
//! same way:
//!
//! - Same template name = same hash
//! - Same template + same ordered argument hashes = same instantiation hash
//! - Member hashes incorporate their owner, so `A.x` and `B.x` never collide
//!
//! # Hash Computation
//!
//! Uses XXHash64 with domain-specific mixing constants to prevent collisions
//! between different entity kinds (templates vs members vs operators).
//!
//! # Examples
//!
//! ```
//! use templar_core::TypeHash;
//!
//! let a = TypeHash::from_name("A");
//! assert_eq!(a, TypeHash::from_name("A"));
//!
//! let arg = TypeHash::from_name("custom");
//! let inst = TypeHash::from_template_instance(a, &[arg]);
//! assert_ne!(inst, a);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for chained components
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for template type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for parent-level and instance-level member hashes
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for operator overload hashes
    pub const OPERATOR: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for raw value hashes
    pub const VALUE: u64 = 0x1a095090689d4647;

    /// Argument position mixing constants.
    /// Each argument position gets a unique constant so argument order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a template, member, or instantiation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a hash from a template's qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a member hash from the owning template and the member name.
    #[inline]
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::MEMBER ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Create an operator hash from the owning template and operator method name.
    ///
    /// Uses a different domain constant than [`TypeHash::from_member`] so a
    /// parent-level method called `add` never collides with the `+` overload.
    #[inline]
    pub fn from_operator(owner: TypeHash, operator_name: &str) -> Self {
        TypeHash(hash_constants::OPERATOR ^ owner.0 ^ xxh64(operator_name.as_bytes(), 0))
    }

    /// Create a hash for raw bytes belonging to a value (strings, encoded numbers).
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        TypeHash(hash_constants::VALUE ^ xxh64(bytes, 0))
    }

    /// Create an instantiation hash from a template hash and ordered argument hashes.
    ///
    /// Argument order matters: `T[1, 2]` hashes differently from `T[2, 1]`.
    #[inline]
    pub fn from_template_instance(template: TypeHash, args: &[TypeHash]) -> Self {
        Self::chain(template.0, args)
    }

    /// Fold a sequence of hashes into a seed, order-sensitively.
    #[inline]
    pub fn chain(seed: u64, parts: &[TypeHash]) -> Self {
        let mut hash = seed;
        for (i, part) in parts.iter().enumerate() {
            let marker = hash_constants::PARAM_MARKERS
                .get(i)
                .copied()
                .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
            // wrapping_mul keeps the fold non-commutative
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ part.0);
        }
        TypeHash(hash)
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
