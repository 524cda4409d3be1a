//! Hash map alias used for the sparse tick, bitmap and position ledgers.
//!
//! Keys are small integers or fixed-size byte arrays, so the default is the
//! non-cryptographic `rustc-hash` hasher; the `std-hash` feature falls back
//! to the standard library's SipHash.

#[cfg(all(feature = "rustc-hash", not(feature = "std-hash")))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(any(feature = "std-hash", not(feature = "rustc-hash")))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
