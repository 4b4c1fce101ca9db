//! Call memoization for external service clients.
//!
//! Deduplicates identical read calls issued during one audit pass. Each
//! client identity gets one moka-backed cache keyed by a SHA-256
//! fingerprint of the operation and its canonicalized input.

pub mod fingerprint;
pub mod memoizer;
pub mod registry;

pub use fingerprint::Fingerprint;
pub use memoizer::{MemoStats, MemoizedClient, Memoizer};
pub use registry::MemoRegistry;
