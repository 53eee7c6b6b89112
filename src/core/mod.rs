//! Deterministic primitives.
//!
//! Seeded randomness and state hashing shared by the engine, the runner
//! and the replay check.

pub mod rng;
pub mod hash;

pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
