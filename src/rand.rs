//! Per-thread random source for spill file names.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::cell::RefCell;

thread_local! {
    static NAME_RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

/// Reseeds the calling thread's generator so that names repeat across runs.
pub fn reseed(seed: u64) {
    NAME_RNG.with(|rng| *rng.borrow_mut() = SmallRng::seed_from_u64(seed));
}

/// Random suffix that keeps concurrently created spill files apart.
pub fn unique_suffix() -> String {
    NAME_RNG.with(|rng| format!("{:016x}", rng.borrow_mut().next_u64()))
}
