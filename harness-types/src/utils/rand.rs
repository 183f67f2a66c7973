//! Randomness helpers for generating credential ids and test data.

use rand::Rng;

/// Generate a vector of `len` random bytes from the thread-local RNG.
pub fn random_vec(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}
