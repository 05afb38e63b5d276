//! Per-conversion id generation.

use rand::{Rng, SeedableRng, rngs::StdRng};

const DEFINITIONS_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const DEFINITIONS_SUFFIX_LEN: usize = 7;

/// Counter and random source scoped to one document.
///
/// A fresh context is created for every generated document, so concurrent
/// conversions never share counter state.
#[derive(Debug)]
pub(super) struct IdContext {
    counter: usize,
    rng: StdRng,
}

impl IdContext {
    /// Create a context; `seed` makes the definitions id reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { counter: 0, rng }
    }

    /// Next sequential id with the given prefix: `Process_1`, `Flow_2`, ...
    pub fn next(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}", self.counter)
    }

    /// `Definitions_` followed by seven random lowercase letters or digits.
    pub fn definitions_id(&mut self) -> String {
        let suffix: String = (0..DEFINITIONS_SUFFIX_LEN)
            .map(|_| {
                let index = self.rng.random_range(0..DEFINITIONS_ALPHABET.len());
                char::from(DEFINITIONS_ALPHABET[index])
            })
            .collect();
        format!("Definitions_{suffix}")
    }
}
