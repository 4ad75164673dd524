//! Round-robin chains of generators derived from one seed.

use std::collections::{btree_map::Entry, BTreeMap};

use tracing::debug;

use super::{Generator, Mulberry32};
use crate::error::RngError;

pub const DEFAULT_CHAIN_LENGTH: usize = 10;

/// Ordered generators handed out in rotation.
///
/// Link `i + 1` is seeded from the first draw of link `i`, so every link has
/// already consumed one value once the chain is built.
#[derive(Debug, Clone)]
pub struct RngChain {
    name: String,
    generators: Vec<Mulberry32>,
    position: usize,
}

impl RngChain {
    pub fn new(name: impl Into<String>, seed: u32, length: usize) -> Result<Self, RngError> {
        if length == 0 {
            return Err(RngError::EmptyInput {
                operation: "create_chain",
            });
        }

        let mut generators = Vec::with_capacity(length);
        let mut current_seed = seed;
        for _ in 0..length {
            let mut generator = Mulberry32::new(current_seed);
            current_seed = (generator.next_f64() * 4_294_967_296.0).floor() as u32;
            generators.push(generator);
        }

        Ok(Self {
            name: name.into(),
            generators,
            position: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Index of the generator the next call to [`RngChain::next`] returns.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Hand out the generator at the cursor and advance, wrapping after the
    /// last link. Never exhausts.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &mut Mulberry32 {
        let index = self.position;
        self.position = (index + 1) % self.generators.len();
        &mut self.generators[index]
    }

    /// Move the cursor back to the first link. Generator states are left as
    /// they are, so a reset does not replay earlier values.
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Generator for RngChain {
    /// One draw from the current link, then rotate.
    fn next_f64(&mut self) -> f64 {
        self.next().next_f64()
    }
}

/// Named chains, kept in name order.
pub struct ChainManager {
    chains: BTreeMap<String, RngChain>,
    default_length: usize,
}

impl ChainManager {
    pub fn new(default_length: usize) -> Self {
        Self {
            chains: BTreeMap::new(),
            default_length,
        }
    }

    pub fn default_length(&self) -> usize {
        self.default_length
    }

    /// Build a chain and register it under `name`, replacing any previous one.
    pub fn create_chain(
        &mut self,
        name: &str,
        seed: u32,
        length: Option<usize>,
    ) -> Result<&mut RngChain, RngError> {
        let length = length.unwrap_or(self.default_length);
        let chain = RngChain::new(name, seed, length)?;
        debug!(chain = name, seed, length, "creating rng chain");
        Ok(match self.chains.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                *slot = chain;
                slot
            }
            Entry::Vacant(entry) => entry.insert(chain),
        })
    }

    pub fn get_chain(&mut self, name: &str) -> Option<&mut RngChain> {
        self.chains.get_mut(name)
    }

    /// Existing chains are returned as-is; `seed` and `length` only apply on creation.
    pub fn get_or_create_chain(
        &mut self,
        name: &str,
        seed: u32,
        length: Option<usize>,
    ) -> Result<&mut RngChain, RngError> {
        let length = length.unwrap_or(self.default_length);
        match self.chains.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let chain = RngChain::new(name, seed, length)?;
                debug!(chain = name, seed, length, "creating rng chain");
                Ok(entry.insert(chain))
            }
        }
    }

    pub fn remove_chain(&mut self, name: &str) -> Option<RngChain> {
        self.chains.remove(name)
    }

    pub fn clear_chains(&mut self) {
        self.chains.clear();
    }

    pub fn chain_names(&self) -> Vec<String> {
        self.chains.keys().cloned().collect()
    }
}

impl Default for ChainManager {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_LENGTH)
    }
}
