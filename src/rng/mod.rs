//! Deterministic random number generation
//!
//! Everything random in the core flows from Mulberry32 generators seeded with
//! a block nonce. Named streams and round-robin chains derive further
//! generators from that one seed.

pub mod chain;
pub mod helpers;
pub mod streams;

pub use chain::{ChainManager, RngChain};
pub use helpers::Rgb8;
pub use streams::{hash_name, StreamManager, StreamOptions, StreamRng};

use rand::{RngCore, SeedableRng};

/// Source of uniform floats in `[0, 1)`.
pub trait Generator {
    fn next_f64(&mut self) -> f64;
}

impl<G: Generator + ?Sized> Generator for &mut G {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32: one 32-bit word of state, bit-exact on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    const INCREMENT: u32 = 0x6D2B_79F5;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Signed seeds are reduced modulo 2^32, so `-1` seeds like `0xFFFF_FFFF`.
    pub fn from_i64(seed: i64) -> Self {
        Self::new(seed as u32)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Raw 32-bit output; `next_f64` is this value divided by 2^32.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(Self::INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl Generator for Mulberry32 {
    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        Mulberry32::next_u32(self)
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(Mulberry32::next_u32(self));
        let lo = u64::from(Mulberry32::next_u32(self));
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = Mulberry32::next_u32(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
