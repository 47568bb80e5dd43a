use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use andeped_core::Result;

use super::{Detector, DetectorOptions};

const DEFAULT_SEED: u64 = 42;

/// Uniform random scores; the floor every real detector should beat.
#[derive(Debug, Clone)]
pub struct RandomDetector {
    seed: u64,
    rng: StdRng,
}

impl RandomDetector {
    pub fn new(_options: DetectorOptions) -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Detector for RandomDetector {
    fn name(&self) -> &str {
        "random"
    }

    fn initialize(&mut self) -> Result<()> {
        self.rng = StdRng::seed_from_u64(self.seed);
        Ok(())
    }

    fn score(&mut self, _value: f64) -> Result<f64> {
        Ok(self.rng.gen_range(0.0..=1.0))
    }
}
