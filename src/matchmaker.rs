use crate::error::{Result, SimError};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Kernel-weighted opponent selection over estimated strengths
pub struct Matchmaker {
    sigma: f64,
}

impl Matchmaker {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Similarity of two strengths under the Gaussian kernel.
    /// Non-finite results (degenerate bandwidth) count as zero.
    pub fn similarity(&self, s_i: f64, s_j: f64) -> f64 {
        let z = (s_j - s_i) / self.sigma;
        let w = (-0.5 * z * z).exp();
        if w.is_finite() {
            w
        } else {
            0.0
        }
    }

    /// Unnormalized weights for every candidate opponent of `participant`.
    /// The participant's own slot is always zero.
    pub(crate) fn weights(&self, participant: usize, strengths: &[f64]) -> Vec<f64> {
        let s_i = strengths[participant];
        strengths
            .iter()
            .enumerate()
            .map(|(j, &s_j)| {
                if j == participant {
                    0.0
                } else {
                    self.similarity(s_i, s_j)
                }
            })
            .collect()
    }

    /// Pick an opponent whose expected result against `participant` is close to 50/50
    pub fn choose_opponent(
        &self,
        participant: usize,
        strengths: &[f64],
        rng: &mut impl Rng,
    ) -> Result<usize> {
        let n = strengths.len();
        if n < 2 {
            return Err(SimError::invalid_config(format!(
                "matchmaking needs at least 2 participants, got {}",
                n
            )));
        }
        if participant >= n {
            return Err(SimError::invalid_config(format!(
                "participant {} out of range for {} participants",
                participant, n
            )));
        }

        let weights = self.weights(participant, strengths);
        let total: f64 = weights.iter().sum();

        if total > 0.0 && total.is_finite() {
            if let Ok(dist) = WeightedIndex::new(&weights) {
                return Ok(dist.sample(rng));
            }
        }

        log::debug!(
            "all kernel weights collapsed for participant {} (sigma={}), using uniform pick",
            participant,
            self.sigma
        );
        Ok(Self::uniform_other(participant, n, rng))
    }

    /// Uniform choice among everyone except `participant`
    fn uniform_other(participant: usize, n: usize, rng: &mut impl Rng) -> usize {
        let pick = rng.gen_range(0..n - 1);
        if pick >= participant {
            pick + 1
        } else {
            pick
        }
    }
}
