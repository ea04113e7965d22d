//! Online Bradley-Terry estimator.
//!
//! One latent log-strength per participant. Each observed result moves the
//! pair one stochastic-gradient step toward the pairwise maximum-likelihood
//! solution; the step is bounded by `step_size` because `1 - p_est` is in [0, 1].
use crate::error::{Result, SimError};
use crate::outcome::logistic;

pub struct BradleyTerryEstimator {
    strengths: Vec<f64>,
}

impl BradleyTerryEstimator {
    pub fn new(num_participants: usize) -> Self {
        Self {
            strengths: vec![0.0; num_participants],
        }
    }

    pub fn strengths(&self) -> &[f64] {
        &self.strengths
    }

    pub(crate) fn strength(&self, index: usize) -> f64 {
        self.strengths[index]
    }

    /// Estimated probability that `a` beats `b`.
    /// Uses the difference form so extreme strengths cannot overflow.
    pub(crate) fn expected_score(&self, a: usize, b: usize) -> f64 {
        logistic(self.strengths[a] - self.strengths[b])
    }

    /// Apply one observed result and return the strength moved from loser to winner.
    pub fn update(&mut self, winner: usize, loser: usize, step_size: f64) -> Result<f64> {
        if winner == loser {
            return Err(SimError::invalid_config(format!(
                "participant {} cannot play itself",
                winner
            )));
        }
        let n = self.strengths.len();
        if winner >= n || loser >= n {
            return Err(SimError::invalid_config(format!(
                "match ({}, {}) out of range for {} participants",
                winner, loser, n
            )));
        }

        let p_est = self.expected_score(winner, loser);
        let delta = step_size * (1.0 - p_est);

        let new_winner = self.strengths[winner] + delta;
        let new_loser = self.strengths[loser] - delta;
        if !delta.is_finite() || !new_winner.is_finite() || !new_loser.is_finite() {
            return Err(SimError::numerical(format!(
                "non-finite strength update for match ({}, {}): p_est={}, delta={}",
                winner, loser, p_est, delta
            )));
        }

        self.strengths[winner] = new_winner;
        self.strengths[loser] = new_loser;
        Ok(delta)
    }
}
