//! Visible trophy layer.
//!
//! Ranks participants by latent strength, maps rank position onto a
//! Normal(target_mean, target_std) curve, and nudges each visible score
//! toward its target after every match.
use crate::error::Result;
use crate::stats::inverse_normal_cdf;
use crate::types::SimulationConfig;

#[derive(Clone, Debug)]
pub struct TrophyProjector {
    pub win_gain: f64,
    pub loss_penalty: f64,
    pub target_mean: f64,
    pub target_std: f64,
    pub fade_width: f64,
}

impl TrophyProjector {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            win_gain: config.win_gain,
            loss_penalty: config.loss_penalty,
            target_mean: config.target_mean,
            target_std: config.target_std,
            fade_width: config.fade_width,
        }
    }

    /// Target trophy value for every participant, indexed like `strengths`.
    ///
    /// Rank positions use `(rank + 1) / (N + 1)` so the quantile never hits 0 or 1.
    /// Equal strengths keep index order, so the result is fully determined by the input.
    pub fn compute_targets(&self, strengths: &[f64]) -> Result<Vec<f64>> {
        let n = strengths.len();
        let mut order: Vec<usize> = (0..n).collect();
        // sort_by is stable
        order.sort_by(|&a, &b| strengths[a].total_cmp(&strengths[b]));

        let mut targets = vec![0.0; n];
        for (rank, idx) in order.into_iter().enumerate() {
            let p = (rank as f64 + 1.0) / (n as f64 + 1.0);
            targets[idx] = self.target_mean + self.target_std * inverse_normal_cdf(p)?;
        }
        Ok(targets)
    }

    /// Fraction of the full gain/penalty that applies at this distance below target.
    /// Zero at or above target, one once the gap reaches `fade_width`.
    pub fn scale(&self, trophy: f64, target: f64) -> f64 {
        ((target - trophy) / self.fade_width).clamp(0.0, 1.0)
    }

    /// New trophy score after one match
    pub fn step(&self, trophy: f64, target: f64, won: bool) -> f64 {
        let scale = self.scale(trophy, target);
        let next = if won {
            trophy + self.win_gain * scale
        } else {
            trophy - self.loss_penalty * scale
        };
        next.max(0.0)
    }
}
