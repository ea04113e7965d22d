use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

/// One ranked participant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    pub id: usize,

    /// Ground-truth skill, drawn once and only read by the outcome model
    pub true_skill: f64,
    /// Estimated log-strength maintained by the Bradley-Terry layer
    pub latent_strength: f64,
    /// Visible score, never negative
    pub trophy_score: f64,

    /// Session statistics
    pub games_played: usize,
    pub wins: usize,
    pub losses: usize,
}

impl Participant {
    pub fn new(id: usize, true_skill: f64) -> Self {
        Self {
            id,
            true_skill,
            latent_strength: 0.0,
            trophy_score: 0.0,
            games_played: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// Book one finished match
    pub fn record_result(&mut self, won: bool) {
        self.games_played += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }
}

/// Outcome of one processed round. Handed back to the caller, not retained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub round: u64,
    /// Participant picked uniformly at random
    pub first: usize,
    /// Opponent chosen by the matchmaker
    pub second: usize,
    /// Whether `first` won
    pub first_won: bool,
    /// Ground-truth win probability of `first`
    pub true_win_probability: f64,
    /// Win probability of `first` under the estimator, before the update
    pub estimated_win_probability: f64,
    /// Latent strength moved from loser to winner
    pub strength_delta: f64,
}

impl MatchRecord {
    pub fn winner(&self) -> usize {
        if self.first_won {
            self.first
        } else {
            self.second
        }
    }

    pub fn loser(&self) -> usize {
        if self.first_won {
            self.second
        } else {
            self.first
        }
    }
}

/// Simulation configuration parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Population size N
    pub population: usize,
    /// Total rounds = population * rounds_per_participant
    pub rounds_per_participant: u64,

    /// Bradley-Terry gradient step (K)
    pub step_size: f64,
    /// Logistic coefficient for ground-truth outcomes
    pub tightness: f64,
    /// Gaussian kernel bandwidth for opponent selection, in latent-strength units
    pub sigma: f64,

    /// Trophies gained on a win at full scale
    pub win_gain: f64,
    /// Trophies lost on a loss at full scale
    pub loss_penalty: f64,
    /// Target display distribution
    pub target_mean: f64,
    pub target_std: f64,
    /// Width of the approach zone below target
    pub fade_width: f64,

    /// Random seed
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population: 100,
            rounds_per_participant: 100,
            step_size: 0.05,
            tightness: 2.0,
            sigma: 0.4,
            win_gain: 35.0,
            loss_penalty: 25.0,
            target_mean: 1500.0,
            target_std: 430.0,
            fade_width: 300.0,
            seed: 48,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Saturates instead of wrapping; `validate` rejects the overflowing case
    pub fn total_rounds(&self) -> u64 {
        (self.population as u64).saturating_mul(self.rounds_per_participant)
    }

    /// Reject configurations under which no meaningful match can be formed
    pub fn validate(&self) -> Result<()> {
        if self.population < 2 {
            return Err(SimError::invalid_config(format!(
                "population must be at least 2, got {}",
                self.population
            )));
        }
        if (self.population as u64).checked_mul(self.rounds_per_participant).is_none() {
            return Err(SimError::invalid_config("population * rounds_per_participant overflows"));
        }

        let positive = [
            ("step_size", self.step_size),
            ("tightness", self.tightness),
            ("sigma", self.sigma),
            ("target_std", self.target_std),
            ("fade_width", self.fade_width),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("win_gain", self.win_gain),
            ("loss_penalty", self.loss_penalty),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::invalid_config(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }

        if !self.target_mean.is_finite() {
            return Err(SimError::invalid_config("target_mean must be finite"));
        }

        Ok(())
    }
}

/// Running statistics for analysis
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub rounds_played: u64,
    pub total_rounds: u64,

    /// Matches won by the participant with the lower true skill
    pub upset_count: usize,
    pub upset_rate: f64,

    /// Mean |p_est - 0.5| of the pairings the matchmaker produced
    pub avg_estimated_imbalance: f64,
    /// Mean |p_true - 0.5| of the same pairings
    pub avg_true_imbalance: f64,
    /// Mean |delta| applied to latent strengths
    pub avg_strength_delta: f64,

    /// Latest trophy spread
    pub trophy_mean: f64,
    pub trophy_max: f64,
    pub participants_at_zero: usize,
}

/// Final per-participant record handed to the output layer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: usize,
    pub true_skill: f64,
    pub latent_strength: f64,
    pub trophy_score: f64,
    pub games_played: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    /// Trophy percentile in [0, 100], tied scores share a value
    pub trophy_percentile: f64,
}
