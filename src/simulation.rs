use crate::bradley_terry::BradleyTerryEstimator;
use crate::error::{Result, SimError};
use crate::matchmaker::Matchmaker;
use crate::outcome::OutcomeModel;
use crate::report::{build_records, RankingSummary};
use crate::trophy::TrophyProjector;
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Main simulation state and controller
pub struct Simulation {
    /// Rounds processed so far
    pub current_round: u64,
    /// All participants, indexed by id
    pub participants: Vec<Participant>,
    /// Simulation configuration
    pub config: SimulationConfig,
    /// Running statistics
    pub stats: SimulationStats,
    estimator: BradleyTerryEstimator,
    matchmaker: Matchmaker,
    outcome_model: OutcomeModel,
    projector: TrophyProjector,
    /// Seeded once in `new`, shared by every sampling call
    rng: StdRng,
    /// Accumulators behind the averaged stats
    estimated_imbalance_sum: f64,
    true_imbalance_sum: f64,
    strength_delta_sum: f64,
    /// Set when a round fails part-way; the run cannot continue after that
    aborted: bool,
}

impl Simulation {
    /// Validate the config and draw a population with standard-normal hidden skills
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let skills: Vec<f64> = (0..config.population)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Ok(Self::build(config, skills, rng))
    }

    /// Same as `new` but with caller-chosen hidden skills; `population` follows `skills`
    pub fn with_true_skills(mut config: SimulationConfig, skills: Vec<f64>) -> Result<Self> {
        config.population = skills.len();
        config.validate()?;
        if let Some((idx, skill)) = skills.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(SimError::invalid_config(format!(
                "true skill of participant {} must be finite, got {}",
                idx, skill
            )));
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self::build(config, skills, rng))
    }

    fn build(config: SimulationConfig, skills: Vec<f64>, rng: StdRng) -> Self {
        let participants: Vec<Participant> = skills
            .into_iter()
            .enumerate()
            .map(|(id, skill)| Participant::new(id, skill))
            .collect();

        log::info!(
            "simulation ready: {} participants, {} rounds, seed {}",
            participants.len(),
            config.total_rounds(),
            config.seed
        );

        Self {
            current_round: 0,
            estimator: BradleyTerryEstimator::new(participants.len()),
            matchmaker: Matchmaker::new(config.sigma),
            outcome_model: OutcomeModel::new(config.tightness),
            projector: TrophyProjector::from_config(&config),
            participants,
            stats: SimulationStats {
                total_rounds: config.total_rounds(),
                ..SimulationStats::default()
            },
            config,
            rng,
            estimated_imbalance_sum: 0.0,
            true_imbalance_sum: 0.0,
            strength_delta_sum: 0.0,
            aborted: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.current_round >= self.config.total_rounds()
    }

    /// A round failed part-way and the estimator may be ahead of the bookkeeping
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Process one match. Returns `None` once the configured rounds are used up.
    /// An error aborts the run: every later call fails too.
    pub fn play_round(&mut self) -> Result<Option<MatchRecord>> {
        if self.aborted {
            return Err(SimError::numerical(format!(
                "simulation aborted in round {}",
                self.current_round
            )));
        }
        if self.is_finished() {
            return Ok(None);
        }

        match self.advance() {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                log::warn!("round {} failed, aborting: {}", self.current_round, e);
                self.aborted = true;
                Err(e)
            }
        }
    }

    /// One full round. Participants are only booked once every fallible step has passed.
    fn advance(&mut self) -> Result<MatchRecord> {
        // 1. Pick a participant and find them an opponent
        let n = self.participants.len();
        let first = self.rng.gen_range(0..n);
        let second = self
            .matchmaker
            .choose_opponent(first, self.estimator.strengths(), &mut self.rng)?;

        // 2. Ground-truth outcome
        let skill_first = self.participants[first].true_skill;
        let skill_second = self.participants[second].true_skill;
        let true_win_probability = self.outcome_model.win_probability(skill_first, skill_second);
        let first_won = self
            .outcome_model
            .sample_outcome(skill_first, skill_second, &mut self.rng);
        let estimated_win_probability = self.estimator.expected_score(first, second);

        // 3. Hidden layer
        let (winner, loser) = if first_won { (first, second) } else { (second, first) };
        let strength_delta = self.estimator.update(winner, loser, self.config.step_size)?;

        // 4. Visible layer, against targets from the just-updated strengths
        let targets = self.projector.compute_targets(self.estimator.strengths())?;

        self.participants[winner].latent_strength = self.estimator.strength(winner);
        self.participants[loser].latent_strength = self.estimator.strength(loser);
        for (idx, won) in [(first, first_won), (second, !first_won)] {
            let participant = &mut self.participants[idx];
            participant.record_result(won);
            participant.trophy_score =
                self.projector.step(participant.trophy_score, targets[idx], won);
        }

        let record = MatchRecord {
            round: self.current_round,
            first,
            second,
            first_won,
            true_win_probability,
            estimated_win_probability,
            strength_delta,
        };

        log::trace!(
            "round {}: {} vs {} -> winner {} (p_true={:.3}, p_est={:.3}, delta={:.4})",
            record.round,
            first,
            second,
            record.winner(),
            true_win_probability,
            estimated_win_probability,
            strength_delta
        );

        self.current_round += 1;
        self.update_stats(&record);

        Ok(record)
    }

    /// Run up to `rounds` more rounds; returns how many were actually played
    pub fn run(&mut self, rounds: u64) -> Result<u64> {
        let mut played = 0;
        while played < rounds && self.play_round()?.is_some() {
            played += 1;
        }
        log::debug!(
            "played {} rounds ({}/{})",
            played,
            self.current_round,
            self.config.total_rounds()
        );
        Ok(played)
    }

    /// Run every remaining round
    pub fn run_to_completion(&mut self) -> Result<u64> {
        let remaining = self.config.total_rounds().saturating_sub(self.current_round);
        let played = self.run(remaining)?;
        log::info!(
            "simulation finished after {} rounds, upset rate {:.3}",
            self.current_round,
            self.stats.upset_rate
        );
        Ok(played)
    }

    pub fn latent_strengths(&self) -> &[f64] {
        self.estimator.strengths()
    }

    /// Current target trophies, recomputed from the live strengths
    pub fn targets(&self) -> Result<Vec<f64>> {
        self.projector.compute_targets(self.estimator.strengths())
    }

    fn update_stats(&mut self, record: &MatchRecord) {
        self.stats.rounds_played = self.current_round;

        let winner_skill = self.participants[record.winner()].true_skill;
        let loser_skill = self.participants[record.loser()].true_skill;
        if winner_skill < loser_skill {
            self.stats.upset_count += 1;
        }

        self.estimated_imbalance_sum += (record.estimated_win_probability - 0.5).abs();
        self.true_imbalance_sum += (record.true_win_probability - 0.5).abs();
        self.strength_delta_sum += record.strength_delta.abs();

        let rounds = self.current_round as f64;
        self.stats.upset_rate = self.stats.upset_count as f64 / rounds;
        self.stats.avg_estimated_imbalance = self.estimated_imbalance_sum / rounds;
        self.stats.avg_true_imbalance = self.true_imbalance_sum / rounds;
        self.stats.avg_strength_delta = self.strength_delta_sum / rounds;

        let n = self.participants.len() as f64;
        self.stats.trophy_mean = self.participants.iter().map(|p| p.trophy_score).sum::<f64>() / n;
        self.stats.trophy_max = self
            .participants
            .iter()
            .map(|p| p.trophy_score)
            .fold(0.0_f64, f64::max);
        self.stats.participants_at_zero = self
            .participants
            .iter()
            .filter(|p| p.trophy_score == 0.0)
            .count();
    }

    /// In-memory snapshot for the output layer
    pub fn snapshot(&self) -> Vec<ParticipantRecord> {
        build_records(&self.participants)
    }

    pub fn summary(&self) -> RankingSummary {
        RankingSummary::from_records(&self.snapshot())
    }

    /// Get current state as JSON for frontend
    pub fn get_state_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&SimulationState {
            current_round: self.current_round,
            total_rounds: self.config.total_rounds(),
            finished: self.is_finished(),
            stats: self.stats.clone(),
            config: self.config.clone(),
        })?)
    }
}

#[derive(Serialize, Deserialize)]
pub struct SimulationState {
    pub current_round: u64,
    pub total_rounds: u64,
    pub finished: bool,
    pub stats: SimulationStats,
    pub config: SimulationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_simulation(population: usize, rounds_per_participant: u64) -> Simulation {
        let config = SimulationConfig {
            population,
            rounds_per_participant,
            ..SimulationConfig::default()
        };
        Simulation::new(config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            population: 1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_rejects_non_finite_true_skills() {
        for skills in [vec![f64::NAN, 0.0], vec![0.5, f64::INFINITY, -0.5]] {
            assert!(matches!(
                Simulation::with_true_skills(SimulationConfig::default(), skills),
                Err(SimError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_initial_state() {
        let sim = create_test_simulation(30, 10);
        assert_eq!(sim.participants.len(), 30);
        assert!(sim.participants.iter().all(|p| p.latent_strength == 0.0));
        assert!(sim.participants.iter().all(|p| p.trophy_score == 0.0));
        assert!(sim.participants.iter().all(|p| p.games_played == 0));
        assert!(!sim.is_finished());
    }

    #[test]
    fn test_each_round_is_zero_sum_and_non_negative() {
        let mut sim = create_test_simulation(25, 40);
        while !sim.is_finished() {
            let before: Vec<f64> = sim.latent_strengths().to_vec();
            let record = sim.play_round().unwrap().unwrap();
            let after = sim.latent_strengths();

            assert_ne!(record.first, record.second);
            let gain = after[record.winner()] - before[record.winner()];
            let loss = before[record.loser()] - after[record.loser()];
            assert!((gain - loss).abs() < 1e-12);
            assert!((gain - record.strength_delta).abs() < 1e-12);

            assert!(sim.participants.iter().all(|p| p.trophy_score >= 0.0));
        }
        let total: f64 = sim.latent_strengths().iter().sum();
        assert!(total.abs() < 1e-9);
    }

    #[test]
    fn test_trophies_step_towards_targets_of_updated_strengths() {
        let mut sim = create_test_simulation(12, 20);
        while !sim.is_finished() {
            let before: Vec<f64> = sim.participants.iter().map(|p| p.trophy_score).collect();
            let record = sim.play_round().unwrap().unwrap();

            let targets = sim.projector.compute_targets(sim.latent_strengths()).unwrap();
            assert_eq!(targets, sim.targets().unwrap());
            let sides = [
                (record.first, record.first_won),
                (record.second, !record.first_won),
            ];
            for (idx, won) in sides {
                let expected = sim.projector.step(before[idx], targets[idx], won);
                assert_eq!(sim.participants[idx].trophy_score, expected);
            }
            for p in &sim.participants {
                if p.id != record.first && p.id != record.second {
                    assert_eq!(p.trophy_score, before[p.id]);
                }
            }
        }
    }

    #[test]
    fn test_failed_round_books_nothing_and_aborts() {
        let mut sim = create_test_simulation(6, 10);
        sim.run(5).unwrap();
        let snapshot_before = sim.snapshot();
        let rounds_before = sim.stats.rounds_played;

        sim.config.step_size = f64::INFINITY;
        let err = sim.play_round().unwrap_err();
        assert!(matches!(err, SimError::NumericalInstability { .. }));
        assert!(sim.is_aborted());

        assert_eq!(sim.current_round, 5);
        assert_eq!(sim.stats.rounds_played, rounds_before);
        for (p, before) in sim.participants.iter().zip(&snapshot_before) {
            assert_eq!(p.games_played, before.games_played);
            assert_eq!(p.wins, before.wins);
            assert_eq!(p.trophy_score, before.trophy_score);
            assert_eq!(p.latent_strength, before.latent_strength);
        }

        sim.config.step_size = 0.05;
        assert!(sim.play_round().is_err());
        assert!(sim.run(3).is_err());
    }

    #[test]
    fn test_bookkeeping_matches_rounds() {
        let mut sim = create_test_simulation(20, 15);
        let played = sim.run_to_completion().unwrap();
        assert_eq!(played, 300);
        assert_eq!(sim.stats.rounds_played, 300);

        let games: usize = sim.participants.iter().map(|p| p.games_played).sum();
        let wins: usize = sim.participants.iter().map(|p| p.wins).sum();
        let losses: usize = sim.participants.iter().map(|p| p.losses).sum();
        assert_eq!(games, 600);
        assert_eq!(wins, 300);
        assert_eq!(losses, 300);
        for p in &sim.participants {
            assert_eq!(p.wins + p.losses, p.games_played);
            assert_eq!(p.latent_strength, sim.latent_strengths()[p.id]);
        }
    }

    #[test]
    fn test_terminates_after_configured_rounds() {
        let mut sim = create_test_simulation(4, 5);
        assert_eq!(sim.run(1_000).unwrap(), 20);
        assert!(sim.is_finished());
        assert!(sim.play_round().unwrap().is_none());
        assert_eq!(sim.run(10).unwrap(), 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let mut a = create_test_simulation(40, 20);
        let mut b = create_test_simulation(40, 20);
        a.run_to_completion().unwrap();
        b.run_to_completion().unwrap();
        for (x, y) in a.snapshot().iter().zip(b.snapshot().iter()) {
            assert_eq!(x.true_skill, y.true_skill);
            assert_eq!(x.latent_strength, y.latent_strength);
            assert_eq!(x.trophy_score, y.trophy_score);
            assert_eq!(x.games_played, y.games_played);
        }
    }

    #[test]
    fn test_different_seed_different_population() {
        let a = create_test_simulation(10, 1);
        let b = Simulation::new(SimulationConfig {
            population: 10,
            rounds_per_participant: 1,
            seed: 49,
            ..SimulationConfig::default()
        })
        .unwrap();
        assert_ne!(a.participants[0].true_skill, b.participants[0].true_skill);
    }

    #[test]
    fn test_two_player_scenario_favours_stronger() {
        let config = SimulationConfig {
            rounds_per_participant: 500,
            tightness: 2.0,
            seed: 1234,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::with_true_skills(config, vec![1.0, -1.0]).unwrap();
        assert_eq!(sim.run_to_completion().unwrap(), 1_000);

        let strong = &sim.participants[0];
        let weak = &sim.participants[1];
        assert!(strong.latent_strength > weak.latent_strength);
        assert!(strong.trophy_score > weak.trophy_score);
        assert_eq!(strong.games_played, 1_000);
        assert_eq!(weak.games_played, 1_000);
    }

    #[test]
    fn test_two_separated_players_with_tiny_sigma_still_match() {
        let config = SimulationConfig {
            rounds_per_participant: 100,
            sigma: 1e-9,
            step_size: 1.0,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::with_true_skills(config, vec![3.0, -3.0]).unwrap();
        sim.run_to_completion().unwrap();
        assert!(sim.latent_strengths()[0] > sim.latent_strengths()[1]);
        assert_eq!(sim.participants[0].games_played, 200);
    }

    #[test]
    fn test_default_population_recovers_hidden_order() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.run_to_completion().unwrap();

        let summary = sim.summary();
        assert!(
            summary.skill_strength_rank_correlation > 0.5,
            "correlation {}",
            summary.skill_strength_rank_correlation
        );
        assert!(summary.strength_trophy_rank_correlation > 0.4);
        assert!(summary.trophies.min >= 0.0);
        assert!(sim.stats.avg_estimated_imbalance < 0.2);
    }

    #[test]
    fn test_state_json_round_trips_config() {
        let mut sim = create_test_simulation(6, 2);
        sim.run(3).unwrap();
        let json = sim.get_state_json().unwrap();
        let state: SimulationState = serde_json::from_str(&json).unwrap();
        assert_eq!(state.current_round, 3);
        assert_eq!(state.total_rounds, 12);
        assert!(!state.finished);
        assert_eq!(state.config.population, 6);
    }
}
