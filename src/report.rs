use crate::stats::{average_ranks, mean, quantile_sorted, spearman, std_dev};
use crate::types::{Participant, ParticipantRecord};
use serde::{Deserialize, Serialize};

/// Percentile in [0, 100] for each value. Tied values share the midpoint percentile.
pub fn percentiles_with_ties(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    average_ranks(values)
        .into_iter()
        .map(|rank| 100.0 * (rank - 0.5) / n)
        .collect()
}

/// Per-participant records in index order
pub fn build_records(participants: &[Participant]) -> Vec<ParticipantRecord> {
    let trophies: Vec<f64> = participants.iter().map(|p| p.trophy_score).collect();
    let percentiles = percentiles_with_ties(&trophies);

    participants
        .iter()
        .zip(percentiles)
        .map(|(p, trophy_percentile)| ParticipantRecord {
            id: p.id,
            true_skill: p.true_skill,
            latent_strength: p.latent_strength,
            trophy_score: p.trophy_score,
            games_played: p.games_played,
            wins: p.wins,
            losses: p.losses,
            win_rate: p.win_rate(),
            trophy_percentile,
        })
        .collect()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

impl DistributionSummary {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Self {
            count: sorted.len(),
            mean: mean(&sorted),
            median: quantile_sorted(&sorted, 0.5),
            std: std_dev(&sorted),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q25: quantile_sorted(&sorted, 0.25),
            q75: quantile_sorted(&sorted, 0.75),
        }
    }
}

/// Head counts in the usual percentile bands
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PercentileBands {
    pub top_10: usize,
    pub top_25: usize,
    pub bottom_25: usize,
    pub bottom_10: usize,
}

/// Distinct values shared by more than one participant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TieGroup {
    pub percentile: f64,
    pub count: usize,
}

/// Whole-population view of a ranking snapshot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RankingSummary {
    pub trophies: DistributionSummary,
    pub latent_strengths: DistributionSummary,
    pub bands: PercentileBands,
    pub tie_groups: Vec<TieGroup>,
    /// How well the estimate recovers the hidden order
    pub skill_strength_rank_correlation: f64,
    /// How well the visible layer follows the estimate
    pub strength_trophy_rank_correlation: f64,
    pub avg_games_played: f64,
}

impl RankingSummary {
    pub fn from_records(records: &[ParticipantRecord]) -> Self {
        let trophies: Vec<f64> = records.iter().map(|r| r.trophy_score).collect();
        let strengths: Vec<f64> = records.iter().map(|r| r.latent_strength).collect();
        let skills: Vec<f64> = records.iter().map(|r| r.true_skill).collect();
        let games: Vec<f64> = records.iter().map(|r| r.games_played as f64).collect();

        let mut bands = PercentileBands::default();
        for r in records {
            if r.trophy_percentile >= 90.0 {
                bands.top_10 += 1;
            }
            if r.trophy_percentile >= 75.0 {
                bands.top_25 += 1;
            }
            if r.trophy_percentile <= 25.0 {
                bands.bottom_25 += 1;
            }
            if r.trophy_percentile <= 10.0 {
                bands.bottom_10 += 1;
            }
        }

        Self {
            trophies: DistributionSummary::from_values(&trophies),
            latent_strengths: DistributionSummary::from_values(&strengths),
            bands,
            tie_groups: tie_groups(records),
            skill_strength_rank_correlation: spearman(&skills, &strengths),
            strength_trophy_rank_correlation: spearman(&strengths, &trophies),
            avg_games_played: mean(&games),
        }
    }
}

fn tie_groups(records: &[ParticipantRecord]) -> Vec<TieGroup> {
    let mut percentiles: Vec<f64> = records.iter().map(|r| r.trophy_percentile).collect();
    percentiles.sort_by(|a, b| a.total_cmp(b));

    let mut groups: Vec<TieGroup> = Vec::new();
    for p in percentiles {
        match groups.last_mut() {
            Some(last) if last.percentile == p => last.count += 1,
            _ => groups.push(TieGroup {
                percentile: p,
                count: 1,
            }),
        }
    }
    groups.retain(|g| g.count > 1);
    groups
}

/// Equal-width histogram of trophy scores: (bin_start, bin_end, count)
pub fn trophy_histogram(
    records: &[ParticipantRecord],
    num_bins: usize,
) -> Vec<(f64, f64, usize)> {
    if records.is_empty() || num_bins == 0 {
        return Vec::new();
    }

    let max_trophy = records.iter().map(|r| r.trophy_score).fold(0.0_f64, f64::max);
    let bin_width = (max_trophy / num_bins as f64).max(1.0);

    let mut bins = vec![0usize; num_bins];
    for r in records {
        let bin = ((r.trophy_score / bin_width) as usize).min(num_bins - 1);
        bins[bin] += 1;
    }

    bins.iter()
        .enumerate()
        .map(|(i, &count)| (i as f64 * bin_width, (i + 1) as f64 * bin_width, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: usize, skill: f64, strength: f64, trophy: f64) -> Participant {
        Participant {
            id,
            true_skill: skill,
            latent_strength: strength,
            trophy_score: trophy,
            games_played: 4,
            wins: 2,
            losses: 2,
        }
    }

    #[test]
    fn test_percentiles_share_ties() {
        let p = percentiles_with_ties(&[100.0, 300.0, 200.0, 200.0]);
        assert_eq!(p, vec![12.5, 87.5, 50.0, 50.0]);
    }

    #[test]
    fn test_build_records_carries_counts() {
        let participants = vec![
            participant(0, 1.0, 0.5, 900.0),
            participant(1, -1.0, -0.5, 100.0),
        ];
        let records = build_records(&participants);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].wins + records[0].losses, records[0].games_played);
        assert_eq!(records[0].win_rate, 0.5);
        assert!(records[0].trophy_percentile > records[1].trophy_percentile);
    }

    #[test]
    fn test_summary_on_ordered_population() {
        let participants: Vec<Participant> = (0..20)
            .map(|i| {
                let x = i as f64;
                participant(i, x, x * 0.1, x * 100.0)
            })
            .collect();
        let summary = RankingSummary::from_records(&build_records(&participants));

        assert_eq!(summary.trophies.count, 20);
        assert_eq!(summary.trophies.min, 0.0);
        assert_eq!(summary.trophies.max, 1900.0);
        assert!((summary.trophies.median - 950.0).abs() < 1e-9);
        assert!((summary.skill_strength_rank_correlation - 1.0).abs() < 1e-12);
        assert!((summary.strength_trophy_rank_correlation - 1.0).abs() < 1e-12);
        assert_eq!(summary.bands.top_10, 2);
        assert_eq!(summary.bands.bottom_10, 2);
        assert_eq!(summary.bands.top_25, 5);
        assert_eq!(summary.bands.bottom_25, 5);
        assert!(summary.tie_groups.is_empty());
        assert_eq!(summary.avg_games_played, 4.0);
    }

    #[test]
    fn test_tie_groups_reported() {
        let participants = vec![
            participant(0, 0.0, 0.0, 0.0),
            participant(1, 0.0, 0.0, 0.0),
            participant(2, 0.0, 0.0, 0.0),
            participant(3, 0.0, 0.0, 50.0),
        ];
        let summary = RankingSummary::from_records(&build_records(&participants));
        assert_eq!(summary.tie_groups.len(), 1);
        assert_eq!(summary.tie_groups[0].count, 3);
        assert_eq!(summary.tie_groups[0].percentile, 37.5);
    }

    #[test]
    fn test_histogram_counts_everyone() {
        let participants: Vec<Participant> =
            (0..10).map(|i| participant(i, 0.0, 0.0, i as f64 * 50.0)).collect();
        let bins = trophy_histogram(&build_records(&participants), 3);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 10);
        assert!(trophy_histogram(&[], 3).is_empty());
    }
}
