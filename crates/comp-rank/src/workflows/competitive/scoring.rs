use std::collections::BTreeMap;

use super::allocation::AdjustedWeights;
use super::ranking::{competition_ranks, RankTable, VariableRank};
use super::variables::VariableKey;

/// A retained candidate with its weighted score and final rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProperty {
    /// Position in the filtered candidate list; 0 is the subject.
    pub row: usize,
    pub score: f64,
    pub final_rank: u32,
    pub ranks: BTreeMap<VariableKey, VariableRank>,
}

/// Sum of `rank * weight` in catalog order. Excluded variables add nothing.
pub fn weighted_score(
    ranks: &BTreeMap<VariableKey, VariableRank>,
    weights: &AdjustedWeights,
) -> f64 {
    weights
        .iter()
        .filter_map(|(key, weight)| {
            let rank = ranks.get(&key).and_then(|rank| rank.value())?;
            Some(f64::from(rank) * weight)
        })
        .sum()
}

/// Scores every row of the rank table and assigns competition final ranks,
/// lower score first.
pub fn score_all(weights: &AdjustedWeights, table: &RankTable) -> Vec<ScoredProperty> {
    let rows: Vec<(BTreeMap<VariableKey, VariableRank>, f64)> = (0..table.rows())
        .map(|row| {
            let ranks = table.row(row);
            let score = weighted_score(&ranks, weights);
            (ranks, score)
        })
        .collect();

    let scores: Vec<f64> = rows.iter().map(|(_, score)| *score).collect();
    let final_ranks = competition_ranks(&scores);

    rows.into_iter()
        .zip(final_ranks)
        .enumerate()
        .map(|(row, ((ranks, score), final_rank))| ScoredProperty {
            row,
            score,
            final_rank,
            ranks,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::competitive::availability::detect;
    use crate::workflows::competitive::dataset::{Candidate, Dataset};
    use crate::workflows::competitive::domain::{BuildingClass, Property};
    use crate::workflows::competitive::personas::WeightProfile;
    use crate::workflows::competitive::ranking::rank_all;
    use crate::workflows::competitive::allocation::allocate;

    fn property(address: &str, rent: f64, height: f64) -> Property {
        Property {
            address: address.to_string(),
            area_sqft: Some(40_000.0),
            building_age: Some(10),
            clear_height_ft: Some(height),
            office_pct: Some(0.1),
            parking_ratio: Some(1.0),
            distance_km: Some(2.0),
            net_rent: Some(rent),
            tmi: Some(3.0),
            building_class: Some(BuildingClass::B),
            ..Property::default()
        }
    }

    fn rent_and_height() -> WeightProfile {
        WeightProfile::new(
            "rent_and_height",
            VariableKey::CORE.into_iter().map(|key| {
                let weight = match key {
                    VariableKey::NetRent => 0.6,
                    VariableKey::ClearHeightFt => 0.4,
                    _ => 0.0,
                };
                (key, weight)
            }),
        )
    }

    fn score(subject: Property, comparables: Vec<Property>) -> Vec<ScoredProperty> {
        let dataset = Dataset::load(subject, comparables).expect("dataset loads");
        let availability = detect(dataset.candidates(), &VariableKey::OPTIONAL, 0.5);
        let weights = allocate(&rent_and_height(), &availability).expect("weights allocate");
        let candidates: Vec<&Candidate> = dataset.candidates().iter().collect();
        let table = rank_all(&weights, &candidates);
        score_all(&weights, &table)
    }

    #[test]
    fn weighted_score_sums_rank_times_weight() {
        let mut subject = property("Subject", 9.0, 28.0);
        subject.is_subject = true;
        subject.distance_km = Some(0.0);

        let scored = score(
            subject,
            vec![property("Cheap", 8.0, 24.0), property("Tall", 11.0, 36.0)],
        );

        // Subject: rent rank 2, height rank 2.
        assert!((scored[0].score - (2.0 * 0.6 + 2.0 * 0.4)).abs() < 1e-12);
        // Cheap: rent 1, height 3. Tall: rent 3, height 1.
        assert!((scored[1].score - (1.0 * 0.6 + 3.0 * 0.4)).abs() < 1e-12);
        assert!((scored[2].score - (3.0 * 0.6 + 1.0 * 0.4)).abs() < 1e-12);
        assert_eq!(
            scored.iter().map(|s| s.final_rank).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn identical_properties_tie_on_final_rank() {
        let mut subject = property("Subject", 9.0, 28.0);
        subject.is_subject = true;
        subject.distance_km = Some(0.0);

        let scored = score(
            subject,
            vec![property("Twin", 9.0, 28.0), property("Pricier", 12.0, 28.0)],
        );

        assert_eq!(scored[0].score, scored[1].score);
        assert_eq!(scored[0].final_rank, 1);
        assert_eq!(scored[1].final_rank, 1);
        assert_eq!(scored[2].final_rank, 3);
    }
}
