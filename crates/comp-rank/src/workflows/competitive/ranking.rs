use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use super::allocation::AdjustedWeights;
use super::dataset::Candidate;
use super::variables::VariableKey;

/// Competition ranking over keys where smaller is better.
///
/// Tied keys share the rank of the first member of their group and the next
/// distinct key skips the used positions: `[1.0, 1.0, 13.95, 13.95, 15.95]`
/// ranks as `[1, 1, 3, 3, 5]`. Ties are exact float equality.
pub fn competition_ranks(keys: &[f64]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|left, right| keys[*left].total_cmp(&keys[*right]));

    let mut ranks = vec![0; keys.len()];
    let mut group_rank = 1;
    for (position, &index) in order.iter().enumerate() {
        if position > 0 && keys[order[position - 1]] != keys[index] {
            group_rank = position as u32 + 1;
        }
        ranks[index] = group_rank;
    }
    ranks
}

/// One property's standing on one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableRank {
    Ranked(u32),
    /// Optional value absent; the property takes no part in this variable.
    Excluded,
    /// Core value absent; the property takes the worst rank.
    Penalized(u32),
}

impl VariableRank {
    pub fn value(self) -> Option<u32> {
        match self {
            VariableRank::Ranked(rank) | VariableRank::Penalized(rank) => Some(rank),
            VariableRank::Excluded => None,
        }
    }
}

impl Serialize for VariableRank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value() {
            Some(rank) => serializer.serialize_u32(rank),
            None => serializer.serialize_str("excluded"),
        }
    }
}

/// Ranks one variable across the candidates that carry it.
pub fn rank_variable(key: VariableKey, candidates: &[&Candidate]) -> Vec<VariableRank> {
    let kind = key.kind();
    let projected: Vec<Option<f64>> = candidates
        .iter()
        .map(|candidate| candidate.value(key).and_then(|value| kind.rank_key(value)))
        .collect();

    let present: Vec<f64> = projected.iter().flatten().copied().collect();
    let mut ranks = competition_ranks(&present).into_iter();
    let worst = candidates.len() as u32;

    projected
        .into_iter()
        .map(|projection| match projection.and_then(|_| ranks.next()) {
            Some(rank) => VariableRank::Ranked(rank),
            None if key.is_core() => VariableRank::Penalized(worst),
            None => VariableRank::Excluded,
        })
        .collect()
}

/// Per-variable ranks for every retained candidate, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    columns: BTreeMap<VariableKey, Vec<VariableRank>>,
    rows: usize,
}

impl RankTable {
    pub fn rank(&self, row: usize, key: VariableKey) -> Option<VariableRank> {
        self.columns.get(&key).and_then(|column| column.get(row)).copied()
    }

    pub fn column(&self, key: VariableKey) -> Option<&[VariableRank]> {
        self.columns.get(&key).map(Vec::as_slice)
    }

    /// Ranks of one candidate keyed by variable, in catalog order.
    pub fn row(&self, row: usize) -> BTreeMap<VariableKey, VariableRank> {
        self.columns
            .iter()
            .filter_map(|(key, column)| column.get(row).map(|rank| (*key, *rank)))
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn variables(&self) -> impl Iterator<Item = VariableKey> + '_ {
        self.columns.keys().copied()
    }
}

/// Ranks every variable that survived allocation. Variables outside the
/// adjusted weights are never ranked.
pub fn rank_all(weights: &AdjustedWeights, candidates: &[&Candidate]) -> RankTable {
    let columns = weights
        .keys()
        .map(|key| (key, rank_variable(key, candidates)))
        .collect();

    RankTable {
        columns,
        rows: candidates.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::competitive::dataset::Dataset;
    use crate::workflows::competitive::domain::{OptionalFeatures, Property};

    #[test]
    fn ties_share_the_first_position_of_their_group() {
        assert_eq!(
            competition_ranks(&[1.00, 1.00, 13.95, 13.95, 15.95]),
            vec![1, 1, 3, 3, 5]
        );
        assert_eq!(
            competition_ranks(&[1.00, 1.00, 13.95, 13.95, 15.95, 17.50]),
            vec![1, 1, 3, 3, 5, 6]
        );
    }

    #[test]
    fn ranks_follow_input_order_not_sorted_order() {
        assert_eq!(
            competition_ranks(&[8.50, 10.00, 12.00, 10.00, 15.00]),
            vec![1, 2, 4, 2, 5]
        );
    }

    #[test]
    fn identical_values_all_rank_first() {
        assert_eq!(competition_ranks(&[4.2; 6]), vec![1; 6]);
        assert!(competition_ranks(&[]).is_empty());
    }

    fn property(address: &str, height: Option<f64>, power: Option<f64>) -> Property {
        Property {
            address: address.to_string(),
            distance_km: Some(1.0),
            clear_height_ft: height,
            features: OptionalFeatures {
                power_amps: power,
                ..OptionalFeatures::default()
            },
            ..Property::default()
        }
    }

    #[test]
    fn descending_variables_rank_larger_values_first() {
        let mut subject = property("Subject", Some(28.0), None);
        subject.is_subject = true;
        subject.distance_km = Some(0.0);
        let dataset = Dataset::load(
            subject,
            vec![
                property("Tall", Some(36.0), None),
                property("Same", Some(28.0), None),
                property("Low", Some(20.0), None),
            ],
        )
        .expect("dataset loads");
        let candidates: Vec<&Candidate> = dataset.candidates().iter().collect();

        let ranks = rank_variable(VariableKey::ClearHeightFt, &candidates);

        assert_eq!(
            ranks,
            vec![
                VariableRank::Ranked(2),
                VariableRank::Ranked(1),
                VariableRank::Ranked(2),
                VariableRank::Ranked(4),
            ]
        );
    }

    #[test]
    fn missing_values_are_excluded_or_penalized() {
        let mut subject = property("Subject", Some(28.0), Some(400.0));
        subject.is_subject = true;
        subject.distance_km = Some(0.0);
        let dataset = Dataset::load(
            subject,
            vec![
                property("No height", None, Some(800.0)),
                property("No power", Some(32.0), None),
            ],
        )
        .expect("dataset loads");
        let candidates: Vec<&Candidate> = dataset.candidates().iter().collect();

        let height = rank_variable(VariableKey::ClearHeightFt, &candidates);
        let power = rank_variable(VariableKey::PowerAmps, &candidates);

        assert_eq!(
            height,
            vec![
                VariableRank::Ranked(2),
                VariableRank::Penalized(3),
                VariableRank::Ranked(1),
            ]
        );
        assert_eq!(
            power,
            vec![
                VariableRank::Ranked(2),
                VariableRank::Ranked(1),
                VariableRank::Excluded,
            ]
        );
    }

    #[test]
    fn excluded_ranks_serialize_as_marker() {
        let json = serde_json::to_string(&vec![VariableRank::Ranked(3), VariableRank::Excluded])
            .expect("ranks serialize");
        assert_eq!(json, r#"[3,"excluded"]"#);
    }
}
