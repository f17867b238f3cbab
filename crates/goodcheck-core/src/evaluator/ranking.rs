//! Score grouping for the final report

use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::StrategyResult;

/// Strategies sharing one score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreGroup {
    /// Minimum `OK` count shared by the group
    pub score: u32,
    /// Results in strategy index order
    pub results: Vec<StrategyResult>,
}

/// Scored strategies grouped by score, best first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    groups: Vec<ScoreGroup>,
}

impl Ranking {
    /// Group results by score
    pub fn new(results: &[StrategyResult]) -> Self {
        let mut by_score: BTreeMap<Reverse<u32>, Vec<StrategyResult>> = BTreeMap::new();
        for result in results {
            by_score
                .entry(Reverse(result.score))
                .or_default()
                .push(result.clone());
        }

        let groups = by_score
            .into_iter()
            .map(|(Reverse(score), mut results)| {
                results.sort_by_key(|r| r.strategy.index);
                ScoreGroup { score, results }
            })
            .collect();

        Self { groups }
    }

    /// Groups in descending score order
    pub fn groups(&self) -> &[ScoreGroup] {
        &self.groups
    }

    /// The best-scoring group, if anything was scored
    pub fn winners(&self) -> Option<&ScoreGroup> {
        self.groups.first()
    }

    /// Every result, best score first
    pub fn iter(&self) -> impl Iterator<Item = &StrategyResult> {
        self.groups.iter().flat_map(|g| g.results.iter())
    }

    /// Whether nothing was scored
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
