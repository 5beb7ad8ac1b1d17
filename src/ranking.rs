use crate::domain::Model;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Model id -> 1-based leaderboard position.
pub type RankMap = HashMap<String, usize>;

/// Descending order on performance. NaN sorts after every number and
/// compares equal to other NaNs, so the ordering stays total.
pub fn compare_performance(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Sorts `models` by performance (stable, ties keep input order), assigns
/// `rank = position + 1` and `rank_change = old - new` against `previous`.
///
/// Returns the ranked list together with the rank map to diff against
/// next time. A duplicated id keeps its best position in the map.
pub fn rank_models(previous: &RankMap, mut models: Vec<Model>) -> (Vec<Model>, RankMap) {
    models.sort_by(|a, b| compare_performance(a.performance, b.performance));

    let mut current = RankMap::with_capacity(models.len());
    for (position, model) in models.iter_mut().enumerate() {
        let rank = position + 1;
        model.rank = rank;
        model.rank_change = previous
            .get(&model.id)
            .map(|old| *old as i64 - rank as i64)
            .unwrap_or(0);
        current.entry(model.id.clone()).or_insert(rank);
    }

    (models, current)
}

/// Holds the previous refresh's ranks between models refreshes.
#[derive(Clone, Debug, Default)]
pub struct RankTracker {
    previous: RankMap,
}

impl RankTracker {
    pub fn apply(&mut self, models: Vec<Model>) -> Vec<Model> {
        let (ranked, current) = rank_models(&self.previous, models);
        self.previous = current;
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}
