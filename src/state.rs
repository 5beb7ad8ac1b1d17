use crate::domain::{Category, Model, NewsItem, SocialPost, SystemStatus};
use crate::format::parse_timestamp;
use crate::ranking::RankTracker;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedState = Arc<RwLock<DashboardState>>;

/// Independently refreshed slices of the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    Models,
    Status,
    News,
    Social,
    Detail,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct FeedStamp {
    pub seq: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// In-memory snapshot for the current session.
///
/// Every `apply_*` takes the cycle sequence that produced the data and is a
/// no-op when a newer cycle has already been applied for that feed.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardState {
    pub models: Vec<Model>,
    pub status: Option<SystemStatus>,
    pub news: BTreeMap<Category, Vec<NewsItem>>,
    pub social: BTreeMap<Category, Vec<SocialPost>>,
    pub detail: Option<Model>,
    pub feeds: HashMap<Feed, FeedStamp>,
    #[serde(skip)]
    ranks: RankTracker,
    #[serde(skip)]
    detail_generation: u64,
}

pub fn new_shared() -> SharedState {
    Arc::new(RwLock::new(DashboardState::default()))
}

impl DashboardState {
    fn accept(&mut self, feed: Feed, seq: u64, now: DateTime<Utc>) -> bool {
        let stamp = self.feeds.entry(feed).or_default();
        if stamp.updated_at.is_some() && seq <= stamp.seq {
            return false;
        }
        stamp.seq = seq;
        stamp.updated_at = Some(now);
        true
    }

    /// `None` means the fetch failed: the leaderboard empties until the
    /// next tick, but ranks are kept for the next successful diff.
    pub fn apply_models(&mut self, seq: u64, models: Option<Vec<Model>>, now: DateTime<Utc>) -> bool {
        if !self.accept(Feed::Models, seq, now) {
            return false;
        }
        self.models = match models {
            Some(models) => self.ranks.apply(models),
            None => Vec::new(),
        };
        if let Some(detail) = self.detail.as_mut() {
            if let Some(listed) = self.models.iter().find(|m| m.id == detail.id) {
                detail.rank = listed.rank;
                detail.rank_change = listed.rank_change;
                detail.status = listed.status.clone();
            }
        }
        true
    }

    pub fn apply_status(&mut self, seq: u64, status: Option<SystemStatus>, now: DateTime<Utc>) -> bool {
        if !self.accept(Feed::Status, seq, now) {
            return false;
        }
        self.status = status;
        true
    }

    pub fn apply_news(
        &mut self,
        seq: u64,
        news: BTreeMap<Category, Vec<NewsItem>>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.accept(Feed::News, seq, now) {
            return false;
        }
        self.news = news;
        true
    }

    pub fn apply_social(
        &mut self,
        seq: u64,
        social: BTreeMap<Category, Vec<SocialPost>>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.accept(Feed::Social, seq, now) {
            return false;
        }
        self.social = social;
        true
    }

    /// Starts a detail load and returns its sequence. Only the most recent
    /// load may apply.
    pub fn begin_detail(&mut self) -> u64 {
        self.detail_generation += 1;
        self.detail_generation
    }

    pub fn apply_detail(&mut self, seq: u64, detail: Model, now: DateTime<Utc>) -> bool {
        if seq != self.detail_generation || !self.accept(Feed::Detail, seq, now) {
            return false;
        }
        self.detail = Some(detail);
        true
    }

    /// Closing the detail view also invalidates loads still in flight.
    pub fn clear_detail(&mut self) {
        self.detail_generation += 1;
        self.detail = None;
    }

    pub fn last_updated(&self, feed: Feed) -> Option<DateTime<Utc>> {
        self.feeds.get(&feed).and_then(|s| s.updated_at)
    }

    /// Ranked models, optionally restricted to one category.
    pub fn models_in(&self, category: Option<&Category>) -> Vec<&Model> {
        self.models
            .iter()
            .filter(|m| category.is_none_or(|c| &m.category == c))
            .collect()
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// News newest first; undated items go last.
    pub fn news_in(&self, category: Option<&Category>) -> Vec<&NewsItem> {
        let mut items: Vec<&NewsItem> = match category {
            Some(c) => self.news.get(c).map(|v| v.iter().collect()).unwrap_or_default(),
            None => self.news.values().flatten().collect(),
        };
        items.sort_by_cached_key(|item| std::cmp::Reverse(parse_timestamp(&item.date)));
        items
    }

    /// Social posts newest first; undated posts go last.
    pub fn social_in(&self, category: Option<&Category>) -> Vec<&SocialPost> {
        let mut posts: Vec<&SocialPost> = match category {
            Some(c) => self.social.get(c).map(|v| v.iter().collect()).unwrap_or_default(),
            None => self.social.values().flatten().collect(),
        };
        posts.sort_by_cached_key(|post| std::cmp::Reverse(parse_timestamp(post.posted_at())));
        posts
    }

    /// True once a models snapshot has been ranked, so the next one has
    /// something to diff against.
    pub fn has_rank_baseline(&self) -> bool {
        !self.ranks.is_empty()
    }

    pub fn active_model_count(&self) -> usize {
        self.models.iter().filter(|m| m.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn model(id: &str, category: Category, performance: f64) -> Model {
        Model {
            id: id.to_string(),
            category,
            performance,
            status: "active".to_string(),
            ..Model::default()
        }
    }

    fn news(id: &str, date: &str) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            date: date.to_string(),
            ..NewsItem::default()
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_stale_models_result_is_rejected() {
        let mut state = DashboardState::default();
        assert!(state.apply_models(2, Some(vec![model("new", Category::Stock, 1.0)]), at(10)));
        assert!(!state.apply_models(1, Some(vec![model("old", Category::Stock, 1.0)]), at(20)));
        assert_eq!(state.models[0].id, "new");
        assert_eq!(state.last_updated(Feed::Models), Some(at(10)));

        // Same sequence twice is also stale.
        assert!(!state.apply_models(2, Some(Vec::new()), at(30)));
        assert_eq!(state.models.len(), 1);
    }

    #[test]
    fn test_first_cycle_with_sequence_zero_is_accepted() {
        let mut state = DashboardState::default();
        assert!(state.apply_status(0, Some(SystemStatus::default()), at(0)));
        assert!(state.status.is_some());
    }

    #[test]
    fn test_failed_models_fetch_keeps_previous_ranks() {
        let mut state = DashboardState::default();
        state.apply_models(1, Some(vec![model("a", Category::Stock, 2.0), model("b", Category::Stock, 1.0)]), at(0));
        state.apply_models(2, None, at(60));
        assert!(state.models.is_empty());
        assert!(state.has_rank_baseline());

        state.apply_models(3, Some(vec![model("a", Category::Stock, 1.0), model("b", Category::Stock, 2.0)]), at(120));
        assert_eq!(state.models[0].id, "b");
        assert_eq!(state.models[0].rank_change, 1);
        assert_eq!(state.models[1].rank_change, -1);
    }

    #[test]
    fn test_models_in_filters_by_category_in_rank_order() {
        let mut state = DashboardState::default();
        state.apply_models(
            1,
            Some(vec![
                model("s1", Category::Stock, 1.0),
                model("f1", Category::Forex, 5.0),
                model("s2", Category::Stock, 3.0),
            ]),
            at(0),
        );

        let stocks: Vec<&str> = state
            .models_in(Some(&Category::Stock))
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(stocks, vec!["s2", "s1"]);
        assert_eq!(state.models_in(None).len(), 3);
        assert!(state.models_in(Some(&Category::Bitmex)).is_empty());
        assert_eq!(state.active_model_count(), 3);
    }

    #[test]
    fn test_news_sorted_newest_first() {
        let mut state = DashboardState::default();
        let mut feeds = BTreeMap::new();
        feeds.insert(
            Category::Stock,
            vec![news("old", "2024-01-01T00:00:00Z"), news("undated", "")],
        );
        feeds.insert(Category::Forex, vec![news("new", "2024-03-01T00:00:00Z")]);
        state.apply_news(1, feeds, at(0));

        let all: Vec<&str> = state.news_in(None).iter().map(|n| n.id.as_str()).collect();
        assert_eq!(all, vec!["new", "old", "undated"]);
        assert_eq!(state.news_in(Some(&Category::Forex)).len(), 1);
        assert!(state.news_in(Some(&Category::Polymarket)).is_empty());
    }

    #[test]
    fn test_detail_follows_leaderboard_rank() {
        let mut state = DashboardState::default();
        state.apply_models(1, Some(vec![model("a", Category::Stock, 1.0)]), at(0));
        let detail = state.models[0].clone();
        let seq = state.begin_detail();
        assert!(state.apply_detail(seq, detail, at(0)));

        state.apply_models(2, Some(vec![model("b", Category::Stock, 5.0), model("a", Category::Stock, 1.0)]), at(60));
        let detail = state.detail.as_ref().unwrap();
        assert_eq!(detail.rank, 2);
        assert_eq!(detail.rank_change, -1);
    }

    #[test]
    fn test_detail_load_finishing_after_close_is_dropped() {
        let mut state = DashboardState::default();
        state.apply_models(1, Some(vec![model("a", Category::Stock, 1.0)]), at(0));
        let detail = state.models[0].clone();

        let seq = state.begin_detail();
        state.clear_detail();
        assert!(!state.apply_detail(seq, detail.clone(), at(5)));
        assert!(state.detail.is_none());

        // An older load cannot replace a newer one either.
        let older = state.begin_detail();
        let newer = state.begin_detail();
        assert!(state.apply_detail(newer, detail.clone(), at(10)));
        assert!(!state.apply_detail(older, detail, at(11)));
        assert_eq!(state.last_updated(Feed::Detail), Some(at(10)));
    }

    #[test]
    fn test_social_sorted_newest_first_with_timestamp_fallback() {
        let post = |id: &str, created_at: Option<&str>, timestamp: &str| SocialPost {
            id: id.to_string(),
            created_at: created_at.map(str::to_string),
            timestamp: timestamp.to_string(),
            ..SocialPost::default()
        };
        let mut state = DashboardState::default();
        let mut feeds = BTreeMap::new();
        feeds.insert(
            Category::Stock,
            vec![
                // created_at wins over an older timestamp
                post("created", Some("2024-03-01T00:00:00Z"), "2023-01-01T00:00:00Z"),
                post("stamped", None, "2024-02-01T00:00:00Z"),
            ],
        );
        feeds.insert(
            Category::Bitmex,
            vec![
                post("blank-created", Some(" "), "2024-04-01T00:00:00Z"),
                post("undated", None, ""),
            ],
        );
        state.apply_social(1, feeds, at(0));

        let all: Vec<&str> = state.social_in(None).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(all, vec!["blank-created", "created", "stamped", "undated"]);
        let stock: Vec<&str> = state
            .social_in(Some(&Category::Stock))
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(stock, vec!["created", "stamped"]);
    }
}
