use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Asset class partition shared by models, news and social feeds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Stock,
    Polymarket,
    Bitmex,
    Forex,
    Other(String),
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Stock,
        Category::Polymarket,
        Category::Bitmex,
        Category::Forex,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stock => "stock",
            Self::Polymarket => "polymarket",
            Self::Bitmex => "bitmex",
            Self::Forex => "forex",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Stock => "Stocks",
            Self::Polymarket => "Polymarket",
            Self::Bitmex => "BitMEX",
            Self::Forex => "Forex",
            Self::Other(raw) if raw.is_empty() => "Unknown",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "stock" | "stocks" => Self::Stock,
            "polymarket" => Self::Polymarket,
            "bitmex" | "crypto" => Self::Bitmex,
            "forex" | "fx" => Self::Forex,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
pub(crate) fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend ids arrive as strings or integers depending on the endpoint.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(alias = "symbol", deserialize_with = "null_default")]
    pub ticker: String,
    #[serde(alias = "shares", deserialize_with = "null_default")]
    pub quantity: f64,
    #[serde(alias = "avg_cost", deserialize_with = "null_default")]
    pub avg_price: f64,
    #[serde(alias = "price", deserialize_with = "null_default")]
    pub current_price: f64,
    #[serde(alias = "value", deserialize_with = "null_default")]
    pub market_value: f64,
    #[serde(alias = "unrealized_pnl", deserialize_with = "null_default")]
    pub pnl: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Portfolio {
    #[serde(deserialize_with = "null_default")]
    pub cash: f64,
    #[serde(alias = "total", deserialize_with = "null_default")]
    pub total_value: f64,
    #[serde(deserialize_with = "null_default")]
    pub positions: Vec<Position>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitPoint {
    #[serde(alias = "date", alias = "time", deserialize_with = "null_default")]
    pub timestamp: String,
    #[serde(alias = "profit", deserialize_with = "null_default")]
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationPoint {
    #[serde(alias = "date", alias = "time", deserialize_with = "null_default")]
    pub timestamp: String,
    #[serde(alias = "allocation", deserialize_with = "null_default")]
    pub allocations: BTreeMap<String, f64>,
}

/// A trading agent tracked on the leaderboard.
///
/// `rank` and `rank_change` are never read from the wire; they are
/// recomputed on every models refresh.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Model {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub category: Category,
    #[serde(deserialize_with = "null_default")]
    pub performance: f64,
    #[serde(deserialize_with = "null_default")]
    pub profit: f64,
    #[serde(alias = "trades", alias = "total_trades", deserialize_with = "null_default")]
    pub trade_count: u64,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
    #[serde(deserialize_with = "null_default")]
    pub asset_allocation: BTreeMap<String, f64>,
    #[serde(deserialize_with = "null_default")]
    pub portfolio: Option<Portfolio>,
    #[serde(deserialize_with = "null_default")]
    pub profit_history: Vec<ProfitPoint>,
    #[serde(deserialize_with = "null_default")]
    pub allocation_history: Vec<AllocationPoint>,
    #[serde(skip_deserializing)]
    pub rank: usize,
    #[serde(skip_deserializing)]
    pub rank_change: i64,
}

impl Model {
    pub fn is_active(&self) -> bool {
        matches!(
            self.status.trim().to_ascii_lowercase().as_str(),
            "active" | "running" | "live"
        )
    }

    /// Allocation entries ordered by weight, largest first.
    pub fn top_allocations(&self, limit: usize) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self
            .asset_allocation
            .iter()
            .map(|(ticker, weight)| (ticker.as_str(), *weight))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(limit);
        entries
    }

    /// Overlays detail and chart payloads onto a leaderboard entry.
    /// Leaderboard-derived fields stay with the list entry.
    pub fn merge_detail(&self, detail: Option<Model>, chart: Option<ModelChart>) -> Model {
        let mut merged = match detail {
            Some(mut detail) if !detail.id.is_empty() || !detail.name.is_empty() => {
                if detail.id.is_empty() {
                    detail.id = self.id.clone();
                }
                detail
            }
            _ => self.clone(),
        };
        merged.rank = self.rank;
        merged.rank_change = self.rank_change;

        if let Some(chart) = chart {
            if !chart.profit_history.is_empty() {
                merged.profit_history = chart.profit_history;
            }
            if !chart.allocation_history.is_empty() {
                merged.allocation_history = chart.allocation_history;
            }
        }
        merged
    }
}

/// Chart payload served separately from the model detail.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelChart {
    #[serde(alias = "profit", deserialize_with = "null_default")]
    pub profit_history: Vec<ProfitPoint>,
    #[serde(alias = "allocation", deserialize_with = "null_default")]
    pub allocation_history: Vec<AllocationPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(alias = "headline", deserialize_with = "null_default")]
    pub title: String,
    #[serde(alias = "summary", deserialize_with = "null_default")]
    pub snippet: String,
    #[serde(deserialize_with = "null_default")]
    pub source: String,
    #[serde(alias = "published_at", deserialize_with = "null_default")]
    pub date: String,
    #[serde(alias = "url", deserialize_with = "null_default")]
    pub link: String,
    #[serde(deserialize_with = "null_default")]
    pub tag: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialPost {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "null_default")]
    pub platform: String,
    #[serde(alias = "author", deserialize_with = "null_default")]
    pub username: String,
    #[serde(alias = "text", deserialize_with = "null_default")]
    pub content: String,
    #[serde(deserialize_with = "null_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_default")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub likes: u64,
    #[serde(alias = "shares", deserialize_with = "null_default")]
    pub retweets: u64,
    #[serde(alias = "comments", deserialize_with = "null_default")]
    pub replies: u64,
    #[serde(alias = "symbols", deserialize_with = "null_default")]
    pub stock_symbols: Vec<String>,
    #[serde(alias = "question", deserialize_with = "null_default")]
    pub market_question: Option<String>,
}

impl SocialPost {
    /// Best timestamp for ordering and "time ago" display.
    pub fn posted_at(&self) -> &str {
        match self.created_at.as_deref() {
            Some(created) if !created.trim().is_empty() => created,
            _ => self.timestamp.as_str(),
        }
    }

    pub fn engagement(&self) -> u64 {
        self.likes + self.retweets + self.replies
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryCounters {
    #[serde(alias = "successes", deserialize_with = "null_default")]
    pub success: u64,
    #[serde(alias = "failures", deserialize_with = "null_default")]
    pub failure: u64,
}

/// Backend-computed status. Unknown keys are kept in `extra` so the
/// snapshot mirror passes them through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    #[serde(deserialize_with = "null_default")]
    pub running_agents: u64,
    #[serde(deserialize_with = "null_default")]
    pub total_agents: u64,
    #[serde(deserialize_with = "null_default")]
    pub last_cycle: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub next_cycle: Option<String>,
    #[serde(alias = "cycle_interval", deserialize_with = "null_default")]
    pub cycle_interval_seconds: Option<u64>,
    #[serde(deserialize_with = "null_default")]
    pub categories: BTreeMap<String, CategoryCounters>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
