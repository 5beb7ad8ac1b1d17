//! Offline data source. Performance follows a random walk, so rank changes
//! show up on every models tick without a backend.

use crate::api::DashboardSource;
use crate::domain::{
    AllocationPoint, Category, CategoryCounters, Model, ModelChart, NewsItem, Portfolio, Position,
    ProfitPoint, SocialPost, SystemStatus,
};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

const DEMO_MODELS: &[(&str, Category, &[&str])] = &[
    ("Momentum Alpha", Category::Stock, &["NVDA", "MSFT", "AAPL", "AMZN"]),
    ("Mean Reversion", Category::Stock, &["SPY", "QQQ", "IWM"]),
    ("Sector Rotator", Category::Stock, &["XLK", "XLE", "XLF", "XLV"]),
    ("Event Oracle", Category::Polymarket, &["ELECTION", "FED-CUT", "BTC-100K"]),
    ("Crowd Fader", Category::Polymarket, &["FED-CUT", "RECESSION"]),
    ("Perp Trend", Category::Bitmex, &["XBTUSD", "ETHUSD"]),
    ("Funding Harvester", Category::Bitmex, &["XBTUSD", "SOLUSD", "ETHUSD"]),
    ("Carry Seeker", Category::Forex, &["USDJPY", "AUDJPY", "EURUSD"]),
    ("Breakout FX", Category::Forex, &["GBPUSD", "EURUSD"]),
];

const HEADLINES: &[&str] = &[
    "Volatility cools as traders price in steady policy path",
    "Earnings beat lifts large-cap tech into the close",
    "Funding rates flip negative after overnight liquidation wave",
    "Odds shift sharply after late-night debate",
    "Dollar slips as yields ease from weekly highs",
    "Options desks report heavy call buying into expiry",
];

const SOURCES: &[&str] = &["Reuters", "Bloomberg", "CoinDesk", "FT", "WSJ"];
const PLATFORMS: &[&str] = &["twitter", "reddit", "stocktwits"];
const USERS: &[&str] = &["quantqueen", "deltahedger", "macro_owl", "perpmaxi", "fxnomad"];

struct DemoModel {
    id: String,
    name: String,
    category: Category,
    tickers: Vec<String>,
    performance: f64,
    profit_history: Vec<ProfitPoint>,
    active: bool,
    views: u64,
}

struct DemoWorld {
    rng: StdRng,
    models: Vec<DemoModel>,
    cycles: u64,
    counters: HashMap<Category, CategoryCounters>,
}

pub struct DemoSource {
    world: Mutex<DemoWorld>,
    /// Starting capital each model's profit is measured against.
    capital: f64,
}

impl DemoSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(mut rng: StdRng) -> Self {
        let now = Utc::now();
        let models = DEMO_MODELS
            .iter()
            .enumerate()
            .map(|(idx, (name, category, tickers))| {
                let performance: f64 = rng.gen_range(-8.0..18.0);
                let mut value = 0.0;
                let profit_history = (0..30)
                    .rev()
                    .map(|days_ago| {
                        let step: f64 = rng.sample(StandardNormal);
                        value += step * 250.0 + performance * 10.0;
                        ProfitPoint {
                            timestamp: (now - Duration::days(days_ago)).to_rfc3339(),
                            value,
                        }
                    })
                    .collect();
                DemoModel {
                    id: format!("demo-{}", idx + 1),
                    name: name.to_string(),
                    category: category.clone(),
                    tickers: tickers.iter().map(|t| t.to_string()).collect(),
                    performance,
                    profit_history,
                    active: idx % 4 != 3,
                    views: 0,
                }
            })
            .collect();

        Self {
            world: Mutex::new(DemoWorld {
                rng,
                models,
                cycles: 0,
                counters: HashMap::new(),
            }),
            capital: 100_000.0,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DemoWorld>> {
        self.world
            .lock()
            .map_err(|_| anyhow!("demo world lock poisoned"))
    }

}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoWorld {
    fn step(&mut self) {
        let now = Utc::now().to_rfc3339();
        for model in &mut self.models {
            if !model.active {
                continue;
            }
            let shock: f64 = self.rng.sample(StandardNormal);
            model.performance += shock * 0.9;
            let last = model.profit_history.last().map(|p| p.value).unwrap_or(0.0);
            let step: f64 = self.rng.sample(StandardNormal);
            model.profit_history.push(ProfitPoint {
                timestamp: now.clone(),
                value: last + step * 250.0 + model.performance * 10.0,
            });
            if model.profit_history.len() > 120 {
                model.profit_history.remove(0);
            }
        }
    }

    fn allocation(&mut self, tickers: &[String]) -> BTreeMap<String, f64> {
        let raw: Vec<f64> = tickers.iter().map(|_| self.rng.gen_range(0.1..1.0)).collect();
        let total: f64 = raw.iter().sum::<f64>() / 0.9;
        let mut weights: BTreeMap<String, f64> = tickers
            .iter()
            .zip(raw)
            .map(|(t, w)| (t.clone(), w / total))
            .collect();
        weights.insert("CASH".to_string(), 0.1);
        weights
    }

    fn to_model(&mut self, idx: usize, capital: f64) -> Model {
        let tickers = self.models[idx].tickers.clone();
        let asset_allocation = self.allocation(&tickers);
        let model = &self.models[idx];
        let profit = model.profit_history.last().map(|p| p.value).unwrap_or(0.0);
        let total_value = capital + profit;

        let positions = asset_allocation
            .iter()
            .filter(|(ticker, _)| ticker.as_str() != "CASH")
            .map(|(ticker, weight)| {
                let market_value = total_value * weight;
                let price = 50.0 + (ticker.len() as f64) * 17.5;
                let avg_price = price * (1.0 - model.performance / 400.0);
                Position {
                    ticker: ticker.clone(),
                    quantity: (market_value / price).floor(),
                    avg_price,
                    current_price: price,
                    market_value,
                    pnl: (price - avg_price) * (market_value / price).floor(),
                }
            })
            .collect();

        let allocation_history = model
            .profit_history
            .iter()
            .rev()
            .step_by(5)
            .take(6)
            .map(|p| AllocationPoint {
                timestamp: p.timestamp.clone(),
                allocations: asset_allocation.clone(),
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        Model {
            id: model.id.clone(),
            name: model.name.clone(),
            category: model.category.clone(),
            performance: model.performance,
            profit,
            trade_count: model.profit_history.len() as u64 * 3,
            status: if model.active { "active" } else { "inactive" }.to_string(),
            portfolio: Some(Portfolio {
                cash: total_value * 0.1,
                total_value,
                positions,
            }),
            asset_allocation,
            profit_history: model.profit_history.clone(),
            allocation_history,
            rank: 0,
            rank_change: 0,
        }
    }
}

#[async_trait]
impl DashboardSource for DemoSource {
    async fn models(&self) -> Result<Vec<Model>> {
        let mut world = self.lock()?;
        world.step();
        Ok((0..world.models.len())
            .map(|idx| world.to_model(idx, self.capital))
            .collect())
    }

    async fn model_detail(&self, id: &str) -> Result<Model> {
        let mut world = self.lock()?;
        let idx = world
            .models
            .iter()
            .position(|m| m.id == id)
            .ok_or(anyhow!("Unknown demo model {}", id))?;
        Ok(world.to_model(idx, self.capital))
    }

    async fn model_chart(&self, id: &str) -> Result<ModelChart> {
        let detail = self.model_detail(id).await?;
        Ok(ModelChart {
            profit_history: detail.profit_history,
            allocation_history: detail.allocation_history,
        })
    }

    async fn news(&self, category: &Category) -> Result<Vec<NewsItem>> {
        let mut world = self.lock()?;
        let now = Utc::now();
        Ok((0..5)
            .map(|i| {
                let minutes = world.rng.gen_range(2..(60 * 24 * 3));
                let headline = HEADLINES[world.rng.gen_range(0..HEADLINES.len())];
                NewsItem {
                    id: format!("{}-news-{}", category, i),
                    title: headline.to_string(),
                    snippet: format!("{} desk notes: {}.", category.label(), headline.to_lowercase()),
                    source: SOURCES[world.rng.gen_range(0..SOURCES.len())].to_string(),
                    date: (now - Duration::minutes(minutes)).to_rfc3339(),
                    link: format!("https://news.example.com/{}/{}", category, i),
                    tag: (i % 2 == 0).then(|| category.label().to_string()),
                }
            })
            .collect())
    }

    async fn social(&self, category: &Category) -> Result<Vec<SocialPost>> {
        let mut world = self.lock()?;
        let now = Utc::now();
        let tickers: Vec<String> = world
            .models
            .iter()
            .filter(|m| &m.category == category)
            .flat_map(|m| m.tickers.clone())
            .collect();
        Ok((0..6)
            .map(|i| {
                let minutes = world.rng.gen_range(1..(60 * 12));
                let symbol = tickers
                    .get(world.rng.gen_range(0..tickers.len().max(1)))
                    .cloned();
                let content = match &symbol {
                    Some(s) => format!("Watching ${} closely, flow looks one-sided today", s),
                    None => "Quiet tape, waiting for the next catalyst".to_string(),
                };
                SocialPost {
                    id: format!("{}-post-{}", category, i),
                    platform: PLATFORMS[world.rng.gen_range(0..PLATFORMS.len())].to_string(),
                    username: USERS[world.rng.gen_range(0..USERS.len())].to_string(),
                    content,
                    timestamp: (now - Duration::minutes(minutes)).to_rfc3339(),
                    created_at: None,
                    likes: world.rng.gen_range(0..5_000),
                    retweets: world.rng.gen_range(0..800),
                    replies: world.rng.gen_range(0..300),
                    stock_symbols: symbol.clone().into_iter().collect(),
                    market_question: (*category == Category::Polymarket)
                        .then(|| format!("Will {} resolve YES?", symbol.unwrap_or_default())),
                }
            })
            .collect())
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        let world = self.lock()?;
        let now = Utc::now();
        let mut extra = serde_json::Map::new();
        extra.insert("cycles_completed".to_string(), serde_json::json!(world.cycles));
        let views: BTreeMap<&str, u64> = world
            .models
            .iter()
            .filter(|m| m.views > 0)
            .map(|m| (m.id.as_str(), m.views))
            .collect();
        extra.insert("detail_views".to_string(), serde_json::json!(views));
        Ok(SystemStatus {
            running_agents: world.models.iter().filter(|m| m.active).count() as u64,
            total_agents: world.models.len() as u64,
            last_cycle: Some(now.to_rfc3339()),
            next_cycle: Some((now + Duration::minutes(5)).to_rfc3339()),
            cycle_interval_seconds: Some(300),
            categories: world
                .counters
                .iter()
                .map(|(c, counters)| (c.to_string(), counters.clone()))
                .collect(),
            extra,
        })
    }

    async fn toggle_model(&self, id: &str, active: bool) -> Result<()> {
        let mut world = self.lock()?;
        let model = world
            .models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(anyhow!("Unknown demo model {}", id))?;
        model.active = active;
        Ok(())
    }

    async fn trigger_cycle(&self) -> Result<()> {
        let mut world = self.lock()?;
        world.cycles += 1;
        let categories: Vec<Category> = world
            .models
            .iter()
            .filter(|m| m.active)
            .map(|m| m.category.clone())
            .collect();
        for category in categories {
            let failed = world.rng.gen_bool(0.1);
            let counters = world.counters.entry(category).or_default();
            if failed {
                counters.failure += 1;
            } else {
                counters.success += 1;
            }
        }
        world.step();
        Ok(())
    }

    async fn record_view(&self, id: &str) -> Result<()> {
        let mut world = self.lock()?;
        if let Some(model) = world.models.iter_mut().find(|m| m.id == id) {
            model.views += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_models_cover_every_category() {
        let source = DemoSource::seeded(7);
        let models = source.models().await.unwrap();
        assert_eq!(models.len(), DEMO_MODELS.len());
        for category in Category::ALL {
            assert!(models.iter().any(|m| m.category == category));
        }
        for model in &models {
            let total: f64 = model.asset_allocation.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "allocation sums to {}", total);
        }
    }

    #[tokio::test]
    async fn test_toggle_and_views_are_remembered() {
        let source = DemoSource::seeded(1);
        source.toggle_model("demo-1", false).await.unwrap();
        source.record_view("demo-1").await.unwrap();
        source.record_view("demo-1").await.unwrap();

        let detail = source.model_detail("demo-1").await.unwrap();
        assert_eq!(detail.status, "inactive");
        let status = source.system_status().await.unwrap();
        assert_eq!(status.extra["detail_views"], serde_json::json!({"demo-1": 2}));
        assert_eq!(status.running_agents as usize, DEMO_MODELS.len() - 3);
        assert!(source.toggle_model("missing", true).await.is_err());
    }

    #[tokio::test]
    async fn test_trigger_cycle_updates_counters() {
        let source = DemoSource::seeded(3);
        source.trigger_cycle().await.unwrap();
        let status = source.system_status().await.unwrap();
        let total: u64 = status
            .categories
            .values()
            .map(|c| c.success + c.failure)
            .sum();
        assert_eq!(total as usize, DEMO_MODELS.len() - 2);
        assert_eq!(status.total_agents as usize, DEMO_MODELS.len());
        assert_eq!(status.extra["cycles_completed"], serde_json::json!(1));
    }
}
