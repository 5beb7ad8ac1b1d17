use crate::api::DashboardSource;
use crate::config::DashboardConfig;
use crate::domain::{Category, NewsItem, SocialPost};
use crate::state::SharedState;
use anyhow::Result;
use chrono::Utc;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, Sender};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const COMMAND_QUEUE: usize = 32;
pub const EVENT_QUEUE: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshCommand {
    RefreshModels,
    RefreshFeeds,
    RefreshAll,
    /// Fetch detail and chart for one model and bump its view counter.
    LoadDetail { id: String },
    ToggleModel { id: String, active: bool },
    TriggerCycle,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RefreshEvent {
    ModelsUpdated { count: usize, ok: bool },
    StatusUpdated { ok: bool },
    FeedsUpdated { news: usize, social: usize, failures: usize },
    DetailUpdated { id: String },
    Info(String),
    Warning(String),
}

#[derive(Clone, Debug)]
pub struct RefreshSettings {
    pub models_interval: Duration,
    pub feeds_interval: Duration,
    pub categories: Vec<Category>,
}

impl From<&DashboardConfig> for RefreshSettings {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            models_interval: cfg.models_interval,
            feeds_interval: cfg.feeds_interval,
            categories: cfg.categories.clone(),
        }
    }
}

/// Runs refresh cycles against a source and applies the results to the
/// shared state. Each endpoint fails on its own; a failure empties only
/// its own section.
pub struct Poller {
    source: Arc<dyn DashboardSource>,
    state: SharedState,
    events: Sender<RefreshEvent>,
    categories: Vec<Category>,
    fast_seq: AtomicU64,
    slow_seq: AtomicU64,
}

fn ok_or_warn<T>(result: Result<T>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("{} fetch failed: {:#}", what, err);
            None
        }
    }
}

impl Poller {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        state: SharedState,
        categories: Vec<Category>,
        events: Sender<RefreshEvent>,
    ) -> Self {
        Self {
            source,
            state,
            events,
            categories,
            fast_seq: AtomicU64::new(0),
            slow_seq: AtomicU64::new(0),
        }
    }

    /// Events are dropped rather than stalling the poller when nobody drains them.
    fn emit(&self, event: RefreshEvent) {
        if let Err(err) = self.events.try_send(event) {
            debug!("Refresh event dropped: {}", err);
        }
    }

    /// Models and system status, fetched in parallel.
    pub async fn refresh_models(&self) {
        let seq = self.fast_seq.fetch_add(1, Ordering::SeqCst);
        let (models, status) = tokio::join!(self.source.models(), self.source.system_status());
        let models = ok_or_warn(models, "Models");
        let status = ok_or_warn(status, "System status");
        let (models_ok, status_ok) = (models.is_some(), status.is_some());

        let now = Utc::now();
        let (applied_models, applied_status, count) = {
            let mut state = self.state.write().await;
            let applied_models = state.apply_models(seq, models, now);
            let applied_status = state.apply_status(seq, status, now);
            (applied_models, applied_status, state.models.len())
        };

        if applied_models {
            debug!("Models cycle {} applied: {} models", seq, count);
            self.emit(RefreshEvent::ModelsUpdated { count, ok: models_ok });
        } else {
            debug!("Dropped stale models result from cycle {}", seq);
        }
        if applied_status {
            self.emit(RefreshEvent::StatusUpdated { ok: status_ok });
        }
    }

    /// News and social for every configured category, all in parallel.
    pub async fn refresh_feeds(&self) {
        let seq = self.slow_seq.fetch_add(1, Ordering::SeqCst);
        let news_calls = self.categories.iter().map(|category| async move {
            (category.clone(), self.source.news(category).await)
        });
        let social_calls = self.categories.iter().map(|category| async move {
            (category.clone(), self.source.social(category).await)
        });
        let (news_results, social_results) = tokio::join!(join_all(news_calls), join_all(social_calls));

        let mut failures = 0;
        let news: BTreeMap<Category, Vec<NewsItem>> = news_results
            .into_iter()
            .map(|(category, result)| {
                let items = ok_or_warn(result, &format!("News ({})", category));
                failures += usize::from(items.is_none());
                (category, items.unwrap_or_default())
            })
            .collect();
        let social: BTreeMap<Category, Vec<SocialPost>> = social_results
            .into_iter()
            .map(|(category, result)| {
                let posts = ok_or_warn(result, &format!("Social ({})", category));
                failures += usize::from(posts.is_none());
                (category, posts.unwrap_or_default())
            })
            .collect();

        let news_count = news.values().map(Vec::len).sum();
        let social_count = social.values().map(Vec::len).sum();
        let now = Utc::now();
        let applied = {
            let mut state = self.state.write().await;
            let applied_news = state.apply_news(seq, news, now);
            let applied_social = state.apply_social(seq, social, now);
            applied_news || applied_social
        };

        if applied {
            debug!(
                "Feeds cycle {} applied: {} news, {} social, {} failed endpoints",
                seq, news_count, social_count, failures
            );
            self.emit(RefreshEvent::FeedsUpdated {
                news: news_count,
                social: social_count,
                failures,
            });
        } else {
            debug!("Dropped stale feeds result from cycle {}", seq);
        }
    }

    pub async fn refresh_all(&self) {
        tokio::join!(self.refresh_models(), self.refresh_feeds());
    }

    pub async fn load_detail(&self, id: &str) {
        let (seq, listed) = {
            let mut state = self.state.write().await;
            (state.begin_detail(), state.model(id).cloned())
        };

        let (detail, chart, view) = tokio::join!(
            self.source.model_detail(id),
            self.source.model_chart(id),
            self.source.record_view(id)
        );
        if let Err(err) = view {
            debug!("View counter for {} not recorded: {:#}", id, err);
        }
        let detail = ok_or_warn(detail, &format!("Model detail ({})", id));
        let chart = ok_or_warn(chart, &format!("Model chart ({})", id));

        let base = match listed.or_else(|| detail.clone()) {
            Some(base) => base,
            None => {
                self.emit(RefreshEvent::Warning(format!("Model {} is not available", id)));
                return;
            }
        };
        let merged = base.merge_detail(detail, chart);

        let applied = self
            .state
            .write()
            .await
            .apply_detail(seq, merged, Utc::now());
        if applied {
            self.emit(RefreshEvent::DetailUpdated { id: id.to_string() });
        }
    }

    pub async fn toggle_model(&self, id: &str, active: bool) {
        match self.source.toggle_model(id, active).await {
            Ok(()) => {
                let verb = if active { "Activated" } else { "Deactivated" };
                info!("{} model {}", verb, id);
                self.emit(RefreshEvent::Info(format!("{} model {}", verb, id)));
                self.refresh_models().await;
            }
            Err(err) => {
                warn!("Toggling model {} failed: {:#}", id, err);
                self.emit(RefreshEvent::Warning(format!("Toggle {} failed: {}", id, err)));
            }
        }
    }

    pub async fn trigger_cycle(&self) {
        match self.source.trigger_cycle().await {
            Ok(()) => {
                info!("Triggered a backend cycle");
                self.emit(RefreshEvent::Info("Cycle triggered".to_string()));
                self.refresh_models().await;
            }
            Err(err) => {
                warn!("Triggering cycle failed: {:#}", err);
                self.emit(RefreshEvent::Warning(format!("Trigger cycle failed: {}", err)));
            }
        }
    }

    pub async fn handle(&self, command: RefreshCommand) {
        debug!("Refresh command: {:?}", command);
        match command {
            RefreshCommand::RefreshModels => self.refresh_models().await,
            RefreshCommand::RefreshFeeds => self.refresh_feeds().await,
            RefreshCommand::RefreshAll => self.refresh_all().await,
            RefreshCommand::LoadDetail { id } => self.load_detail(&id).await,
            RefreshCommand::ToggleModel { id, active } => self.toggle_model(&id, active).await,
            RefreshCommand::TriggerCycle => self.trigger_cycle().await,
        }
    }
}

/// Owns the background refresh tasks. Dropping the handle or calling
/// `shutdown` cancels the timers together with any fetch still in flight.
pub struct RefreshHandle {
    tasks: Vec<JoinHandle<()>>,
    commands: Sender<RefreshCommand>,
}

impl RefreshHandle {
    pub fn request(&self, command: RefreshCommand) -> bool {
        match self.commands.try_send(command) {
            Ok(()) => true,
            Err(err) => {
                warn!("Refresh command not queued: {}", err);
                false
            }
        }
    }

    pub fn commands(&self) -> Sender<RefreshCommand> {
        self.commands.clone()
    }

    pub async fn shutdown(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
        info!("Refresh tasks stopped");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn spawn_timer<F, Fut>(period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            tick().await;
        }
    })
}

/// Starts the fast (models + status) and slow (news + social) timers plus
/// the command loop. Both timers fire once immediately.
pub fn spawn(
    source: Arc<dyn DashboardSource>,
    state: SharedState,
    settings: RefreshSettings,
    events: Sender<RefreshEvent>,
) -> RefreshHandle {
    let poller = Arc::new(Poller::new(source, state, settings.categories.clone(), events));
    let (command_tx, mut command_rx) = mpsc::channel::<RefreshCommand>(COMMAND_QUEUE);

    info!(
        "Polling every {:?} (models, status) and {:?} (news, social) for {} categories",
        settings.models_interval,
        settings.feeds_interval,
        settings.categories.len()
    );

    let fast_poller = poller.clone();
    let fast = spawn_timer(settings.models_interval, move || {
        let poller = fast_poller.clone();
        async move { poller.refresh_models().await }
    });

    let slow_poller = poller.clone();
    let slow = spawn_timer(settings.feeds_interval, move || {
        let poller = slow_poller.clone();
        async move { poller.refresh_feeds().await }
    });

    let commands = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            poller.handle(command).await;
        }
        debug!("Refresh command channel closed");
    });

    RefreshHandle {
        tasks: vec![fast, slow, commands],
        commands: command_tx,
    }
}
