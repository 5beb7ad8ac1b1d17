use crate::domain::{Category, Model};
use crate::refresh::{RefreshCommand, RefreshEvent, RefreshHandle};
use crate::state::{DashboardState, SharedState};
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::Receiver;
use tracing::debug;

/// How long an Info or Warning stays in the footer before routine updates may replace it.
const STATUS_HOLD: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Leaderboard,
    News,
    Social,
    System,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Leaderboard, Tab::News, Tab::Social, Tab::System];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Leaderboard => "Leaderboard",
            Tab::News => "News",
            Tab::Social => "Social",
            Tab::System => "System",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    /// Id of the model opened in the detail view.
    pub detail: Option<String>,
    pub category: Option<Category>,
    pub selected: usize,
    pub scroll: usize,
    pub status: Option<StatusLine>,
    status_held_until: Option<Instant>,
    pub timezone: Tz,
}

impl App {
    pub fn new(timezone: Tz) -> Self {
        Self {
            should_quit: false,
            tab: Tab::Leaderboard,
            detail: None,
            category: None,
            selected: 0,
            scroll: 0,
            status: None,
            status_held_until: None,
            timezone,
        }
    }

    pub fn visible_models<'a>(&self, state: &'a DashboardState) -> Vec<&'a Model> {
        state.models_in(self.category.as_ref())
    }

    pub fn selected_model<'a>(&self, state: &'a DashboardState) -> Option<&'a Model> {
        let models = self.visible_models(state);
        let last = models.len().checked_sub(1)?;
        models.get(self.selected.min(last)).copied()
    }

    fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
        self.selected = 0;
        self.scroll = 0;
    }

    fn cycle_category(&mut self) {
        let next = match &self.category {
            None => Some(Category::ALL[0].clone()),
            Some(current) => Category::ALL
                .iter()
                .position(|c| c == current)
                .and_then(|idx| Category::ALL.get(idx + 1))
                .cloned(),
        };
        self.set_category(next);
    }

    fn feed_len(&self, state: &DashboardState) -> usize {
        match self.tab {
            Tab::Leaderboard => self.visible_models(state).len(),
            Tab::News => state.news_in(self.category.as_ref()).len(),
            Tab::Social => state.social_in(self.category.as_ref()).len(),
            Tab::System => 0,
        }
    }

    fn move_cursor(&mut self, down: bool, state: &DashboardState) {
        let len = self.feed_len(state);
        let cursor = if self.tab == Tab::Leaderboard {
            &mut self.selected
        } else {
            &mut self.scroll
        };
        if down {
            *cursor = (*cursor + 1).min(len.saturating_sub(1));
        } else {
            *cursor = cursor.saturating_sub(1).min(len.saturating_sub(1));
        }
    }

    /// The model `a` acts on: the open detail, else the leaderboard selection.
    fn target_model<'a>(&self, state: &'a DashboardState) -> Option<&'a Model> {
        match &self.detail {
            Some(id) => state.model(id).or(state.detail.as_ref().filter(|d| &d.id == id)),
            None if self.tab == Tab::Leaderboard => self.selected_model(state),
            None => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, state: &DashboardState) -> Option<RefreshCommand> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.detail.is_some() {
                    self.detail = None;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab => {
                self.detail = None;
                self.tab = self.tab.next();
                self.scroll = 0;
            }
            KeyCode::BackTab => {
                self.detail = None;
                self.tab = self.tab.prev();
                self.scroll = 0;
            }
            KeyCode::Char('0') => self.set_category(None),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                self.set_category(Some(Category::ALL[idx].clone()));
            }
            KeyCode::Char('f') => self.cycle_category(),
            KeyCode::Down | KeyCode::Char('j') if self.detail.is_none() => self.move_cursor(true, state),
            KeyCode::Up | KeyCode::Char('k') if self.detail.is_none() => self.move_cursor(false, state),
            KeyCode::Enter if self.tab == Tab::Leaderboard && self.detail.is_none() => {
                let id = self.selected_model(state)?.id.clone();
                self.detail = Some(id.clone());
                return Some(RefreshCommand::LoadDetail { id });
            }
            KeyCode::Char('a') => {
                let model = self.target_model(state)?;
                return Some(RefreshCommand::ToggleModel {
                    id: model.id.clone(),
                    active: !model.is_active(),
                });
            }
            KeyCode::Char('c') => return Some(RefreshCommand::TriggerCycle),
            KeyCode::Char('r') => {
                self.status = Some(StatusLine {
                    text: "Refreshing...".to_string(),
                    is_error: false,
                });
                self.status_held_until = None;
                return Some(match &self.detail {
                    Some(id) => RefreshCommand::LoadDetail { id: id.clone() },
                    None => RefreshCommand::RefreshAll,
                });
            }
            _ => {}
        }
        None
    }

    pub fn on_event(&mut self, event: RefreshEvent) {
        self.on_event_at(event, Instant::now());
    }

    fn on_event_at(&mut self, event: RefreshEvent, now: Instant) {
        let (status, held) = match event {
            RefreshEvent::Info(text) => (StatusLine { text, is_error: false }, true),
            RefreshEvent::Warning(text) => (StatusLine { text, is_error: true }, true),
            RefreshEvent::ModelsUpdated { ok: false, .. } => (
                StatusLine {
                    text: "Models unavailable, retrying next cycle".to_string(),
                    is_error: true,
                },
                false,
            ),
            RefreshEvent::FeedsUpdated { failures, .. } if failures > 0 => (
                StatusLine {
                    text: format!("{} feed request(s) failed", failures),
                    is_error: true,
                },
                false,
            ),
            RefreshEvent::ModelsUpdated { count, ok: true } => {
                if self.status_held_until.is_some_and(|until| now < until) {
                    return;
                }
                (
                    StatusLine {
                        text: format!("{} models loaded", count),
                        is_error: false,
                    },
                    false,
                )
            }
            _ => return,
        };
        self.status = Some(status);
        self.status_held_until = held.then(|| now + STATUS_HOLD);
    }

    pub async fn run(
        &mut self,
        terminal: &mut crate::tui::Tui,
        shared: SharedState,
        refresh: &RefreshHandle,
        events: &mut Receiver<RefreshEvent>,
    ) -> io::Result<()> {
        while !self.should_quit {
            while let Ok(event) = events.try_recv() {
                self.on_event(event);
            }

            {
                let state = shared.read().await;
                terminal.draw(|f| crate::ui::render(f, self, &state))?;
            }

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let had_detail = self.detail.is_some();
                    let command = {
                        let state = shared.read().await;
                        self.handle_key(key, &state)
                    };
                    if had_detail && self.detail.is_none() {
                        shared.write().await.clear_detail();
                    }
                    if let Some(command) = command {
                        debug!("Key {:?} -> {:?}", key.code, command);
                        refresh.request(command);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> DashboardState {
        let models = vec![
            Model {
                id: "s1".to_string(),
                category: Category::Stock,
                performance: 9.0,
                status: "active".to_string(),
                ..Model::default()
            },
            Model {
                id: "f1".to_string(),
                category: Category::Forex,
                performance: 5.0,
                status: "inactive".to_string(),
                ..Model::default()
            },
            Model {
                id: "s2".to_string(),
                category: Category::Stock,
                performance: 1.0,
                status: "active".to_string(),
                ..Model::default()
            },
        ];
        let mut state = DashboardState::default();
        state.apply_models(0, Some(models), Utc::now());
        state
    }

    #[test]
    fn test_navigation_clamps_to_visible_models() {
        let state = state();
        let mut app = App::new(chrono_tz::UTC);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down), &state);
        }
        assert_eq!(app.selected, 2);
        assert_eq!(app.selected_model(&state).map(|m| m.id.as_str()), Some("s2"));

        app.handle_key(key(KeyCode::Char('1')), &state);
        assert_eq!(app.category, Some(Category::Stock));
        assert_eq!(app.selected, 0);
        app.handle_key(key(KeyCode::Char('j')), &state);
        app.handle_key(key(KeyCode::Char('j')), &state);
        assert_eq!(app.selected_model(&state).map(|m| m.id.as_str()), Some("s2"));
        app.handle_key(key(KeyCode::Up), &state);
        app.handle_key(key(KeyCode::Up), &state);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_enter_opens_detail_and_esc_closes_it() {
        let state = state();
        let mut app = App::new(chrono_tz::UTC);
        app.handle_key(key(KeyCode::Down), &state);

        let command = app.handle_key(key(KeyCode::Enter), &state);
        assert_eq!(command, Some(RefreshCommand::LoadDetail { id: "f1".to_string() }));
        assert_eq!(app.detail.as_deref(), Some("f1"));

        app.handle_key(key(KeyCode::Esc), &state);
        assert!(app.detail.is_none());
        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Esc), &state);
        assert!(app.should_quit);
    }

    #[test]
    fn test_toggle_flips_current_status() {
        let state = state();
        let mut app = App::new(chrono_tz::UTC);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('a')), &state),
            Some(RefreshCommand::ToggleModel { id: "s1".to_string(), active: false })
        );
        app.handle_key(key(KeyCode::Down), &state);
        assert_eq!(
            app.handle_key(key(KeyCode::Char('a')), &state),
            Some(RefreshCommand::ToggleModel { id: "f1".to_string(), active: true })
        );
    }

    #[test]
    fn test_category_cycle_wraps_to_all() {
        let state = state();
        let mut app = App::new(chrono_tz::UTC);
        let mut seen = Vec::new();
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Char('f')), &state);
            seen.push(app.category.clone());
        }
        assert_eq!(seen[0], Some(Category::Stock));
        assert_eq!(seen[3], Some(Category::Forex));
        assert_eq!(seen[4], None);
    }

    #[test]
    fn test_tabs_and_commands() {
        let state = state();
        let mut app = App::new(chrono_tz::UTC);
        app.handle_key(key(KeyCode::BackTab), &state);
        assert_eq!(app.tab, Tab::System);
        app.handle_key(key(KeyCode::Tab), &state);
        assert_eq!(app.tab, Tab::Leaderboard);
        assert_eq!(app.handle_key(key(KeyCode::Char('r')), &state), Some(RefreshCommand::RefreshAll));
        assert_eq!(app.handle_key(key(KeyCode::Char('c')), &state), Some(RefreshCommand::TriggerCycle));

        app.handle_key(key(KeyCode::Tab), &state);
        assert_eq!(app.handle_key(key(KeyCode::Enter), &state), None);
        assert_eq!(app.handle_key(key(KeyCode::Char('a')), &state), None);

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), &state);
        assert!(app.should_quit);
    }

    #[test]
    fn test_events_update_status_line() {
        let mut app = App::new(chrono_tz::UTC);
        app.on_event(RefreshEvent::FeedsUpdated { news: 3, social: 4, failures: 2 });
        assert_eq!(
            app.status,
            Some(StatusLine { text: "2 feed request(s) failed".to_string(), is_error: true })
        );
        app.on_event(RefreshEvent::StatusUpdated { ok: true });
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
        app.on_event(RefreshEvent::Info("Cycle triggered".to_string()));
        assert_eq!(app.status.as_ref().map(|s| s.is_error), Some(false));
    }

    #[test]
    fn test_routine_update_waits_for_held_message() {
        let mut app = App::new(chrono_tz::UTC);
        let start = Instant::now();
        app.on_event_at(RefreshEvent::Warning("Toggle m1 failed".to_string()), start);
        app.on_event_at(RefreshEvent::ModelsUpdated { count: 3, ok: true }, start + Duration::from_secs(1));
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("Toggle m1 failed"));

        app.on_event_at(RefreshEvent::ModelsUpdated { count: 3, ok: true }, start + STATUS_HOLD);
        assert_eq!(app.status.as_ref().map(|s| s.text.as_str()), Some("3 models loaded"));
    }

    #[tokio::test]
    async fn test_toggle_confirmation_survives_following_refetch() {
        use crate::demo::DemoSource;
        use crate::refresh::{EVENT_QUEUE, Poller};
        use std::sync::Arc;

        let (tx, mut rx) = tokio::sync::mpsc::channel(EVENT_QUEUE);
        let poller = Poller::new(
            Arc::new(DemoSource::seeded(1)),
            crate::state::new_shared(),
            Category::ALL.to_vec(),
            tx,
        );
        poller
            .handle(RefreshCommand::ToggleModel {
                id: "demo-1".to_string(),
                active: false,
            })
            .await;

        let mut app = App::new(chrono_tz::UTC);
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event.clone());
            app.on_event(event);
        }
        assert!(seen.iter().any(|e| matches!(e, RefreshEvent::ModelsUpdated { ok: true, .. })));
        assert_eq!(
            app.status,
            Some(StatusLine { text: "Deactivated model demo-1".to_string(), is_error: false })
        );
    }
}
