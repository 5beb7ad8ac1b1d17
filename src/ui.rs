use crate::app::{App, Tab};
use crate::domain::{Category, Model, SystemStatus};
use crate::format::{TickerPalette, compact_count, money, signed_pct, time_ago, time_ago_str, truncate};
use crate::state::{DashboardState, Feed};
use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Dataset, Gauge, GraphType, List, ListItem, Paragraph, Row,
        Table, TableState, Tabs, Wrap,
    },
};

const ALLOCATION_ROWS: usize = 8;

pub fn render(f: &mut Frame, app: &App, state: &DashboardState) {
    let now = Utc::now();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, state, now, layout[0]);

    match &app.detail {
        Some(id) => render_detail(f, state, id, now, layout[1]),
        None => match app.tab {
            Tab::Leaderboard => render_leaderboard(f, app, state, layout[1]),
            Tab::News => render_news(f, app, state, now, layout[1]),
            Tab::Social => render_social(f, app, state, now, layout[1]),
            Tab::System => render_system(f, state, now, layout[1]),
        },
    }

    render_footer(f, app, layout[2]);
}

fn category_label(category: Option<&Category>) -> &str {
    category.map(|c| c.label()).unwrap_or("All")
}

fn render_header(f: &mut Frame, app: &App, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(56)])
        .split(area);

    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Modelboard ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    let updated = state
        .last_updated(Feed::Models)
        .map(|ts| time_ago(ts, now))
        .unwrap_or_else(|| "never".to_string());
    let info = Paragraph::new(Line::from(vec![
        Span::styled(category_label(app.category.as_ref()).to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(" | "),
        Span::styled(
            now.with_timezone(&app.timezone).format("%H:%M:%S %Z").to_string(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(format!("updated {}", updated), Style::default().fg(Color::Gray)),
    ]))
    .alignment(Alignment::Right)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(info, chunks[1]);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let hint = if app.detail.is_some() {
        "a: toggle | r: reload | Esc: back | q: quit"
    } else {
        match app.tab {
            Tab::Leaderboard => "↑↓: select | Enter: detail | a: toggle | 0-4/f: category | c: cycle | r: refresh | Tab | q",
            Tab::News | Tab::Social => "↑↓: scroll | 0-4/f: category | r: refresh | Tab | q",
            Tab::System => "c: trigger cycle | r: refresh | Tab | q",
        }
    };

    let mut spans = vec![
        Span::styled(" Controls: ", Style::default().fg(Color::Gray)),
        Span::styled(hint, Style::default().fg(Color::White)),
    ];
    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn render_placeholder(f: &mut Frame, title: &str, msg: &str, area: Rect) {
    let text = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(text, area);
}

fn perf_color(value: f64) -> Color {
    if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::Gray
    }
}

fn rank_change_span(change: i64) -> Span<'static> {
    match change {
        c if c > 0 => Span::styled(format!("▲{}", c), Style::default().fg(Color::Green)),
        c if c < 0 => Span::styled(format!("▼{}", -c), Style::default().fg(Color::Red)),
        _ => Span::styled("-", Style::default().fg(Color::DarkGray)),
    }
}

fn status_span(model: &Model) -> Span<'static> {
    if model.is_active() {
        Span::styled("● active", Style::default().fg(Color::Green))
    } else {
        let label = if model.status.is_empty() { "inactive" } else { model.status.as_str() };
        Span::styled(format!("○ {}", label), Style::default().fg(Color::DarkGray))
    }
}

fn render_leaderboard(f: &mut Frame, app: &App, state: &DashboardState, area: Rect) {
    let title = format!(" Leaderboard: {} ", category_label(app.category.as_ref()));
    let models = app.visible_models(state);
    if models.is_empty() {
        let msg = if state.last_updated(Feed::Models).is_none() {
            "Loading models..."
        } else {
            "No models available"
        };
        render_placeholder(f, &title, msg, area);
        return;
    }

    let header = Row::new(["#", "Δ", "Model", "Category", "Perf", "Profit", "Trades", "Status"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = models
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.rank.to_string()),
                Cell::from(rank_change_span(m.rank_change)),
                Cell::from(m.name.clone()),
                Cell::from(m.category.label().to_string()),
                Cell::from(Span::styled(signed_pct(m.performance), Style::default().fg(perf_color(m.performance)))),
                Cell::from(money(m.profit)),
                Cell::from(m.trade_count.to_string()),
                Cell::from(status_span(m)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(Some(app.selected.min(models.len() - 1)));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_detail(f: &mut Frame, state: &DashboardState, id: &str, now: DateTime<Utc>, area: Rect) {
    let Some(model) = state.detail.as_ref().filter(|d| d.id == id) else {
        render_placeholder(f, " Model ", "Loading model detail...", area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);

    let tickers = model
        .asset_allocation
        .keys()
        .map(String::as_str)
        .chain(model.portfolio.iter().flat_map(|p| p.positions.iter().map(|pos| pos.ticker.as_str())));
    let palette = TickerPalette::assign(tickers);

    render_model_info(f, model, state, now, top[0]);
    render_profit_chart(f, model, top[1]);
    render_allocation(f, model, &palette, bottom[0]);
    render_positions(f, model, &palette, bottom[1]);
}

fn render_model_info(f: &mut Frame, model: &Model, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(model.name.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))),
        Line::from(vec![Span::raw(format!("Rank #{} ", model.rank)), rank_change_span(model.rank_change)]),
        Line::from(format!("Category: {}", model.category.label())),
        Line::from(vec![Span::raw("Status:   "), status_span(model)]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Perf:     "),
            Span::styled(signed_pct(model.performance), Style::default().fg(perf_color(model.performance))),
        ]),
        Line::from(format!("Profit:   {}", money(model.profit))),
        Line::from(format!("Trades:   {}", model.trade_count)),
    ];
    if let Some(portfolio) = &model.portfolio {
        lines.push(Line::from(format!("Value:    {}", money(portfolio.total_value))));
        lines.push(Line::from(format!("Cash:     {}", money(portfolio.cash))));
    }
    if let Some(ts) = state.last_updated(Feed::Detail) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Loaded {}", time_ago(ts, now)),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let info = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .style(Style::default().fg(Color::White));
    f.render_widget(info, area);
}

fn render_profit_chart(f: &mut Frame, model: &Model, area: Rect) {
    if model.profit_history.is_empty() {
        render_placeholder(f, " Profit ", "No profit history", area);
        return;
    }

    let points: Vec<(f64, f64)> = model
        .profit_history
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();
    let min_value = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_value = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max_value - min_value).abs() * 0.05).max(1.0);
    let x_max = (points.len().max(2) - 1) as f64;
    let color = perf_color(points.last().map(|p| p.1).unwrap_or(0.0));

    let first_label = model.profit_history.first().map(|p| p.timestamp.as_str()).unwrap_or("");
    let last_label = model.profit_history.last().map(|p| p.timestamp.as_str()).unwrap_or("");

    let datasets = vec![
        Dataset::default()
            .name("Profit")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&points),
    ];
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(" Profit History ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(vec![
                    Span::styled(truncate(first_label, 16), Style::default().fg(Color::Gray)),
                    Span::styled(truncate(last_label, 16), Style::default().fg(Color::Gray)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([min_value - pad, max_value + pad])
                .labels(vec![
                    Span::styled(money(min_value), Style::default().fg(Color::Gray)),
                    Span::styled(money(max_value), Style::default().fg(Color::Gray)),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_allocation(f: &mut Frame, model: &Model, palette: &TickerPalette, area: Rect) {
    let entries = model.top_allocations(ALLOCATION_ROWS);
    if entries.is_empty() {
        render_placeholder(f, " Allocation ", "No allocation data", area);
        return;
    }

    let bar_width = area.width.saturating_sub(20).max(4) as usize;
    let lines: Vec<Line> = entries
        .iter()
        .map(|(ticker, weight)| {
            let filled = ((weight.clamp(0.0, 1.0)) * bar_width as f64).round() as usize;
            let color = palette.color(ticker);
            Line::from(vec![
                Span::styled(format!("{:<7}", truncate(ticker, 7)), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled("█".repeat(filled), Style::default().fg(color)),
                Span::raw(" ".repeat(bar_width.saturating_sub(filled))),
                Span::raw(format!(" {:>5.1}%", weight * 100.0)),
            ])
        })
        .collect();

    let block = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Allocation "));
    f.render_widget(block, area);
}

fn render_positions(f: &mut Frame, model: &Model, palette: &TickerPalette, area: Rect) {
    let positions = model.portfolio.as_ref().map(|p| p.positions.as_slice()).unwrap_or_default();
    if positions.is_empty() {
        render_placeholder(f, " Positions ", "No open positions", area);
        return;
    }

    let header = Row::new(["Ticker", "Qty", "Avg", "Last", "Value", "P&L"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = positions
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(Span::styled(p.ticker.clone(), Style::default().fg(palette.color(&p.ticker)))),
                Cell::from(format!("{:.2}", p.quantity)),
                Cell::from(format!("{:.2}", p.avg_price)),
                Cell::from(format!("{:.2}", p.current_price)),
                Cell::from(money(p.market_value)),
                Cell::from(Span::styled(money(p.pnl), Style::default().fg(perf_color(p.pnl)))),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Positions "));
    f.render_widget(table, area);
}

fn render_news(f: &mut Frame, app: &App, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let title = format!(" News: {} ", category_label(app.category.as_ref()));
    let items = state.news_in(app.category.as_ref());
    if items.is_empty() {
        let msg = if state.last_updated(Feed::News).is_none() { "Loading news..." } else { "No news" };
        render_placeholder(f, &title, msg, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let list_items: Vec<ListItem> = items
        .iter()
        .skip(app.scroll)
        .map(|item| {
            let mut meta = vec![Span::styled(time_ago_str(&item.date, now), Style::default().fg(Color::DarkGray))];
            if !item.source.is_empty() {
                meta.push(Span::raw(" · "));
                meta.push(Span::styled(item.source.clone(), Style::default().fg(Color::Cyan)));
            }
            if let Some(tag) = item.tag.as_deref().filter(|t| !t.is_empty()) {
                meta.push(Span::raw(" "));
                meta.push(Span::styled(format!("[{}]", tag), Style::default().fg(Color::Yellow)));
            }
            ListItem::new(vec![
                Line::from(Span::styled(truncate(&item.title, width), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(truncate(&item.snippet, width), Style::default().fg(Color::Gray))),
                Line::from(meta),
                Line::from(""),
            ])
        })
        .collect();

    let list = List::new(list_items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn render_social(f: &mut Frame, app: &App, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let title = format!(" Social: {} ", category_label(app.category.as_ref()));
    let posts = state.social_in(app.category.as_ref());
    if posts.is_empty() {
        let msg = if state.last_updated(Feed::Social).is_none() { "Loading posts..." } else { "No posts" };
        render_placeholder(f, &title, msg, area);
        return;
    }

    let palette = TickerPalette::assign(posts.iter().flat_map(|p| p.stock_symbols.iter().map(String::as_str)));
    let width = area.width.saturating_sub(4) as usize;
    let list_items: Vec<ListItem> = posts
        .iter()
        .skip(app.scroll)
        .map(|post| {
            let mut header = vec![
                Span::styled(format!("@{}", post.username), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" · {}", post.platform), Style::default().fg(Color::Gray)),
                Span::styled(format!(" · {}", time_ago_str(post.posted_at(), now)), Style::default().fg(Color::DarkGray)),
            ];
            for symbol in &post.stock_symbols {
                header.push(Span::raw(" "));
                header.push(Span::styled(format!("${}", symbol), Style::default().fg(palette.color(symbol))));
            }

            let mut lines = vec![Line::from(header)];
            if let Some(question) = post.market_question.as_deref().filter(|q| !q.is_empty()) {
                lines.push(Line::from(Span::styled(truncate(question, width), Style::default().fg(Color::Yellow))));
            }
            lines.push(Line::from(truncate(&post.content, width)));
            lines.push(Line::from(Span::styled(
                format!(
                    "♥ {}  ⟲ {}  ↩ {}  · {} total",
                    compact_count(post.likes),
                    compact_count(post.retweets),
                    compact_count(post.replies),
                    compact_count(post.engagement())
                ),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(""));
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(list_items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn render_system(f: &mut Frame, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let Some(status) = state.status.as_ref() else {
        let msg = if state.last_updated(Feed::Status).is_none() {
            "Loading system status..."
        } else {
            "System status unavailable"
        };
        render_placeholder(f, " System ", msg, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let ratio = if status.total_agents == 0 {
        0.0
    } else {
        (status.running_agents as f64 / status.total_agents as f64).clamp(0.0, 1.0)
    };
    let gauge = Gauge::default()
        .block(Block::default().title(" Running Agents ").borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Cyan))
        .label(format!("{} / {}", status.running_agents, status.total_agents))
        .ratio(ratio);
    f.render_widget(gauge, chunks[0]);

    render_cycle_info(f, status, state, now, lower[0]);
    render_category_counters(f, status, lower[1]);
}

fn render_cycle_info(f: &mut Frame, status: &SystemStatus, state: &DashboardState, now: DateTime<Utc>, area: Rect) {
    let or_dash = |value: Option<&String>| value.map(|v| time_ago_str(v, now)).unwrap_or_else(|| "-".to_string());
    let mut lines = vec![
        Line::from(Span::styled("Cycles", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
        Line::from(format!("Last:     {}", or_dash(status.last_cycle.as_ref()))),
        Line::from(format!("Next:     {}", status.next_cycle.as_deref().unwrap_or("-"))),
        Line::from(format!(
            "Interval: {}",
            status.cycle_interval_seconds.map(|s| format!("{}s", s)).unwrap_or_else(|| "-".to_string())
        )),
        Line::from(format!("Active models: {}", state.active_model_count())),
        Line::from(""),
        Line::from(Span::styled("Feeds", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))),
    ];
    for (label, feed) in [("Models", Feed::Models), ("Status", Feed::Status), ("News", Feed::News), ("Social", Feed::Social)] {
        let updated = state
            .last_updated(feed)
            .map(|ts| time_ago(ts, now))
            .unwrap_or_else(|| "never".to_string());
        lines.push(Line::from(format!("{:<9} {}", label, updated)));
    }
    if !status.extra.is_empty() {
        lines.push(Line::from(""));
        for (key, value) in &status.extra {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(Line::from(Span::styled(format!("{}: {}", key, value), Style::default().fg(Color::Gray))));
        }
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Status "));
    f.render_widget(panel, area);
}

fn render_category_counters(f: &mut Frame, status: &SystemStatus, area: Rect) {
    let header = Row::new(["Category", "Success", "Failure"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = status
        .categories
        .iter()
        .map(|(name, counters)| {
            Row::new(vec![
                Cell::from(Category::from(name.clone()).label().to_string()),
                Cell::from(Span::styled(counters.success.to_string(), Style::default().fg(Color::Green))),
                Cell::from(Span::styled(counters.failure.to_string(), Style::default().fg(Color::Red))),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Min(12), Constraint::Length(9), Constraint::Length(9)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Categories "));
    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Portfolio, Position};
    use ratatui::{Terminal, backend::TestBackend};
    use std::collections::BTreeMap;

    fn draw(app: &App, state: &DashboardState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| render(f, app, state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    fn model(id: &str, performance: f64) -> Model {
        Model {
            id: id.to_string(),
            name: format!("Model {}", id),
            category: Category::Stock,
            performance,
            status: "active".to_string(),
            ..Model::default()
        }
    }

    #[test]
    fn test_leaderboard_shows_rank_movement() {
        let mut state = DashboardState::default();
        state.apply_models(0, Some(vec![model("a", 2.0), model("b", 1.0)]), Utc::now());
        state.apply_models(1, Some(vec![model("a", 1.0), model("b", 2.0)]), Utc::now());
        let screen = draw(&App::new(chrono_tz::UTC), &state);
        assert!(screen.contains("Model b"));
        assert!(screen.contains("▲1"));
        assert!(screen.contains("▼1"));
    }

    #[test]
    fn test_empty_leaderboard_placeholder() {
        let state = DashboardState::default();
        assert!(draw(&App::new(chrono_tz::UTC), &state).contains("Loading models..."));
    }

    #[test]
    fn test_detail_view_renders_allocation_and_positions() {
        let mut detailed = model("a", 4.0);
        detailed.asset_allocation = BTreeMap::from([("NVDA".to_string(), 0.6), ("CASH".to_string(), 0.4)]);
        detailed.portfolio = Some(Portfolio {
            cash: 400.0,
            total_value: 1_000.0,
            positions: vec![Position {
                ticker: "NVDA".to_string(),
                quantity: 2.0,
                ..Position::default()
            }],
        });
        let mut state = DashboardState::default();
        let seq = state.begin_detail();
        state.apply_detail(seq, detailed, Utc::now());

        let mut app = App::new(chrono_tz::UTC);
        app.detail = Some("a".to_string());
        let screen = draw(&app, &state);
        assert!(screen.contains("Allocation"));
        assert!(screen.contains("60.0%"));
        assert!(screen.contains("Positions"));
        assert!(screen.contains("No profit history"));
    }
}
