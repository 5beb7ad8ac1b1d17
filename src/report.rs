use crate::domain::Category;
use crate::format::{signed_pct, time_ago, truncate};
use crate::state::{DashboardState, Feed};
use chrono::{DateTime, Utc};
use std::fmt::Write;

const WIDTH: usize = 66;

fn rule(left: char, right: char) -> String {
    format!("{}{}{}", left, "═".repeat(WIDTH), right)
}

fn boxed(text: &str) -> String {
    let clipped: String = text.chars().take(WIDTH).collect();
    format!("║{:<width$}║", clipped, width = WIDTH)
}

fn change_label(change: i64) -> String {
    match change {
        c if c > 0 => format!("▲{}", c),
        c if c < 0 => format!("▼{}", -c),
        _ => "-".to_string(),
    }
}

/// Plain-text leaderboard for `--once`.
pub fn render_report(state: &DashboardState, categories: &[Category], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let updated = state
        .last_updated(Feed::Models)
        .map(|ts| time_ago(ts, now))
        .unwrap_or_else(|| "never".to_string());

    let _ = writeln!(out, "{}", rule('╔', '╗'));
    let _ = writeln!(out, "{}", boxed(&format!("  Modelboard Leaderboard   ({} models, updated {})", state.models.len(), updated)));
    let _ = writeln!(out, "{}", rule('╠', '╣'));
    let _ = writeln!(
        out,
        "{}",
        boxed(&format!("  {:>3} {:>4}  {:<22} {:<11} {:>9}  {:<8}", "#", "Δ", "Model", "Category", "Perf", "Status"))
    );
    let _ = writeln!(out, "{}", rule('╠', '╣'));

    if state.models.is_empty() {
        let _ = writeln!(out, "{}", boxed("  No models available"));
    }
    for model in &state.models {
        let status = if model.is_active() { "active" } else { "inactive" };
        let _ = writeln!(
            out,
            "{}",
            boxed(&format!(
                "  {:>3} {:>4}  {:<22} {:<11} {:>9}  {:<8}",
                model.rank,
                change_label(model.rank_change),
                truncate(&model.name, 22),
                model.category.label(),
                signed_pct(model.performance),
                status
            ))
        );
    }

    let _ = writeln!(out, "{}", rule('╠', '╣'));
    let _ = writeln!(out, "{}", boxed(&format!("  {:<14} {:>6} {:>8}", "Feeds", "News", "Social")));
    for category in categories {
        let _ = writeln!(
            out,
            "{}",
            boxed(&format!(
                "  {:<14} {:>6} {:>8}",
                category.label(),
                state.news.get(category).map_or(0, Vec::len),
                state.social.get(category).map_or(0, Vec::len)
            ))
        );
    }
    if let Some(status) = &state.status {
        let _ = writeln!(out, "{}", rule('╠', '╣'));
        let _ = writeln!(
            out,
            "{}",
            boxed(&format!("  Agents running: {} / {}", status.running_agents, status.total_agents))
        );
    }
    let _ = writeln!(out, "{}", rule('╚', '╝'));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Model;

    #[test]
    fn test_report_lists_models_in_rank_order() {
        let mut state = DashboardState::default();
        let now = Utc::now();
        let model = |id: &str, performance: f64| Model {
            id: id.to_string(),
            name: format!("Model {}", id),
            category: Category::Bitmex,
            performance,
            status: "running".to_string(),
            ..Model::default()
        };
        state.apply_models(0, Some(vec![model("a", 1.0), model("b", 2.0)]), now);
        state.apply_models(1, Some(vec![model("a", 3.0), model("b", 2.0)]), now);

        let report = render_report(&state, &Category::ALL, now);
        let a = report.find("Model a").unwrap();
        let b = report.find("Model b").unwrap();
        assert!(a < b);
        assert!(report.contains("▲1"));
        assert!(report.contains("▼1"));
        assert!(report.contains("+3.00%"));
        assert!(report.contains("Polymarket"));
        assert!(report.lines().all(|line| line.chars().count() == WIDTH + 2));
    }

    #[test]
    fn test_empty_report() {
        let report = render_report(&DashboardState::default(), &[], Utc::now());
        assert!(report.contains("No models available"));
        assert!(report.contains("updated never"));
    }
}
