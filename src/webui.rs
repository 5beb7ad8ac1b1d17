use crate::domain::{Category, Model};
use crate::refresh::RefreshCommand;
use crate::state::{DashboardState, SharedState};
use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Modelboard</title>
<style>
body { font-family: monospace; background: #111; color: #ddd; margin: 2em; }
table { border-collapse: collapse; }
td, th { padding: 2px 12px; text-align: left; }
.up { color: #22c55e; } .down { color: #ef4444; }
</style></head>
<body>
<h2>Modelboard</h2>
<table id="board"><thead><tr><th>#</th><th>&Delta;</th><th>Model</th><th>Category</th><th>Perf</th><th>Status</th></tr></thead><tbody></tbody></table>
<script>
function cell(row, text, className) {
  const td = document.createElement('td');
  td.textContent = text;
  if (className) td.className = className;
  row.appendChild(td);
}
async function load() {
  const res = await fetch('/api/models');
  const models = await res.json();
  const body = document.querySelector('#board tbody');
  body.replaceChildren();
  for (const m of models) {
    const row = document.createElement('tr');
    cell(row, String(m.rank));
    if (m.rank_change > 0) cell(row, '\u25B2' + m.rank_change, 'up');
    else if (m.rank_change < 0) cell(row, '\u25BC' + (-m.rank_change), 'down');
    else cell(row, '-');
    cell(row, m.name);
    cell(row, m.category);
    cell(row, Number(m.performance).toFixed(2) + '%');
    cell(row, m.status);
    body.appendChild(row);
  }
}
load();
setInterval(load, 10000);
</script>
</body>
</html>
"#;

#[derive(Clone)]
struct WebState {
    dashboard: SharedState,
    commands: mpsc::Sender<RefreshCommand>,
}

#[derive(Clone, Debug, Serialize)]
struct ApiError {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryQuery {
    category: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RefreshTarget {
    Models,
    Feeds,
    #[default]
    All,
}

#[derive(Debug, Default, Deserialize)]
struct RefreshQuery {
    #[serde(default)]
    target: RefreshTarget,
}

/// Read-only JSON mirror of the dashboard state, plus a manual refresh hook.
pub fn router(dashboard: SharedState, commands: mpsc::Sender<RefreshCommand>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/state", get(full_state))
        .route("/api/models", get(models))
        .route("/api/models/:id", get(model))
        .route("/api/refresh", post(refresh))
        .with_state(WebState { dashboard, commands })
}

pub async fn run_webui_server(
    port: u16,
    dashboard: SharedState,
    commands: mpsc::Sender<RefreshCommand>,
) -> Result<()> {
    let app = router(dashboard, commands);
    let addr = format!("0.0.0.0:{}", port);
    info!("WebUI listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<WebState>) -> Json<serde_json::Value> {
    let dashboard = state.dashboard.read().await;
    Json(serde_json::json!({
        "ok": true,
        "models": dashboard.models.len(),
        "active_models": dashboard.active_model_count(),
        "rank_baseline": dashboard.has_rank_baseline(),
    }))
}

async fn full_state(State(state): State<WebState>) -> Json<DashboardState> {
    Json(state.dashboard.read().await.clone())
}

async fn models(
    State(state): State<WebState>,
    Query(query): Query<CategoryQuery>,
) -> Json<Vec<Model>> {
    let category = query
        .category
        .filter(|c| !c.trim().is_empty())
        .map(Category::from);
    let dashboard = state.dashboard.read().await;
    Json(dashboard.models_in(category.as_ref()).into_iter().cloned().collect())
}

async fn model(
    State(state): State<WebState>,
    Path(id): Path<String>,
) -> Result<Json<Model>, (StatusCode, Json<ApiError>)> {
    let dashboard = state.dashboard.read().await;
    dashboard
        .model(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_err(StatusCode::NOT_FOUND, &format!("model {} not found", id)))
}

async fn refresh(
    State(state): State<WebState>,
    Query(query): Query<RefreshQuery>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, Json<ApiError>)> {
    let command = match query.target {
        RefreshTarget::Models => RefreshCommand::RefreshModels,
        RefreshTarget::Feeds => RefreshCommand::RefreshFeeds,
        RefreshTarget::All => RefreshCommand::RefreshAll,
    };
    match state.commands.try_send(command) {
        Ok(()) => Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "queued": true })))),
        Err(err) => {
            warn!("WebUI refresh rejected: {}", err);
            Err(api_err(StatusCode::SERVICE_UNAVAILABLE, "refresh queue is busy"))
        }
    }
}

fn api_err(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::new_shared;
    use chrono::Utc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn seeded() -> (String, mpsc::Receiver<RefreshCommand>) {
        let dashboard = new_shared();
        let models = vec![
            Model {
                id: "s1".to_string(),
                name: "Stock One".to_string(),
                category: Category::Stock,
                performance: 2.0,
                ..Model::default()
            },
            Model {
                id: "fx1".to_string(),
                name: "Forex One".to_string(),
                category: Category::Forex,
                performance: 4.0,
                ..Model::default()
            },
        ];
        dashboard.write().await.apply_models(0, Some(models), Utc::now());
        let (tx, rx) = mpsc::channel(1);
        (serve(router(dashboard, tx)).await, rx)
    }

    #[tokio::test]
    async fn test_models_filter_by_category() {
        let (base, _rx) = seeded().await;
        let models: Vec<Model> = reqwest::get(format!("{}/api/models?category=fx", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "fx1");

        let state: serde_json::Value = reqwest::get(format!("{}/api/state", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(state["models"][0]["rank"], 1);
        assert_eq!(state["models"][0]["id"], "fx1");
        assert!(state["feeds"]["models"]["updated_at"].is_string());
    }

    #[tokio::test]
    async fn test_health_reports_snapshot_size() {
        let (base, _rx) = seeded().await;
        let health: serde_json::Value = reqwest::get(format!("{}/api/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["ok"], true);
        assert_eq!(health["models"], 2);
        assert_eq!(health["rank_baseline"], true);
    }

    #[tokio::test]
    async fn test_index_page_renders_backend_text_as_text() {
        let (base, _rx) = seeded().await;
        let page = reqwest::get(format!("{}/", base)).await.unwrap().text().await.unwrap();
        assert!(page.contains("<table id=\"board\">"));
        assert!(!page.contains("innerHTML"));
        assert!(page.contains("td.textContent = text"));
    }

    #[tokio::test]
    async fn test_unknown_model_is_404() {
        let (base, _rx) = seeded().await;
        let res = reqwest::get(format!("{}/api/models/nope", base)).await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_queues_command_and_reports_busy() {
        let (base, mut rx) = seeded().await;
        let client = reqwest::Client::new();

        let res = client.post(format!("{}/api/refresh?target=feeds", base)).send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);

        let res = client.post(format!("{}/api/refresh", base)).send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(rx.recv().await, Some(RefreshCommand::RefreshFeeds));
    }
}
