use crate::config::ApiConfig;
use crate::domain::{Category, Model, ModelChart, NewsItem, SocialPost, SystemStatus};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Everything the dashboard reads from or posts to the backend.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    async fn models(&self) -> Result<Vec<Model>>;
    async fn model_detail(&self, id: &str) -> Result<Model>;
    async fn model_chart(&self, id: &str) -> Result<ModelChart>;
    async fn news(&self, category: &Category) -> Result<Vec<NewsItem>>;
    async fn social(&self, category: &Category) -> Result<Vec<SocialPost>>;
    async fn system_status(&self) -> Result<SystemStatus>;
    async fn toggle_model(&self, id: &str, active: bool) -> Result<()>;
    async fn trigger_cycle(&self) -> Result<()>;
    async fn record_view(&self, id: &str) -> Result<()>;
}

/// Keys a list endpoint may wrap its array in.
const LIST_KEYS: &[&str] = &["models", "news", "posts", "social", "items", "data", "results"];

/// Pulls the item array out of a list response. Accepts a bare array or an
/// object wrapping one under a known key.
pub fn extract_list(value: serde_json::Value) -> Result<Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        serde_json::Value::Object(mut map) => {
            for key in LIST_KEYS {
                if let Some(serde_json::Value::Array(items)) = map.remove(*key) {
                    return Ok(items);
                }
            }
            Err(anyhow!("response object has no list field (tried {:?})", LIST_KEYS))
        }
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(anyhow!("expected a JSON list, got {}", json_kind(&other))),
    }
}

/// Decodes each element on its own; malformed elements are skipped.
pub fn decode_items<T: DeserializeOwned>(items: Vec<serde_json::Value>, what: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(v) => Some(v),
            Err(err) => {
                debug!("Skipping malformed {} entry: {}", what, err);
                None
            }
        })
        .collect();
    if decoded.len() < total {
        warn!("Skipped {} malformed {} entries out of {}", total - decoded.len(), what, total);
    }
    decoded
}

/// Some endpoints wrap single objects as `{"model": {...}}` or `{"data": {...}}`.
fn unwrap_object(value: serde_json::Value, key: &str) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.len() == 1 => {
            if let Some(inner) = map.remove(key).or_else(|| map.remove("data")) {
                inner
            } else {
                serde_json::Value::Object(map)
            }
        }
        other => other,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

#[derive(Serialize)]
struct TogglePayload {
    active: bool,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("modelboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => {
                let header_value = if self.config.token_prefix.is_empty() {
                    token.clone()
                } else {
                    format!("{} {}", self.config.token_prefix, token)
                };
                req.header(self.config.token_header.as_str(), header_value)
            }
            None => req,
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<serde_json::Value> {
        let req = self.authorize(self.client.get(url).query(query));
        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(anyhow!("GET {} failed: HTTP {}", url, res.status()));
        }
        parse_body(res).await
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<serde_json::Value> {
        let req = self.authorize(self.client.post(url).json(payload));
        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(anyhow!("POST {} failed: HTTP {}", url, res.status()));
        }
        parse_body(res).await
    }

    async fn get_list<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)], what: &str) -> Result<Vec<T>> {
        let body = self.get_json(url, query).await?;
        let items = extract_list(body).map_err(|e| anyhow!("{} from {}: {}", what, url, e))?;
        Ok(decode_items(items, what))
    }
}

/// Write endpoints often answer with an empty body; treat that as `null`.
async fn parse_body(res: reqwest::Response) -> Result<serde_json::Value> {
    let bytes = res.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn models(&self) -> Result<Vec<Model>> {
        let url = self.config.endpoint(&self.config.paths.models);
        self.get_list(&url, &[], "model").await
    }

    async fn model_detail(&self, id: &str) -> Result<Model> {
        let url = self.config.model_endpoint(&self.config.paths.model_detail, id);
        let body = self.get_json(&url, &[]).await?;
        Ok(serde_json::from_value(unwrap_object(body, "model"))?)
    }

    async fn model_chart(&self, id: &str) -> Result<ModelChart> {
        let url = self.config.model_endpoint(&self.config.paths.model_chart, id);
        let body = self.get_json(&url, &[]).await?;
        Ok(serde_json::from_value(unwrap_object(body, "chart"))?)
    }

    async fn news(&self, category: &Category) -> Result<Vec<NewsItem>> {
        let url = self.config.endpoint(&self.config.paths.news);
        self.get_list(&url, &[("category", category.as_str())], "news").await
    }

    async fn social(&self, category: &Category) -> Result<Vec<SocialPost>> {
        let url = self.config.endpoint(&self.config.paths.social);
        self.get_list(&url, &[("category", category.as_str())], "social").await
    }

    async fn system_status(&self) -> Result<SystemStatus> {
        let url = self.config.endpoint(&self.config.paths.system_status);
        let body = self.get_json(&url, &[]).await?;
        Ok(serde_json::from_value(unwrap_object(body, "status"))?)
    }

    async fn toggle_model(&self, id: &str, active: bool) -> Result<()> {
        let url = self.config.model_endpoint(&self.config.paths.toggle_model, id);
        self.post_json(&url, &TogglePayload { active }).await?;
        Ok(())
    }

    async fn trigger_cycle(&self) -> Result<()> {
        let url = self.config.endpoint(&self.config.paths.trigger_cycle);
        self.post_json(&url, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn record_view(&self, id: &str) -> Result<()> {
        let url = self.config.model_endpoint(&self.config.paths.model_view, id);
        self.post_json(&url, &serde_json::json!({})).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: String) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url,
            token: Some("tok".to_string()),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_extract_list_accepts_wrapped_and_bare() {
        assert_eq!(extract_list(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(extract_list(json!({"models": [1]})).unwrap().len(), 1);
        assert_eq!(extract_list(json!({"data": [1, 2, 3]})).unwrap().len(), 3);
        assert!(extract_list(json!(null)).unwrap().is_empty());
        assert!(extract_list(json!({"count": 2})).is_err());
        assert!(extract_list(json!("nope")).is_err());
    }

    #[test]
    fn test_decode_items_skips_malformed_entries() {
        let items = vec![
            json!({"id": "a", "performance": 1.0}),
            json!({"id": "b", "performance": "fast"}),
            json!({"id": "c"}),
        ];
        let models: Vec<Model> = decode_items(items, "model");
        assert_eq!(models.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_client_reads_lists_and_sends_auth() {
        let router = Router::new()
            .route(
                "/api/models",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({
                        "models": [
                            {"id": 1, "name": "A", "category": "stock", "performance": 2.0, "status": auth},
                            {"id": 2, "name": "B", "category": "forex", "performance": 4.0}
                        ]
                    }))
                }),
            )
            .route(
                "/api/news",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let category = q.get("category").cloned().unwrap_or_default();
                    Json(json!([{ "id": "n1", "title": format!("{} headline", category) }]))
                }),
            )
            .route(
                "/api/system/status",
                get(|| async { Json(json!({"status": {"running_agents": 2, "total_agents": 4}})) }),
            );
        let client = client_for(serve(router).await);

        let models = client.models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "1");
        assert_eq!(models[0].status, "Bearer tok");
        assert_eq!(models[1].category, Category::Forex);

        let news = client.news(&Category::Polymarket).await.unwrap();
        assert_eq!(news[0].title, "polymarket headline");

        let status = client.system_status().await.unwrap();
        assert_eq!(status.running_agents, 2);
        assert_eq!(status.total_agents, 4);
    }

    #[tokio::test]
    async fn test_client_reports_http_errors() {
        let router = Router::new().route(
            "/api/social",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let client = client_for(serve(router).await);

        let err = client.social(&Category::Stock).await.unwrap_err();
        assert!(err.to_string().contains("503"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_write_endpoints_post_to_templated_paths() {
        let toggles = Arc::new(AtomicUsize::new(0));
        let views = Arc::new(AtomicUsize::new(0));
        let toggles_route = toggles.clone();
        let views_route = views.clone();

        let router = Router::new()
            .route(
                "/api/models/:id/toggle",
                post(move |Path(id): Path<String>, Json(body): Json<serde_json::Value>| {
                    let toggles = toggles_route.clone();
                    async move {
                        assert_eq!(id, "m 1");
                        assert_eq!(body, json!({"active": false}));
                        toggles.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"ok": true}))
                    }
                }),
            )
            .route(
                "/api/models/:id/view",
                post(move |Path(_id): Path<String>| {
                    let views = views_route.clone();
                    async move {
                        views.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NO_CONTENT
                    }
                }),
            )
            .route(
                "/api/models/:id/chart",
                get(|| async {
                    Json(json!({"profit_history": [{"timestamp": "2024-01-01", "value": 3.5}]}))
                }),
            );
        let client = client_for(serve(router).await);

        client.toggle_model("m 1", false).await.unwrap();
        client.record_view("m 1").await.unwrap();
        let chart = client.model_chart("m 1").await.unwrap();

        assert_eq!(toggles.load(Ordering::SeqCst), 1);
        assert_eq!(views.load(Ordering::SeqCst), 1);
        assert_eq!(chart.profit_history[0].value, 3.5);
        assert!(client.trigger_cycle().await.is_err());
    }
}
