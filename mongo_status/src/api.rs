use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::ProbeMetrics;
use crate::report::{Report, ReportBuilder};

#[derive(Clone)]
struct RouterState {
    builder: Arc<ReportBuilder>,
    metrics: Arc<ProbeMetrics>,
    page: Arc<String>,
}

pub fn routes(builder: Arc<ReportBuilder>, metrics: Arc<ProbeMetrics>) -> Router {
    let settings = builder.settings();
    let page = include_str!("../index.html")
        .replace("{{title}}", &settings.title)
        .replace("{{uri_env}}", &settings.uri_env)
        .replace("{{refresh_secs}}", &settings.refresh_secs.to_string());

    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status_json))
        .route("/api/status.txt", get(status_text))
        .route("/metrics", get(metrics_handler))
        .with_state(RouterState {
            builder,
            metrics,
            page: Arc::new(page),
        })
}

async fn index(State(this): State<RouterState>) -> Html<String> {
    Html(this.page.as_ref().clone())
}

#[derive(Deserialize)]
struct StatusQuery {
    /// Also return the plain text rendering
    #[serde(default)]
    text: bool,
}

#[derive(Serialize)]
struct StatusView {
    #[serde(flatten)]
    report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

async fn status_json(
    State(this): State<RouterState>,
    Query(q): Query<StatusQuery>,
) -> Json<StatusView> {
    let report = this.builder.run_cycle().await;
    let text = q.text.then(|| report.render_text());
    Json(StatusView { report, text })
}

async fn status_text(State(this): State<RouterState>) -> String {
    this.builder.run_cycle().await.render_text()
}

async fn metrics_handler(State(this): State<RouterState>) -> String {
    this.metrics.export()
}
