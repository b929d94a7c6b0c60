use axum::{
    extract::{Form, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use anyhow::Result;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::EstimatorConfig;
use crate::inference::PersonalityEstimator;
use crate::personality::{Levels, PersonalityProfile, Scores, Trait};

struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Estimator Error: {}", self.0),
        );
        tracing::error!("{}", message);
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for ServerError where E: Into<anyhow::Error> {
    fn from(err: E) -> Self { Self(err.into()) }
}

#[derive(Clone)]
pub struct AppState {
    pub estimator: Arc<PersonalityEstimator>,
}

#[derive(Deserialize)]
struct PageForm {
    #[serde(default)]
    user_text: String,
}

#[derive(Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct BatchPredictRequest {
    pub texts: Vec<String>,
}

/// Wire form of one prediction. Blank input serializes as
/// `{"scores": {}, "levels": {}, "summary": ""}`.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(serialize_with = "some_or_empty_map")]
    pub scores: Option<Scores>,
    #[serde(serialize_with = "some_or_empty_map")]
    pub levels: Option<Levels>,
    pub summary: String,
}

impl From<Option<PersonalityProfile>> for PredictResponse {
    fn from(profile: Option<PersonalityProfile>) -> Self {
        match profile {
            Some(p) => Self {
                scores: Some(p.scores),
                levels: Some(p.levels),
                summary: p.summary,
            },
            None => Self {
                scores: None,
                levels: None,
                summary: String::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchPredictResponse {
    pub results: Vec<PredictResponse>,
}

fn some_or_empty_map<T, S>(value: &Option<T>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    use serde::ser::SerializeMap;
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page).post(index_submit))
        .route("/health", get(|| async { "OK" }))
        .route("/v1/predict", post(predict_handler))
        .route("/v1/predict/batch", post(predict_batch_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: &EstimatorConfig, estimator: Arc<PersonalityEstimator>) -> Result<()> {
    let app = router(AppState { estimator });

    let addr = config.bind_addr()?;
    info!("🚀 Personality estimator listening at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn predict_text(state: &AppState, text: String) -> Result<Option<PersonalityProfile>> {
    let estimator = state.estimator.clone();
    let profile = tokio::task::spawn_blocking(move || estimator.predict(&text)).await??;
    Ok(profile)
}

async fn predict_handler(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ServerError> {
    let profile = predict_text(&state, req.text).await?;
    Ok(Json(profile.into()))
}

async fn predict_batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchPredictRequest>,
) -> Result<Json<BatchPredictResponse>, ServerError> {
    let estimator = state.estimator.clone();
    let profiles = tokio::task::spawn_blocking(move || estimator.predict_batch(&req.texts)).await??;
    Ok(Json(BatchPredictResponse {
        results: profiles.into_iter().map(PredictResponse::from).collect(),
    }))
}

async fn index_page() -> Html<String> {
    Html(render_page("", None))
}

async fn index_submit(
    State(state): State<AppState>,
    Form(form): Form<PageForm>,
) -> Result<Html<String>, ServerError> {
    let profile = predict_text(&state, form.user_text.clone()).await?;
    Ok(Html(render_page(&form.user_text, profile.as_ref())))
}

fn render_results(profile: &PersonalityProfile) -> String {
    let rows: String = Trait::ALL
        .iter()
        .map(|&t| {
            let score = profile.scores[t];
            let width = score.clamp(0.0, 100.0);
            format!(
                r#"<tr><td class="name">{}</td><td><div class="bar"><span style="width: {:.0}%"></span></div></td><td class="score">{:.2}</td><td class="level {}">{}</td></tr>"#,
                t,
                width,
                score,
                profile.levels[t].as_str().to_lowercase(),
                profile.levels[t]
            )
        })
        .collect();

    format!(
        r#"<section class="results">
        <h2>Your Big Five profile</h2>
        <table>{}</table>
        <p class="summary">{}</p>
    </section>"#,
        rows,
        html_escape::encode_text(&profile.summary)
    )
}

pub fn render_page(user_text: &str, profile: Option<&PersonalityProfile>) -> String {
    let results = profile.map(render_results).unwrap_or_default();

    format!(r####"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Big Five Personality Estimator</title>
    <style>
        body {{ font-family: -apple-system, system-ui, sans-serif; max-width: 760px; margin: 40px auto; padding: 0 16px; color: #1f2933; }}
        textarea {{ width: 100%; min-height: 160px; padding: 10px; font-size: 15px; border: 1px solid #cbd2d9; border-radius: 6px; }}
        button {{ margin-top: 12px; padding: 8px 20px; border: none; border-radius: 6px; background: #3b82f6; color: white; font-size: 15px; cursor: pointer; }}
        table {{ width: 100%; border-collapse: collapse; margin-top: 12px; }}
        td {{ padding: 6px 8px; }}
        td.name {{ text-transform: capitalize; width: 180px; }}
        td.score {{ text-align: right; width: 70px; font-variant-numeric: tabular-nums; }}
        .bar {{ background: #e4e7eb; border-radius: 4px; height: 10px; }}
        .bar span {{ display: block; height: 10px; border-radius: 4px; background: #3b82f6; }}
        .level.low {{ color: #9aa5b1; }}
        .level.medium {{ color: #d97706; }}
        .level.high {{ color: #059669; font-weight: 600; }}
        .summary {{ margin-top: 18px; line-height: 1.5; }}
    </style>
</head>
<body>
    <h1>Big Five Personality Estimator</h1>
    <form method="post" action="/">
        <label for="user_text">Write a few sentences about yourself:</label>
        <textarea id="user_text" name="user_text">{}</textarea>
        <button type="submit">Analyze</button>
    </form>
    {}
</body>
</html>"####, html_escape::encode_text(user_text), results)
}
