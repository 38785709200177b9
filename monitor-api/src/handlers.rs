use crate::{
    render::{render_dashboard, render_json, sort_metrics, DEFAULT_SORT_KEY},
    state::AppState,
    ApiResult,
};
use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{Html, IntoResponse},
};
use chrono::Utc;
use tracing::{error, info};

/// First `sort` value of the query string. Repeated or undecodable
/// parameters never reject the request.
pub fn sort_param(raw_query: Option<&str>) -> String {
    raw_query
        .and_then(|query| serde_urlencoded::from_str::<Vec<(String, String)>>(query).ok())
        .and_then(|pairs| pairs.into_iter().find(|(key, _)| key == "sort"))
        .map(|(_, value)| value)
        .unwrap_or_else(|| DEFAULT_SORT_KEY.to_string())
}

pub async fn get_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let metrics = state.collect_metrics().await.inspect_err(|e| {
        error!("Failed to collect metrics: {}", e);
    })?;

    let body = render_json(&metrics)?;
    info!("Serving {} metrics as JSON", metrics.len());

    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> ApiResult<Html<String>> {
    let sort_key = sort_param(raw_query.as_deref());
    let sort_key = sort_key.as_str();

    let mut metrics = state.collect_metrics().await.inspect_err(|e| {
        error!("Failed to collect metrics: {}", e);
    })?;

    sort_metrics(&mut metrics, sort_key);
    let page = render_dashboard(&metrics, sort_key, Utc::now()).inspect_err(|e| {
        error!("Failed to render dashboard: {}", e);
    })?;

    info!(
        "Serving dashboard with {} markets sorted by {}",
        metrics.len(),
        sort_key
    );
    Ok(Html(page))
}
