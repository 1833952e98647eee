//! Bare request and response shapes kept for existing clients: no envelope,
//! the body is the input array itself.

use std::collections::BTreeSet;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_analysis_error, map_json_rejection, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeResponse {
    pub results: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub(super) struct FindTickersResponse {
    pub symbols: BTreeSet<String>,
}

pub(super) async fn analyze(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Vec<Vec<String>>>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(groups) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let report = state
        .pipeline
        .analyze_sentiment(groups)
        .await
        .map_err(|e| map_analysis_error(req_id.0, &e))?;

    Ok(Json(AnalyzeResponse {
        results: report.results,
    }))
}

pub(super) async fn find_tickers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<FindTickersResponse>, ApiError> {
    let Json(texts) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let report = state
        .pipeline
        .find_tickers(texts)
        .await
        .map_err(|e| map_analysis_error(req_id.0, &e))?;

    Ok(Json(FindTickersResponse {
        symbols: report.symbols,
    }))
}
