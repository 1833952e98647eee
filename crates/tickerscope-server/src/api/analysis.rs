use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use tickerscope_analysis::{SentimentReport, TickerReport};

use crate::middleware::RequestId;

use super::{map_analysis_error, map_json_rejection, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SentimentRequest {
    pub groups: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TickersRequest {
    pub texts: Vec<String>,
}

pub(super) async fn analyze_sentiment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<SentimentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SentimentReport>>, ApiError> {
    let Json(request) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let report = state
        .pipeline
        .analyze_sentiment(request.groups)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn find_tickers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<TickersRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TickerReport>>, ApiError> {
    let Json(request) = payload.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;

    let report = state
        .pipeline
        .find_tickers(request.texts)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}
