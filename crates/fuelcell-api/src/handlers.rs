use crate::{ApiError, ApiJson, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use fuelcell_core::{
    AnalysisRequest, AnalysisResponse, CurveAnalysis, NewPrediction, Preview, PredictionRecord,
    PredictionRequest, PredictionResult, ReportBlock, ReportSection, RECENT_PREDICTIONS_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct SegmentRequest {
    pub summary: String,
}

#[derive(Serialize, Deserialize)]
pub struct SectionEntry {
    pub keyword: String,
    pub title: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SegmentResponse {
    pub preview: Preview,
    pub sections: Vec<SectionEntry>,
    pub blocks: Vec<ReportBlock>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Numeric path only; never calls the generation service.
pub async fn curve_analysis(ApiJson(request): ApiJson<AnalysisRequest>) -> ApiResult<Json<CurveAnalysis>> {
    let curve = request.curve()?;
    let analysis = curve.analyze();
    info!(
        points = curve.len(),
        max_power = analysis.max_power.power,
        "Curve analysed"
    );
    Ok(Json(analysis))
}

pub async fn ai_analysis(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AnalysisRequest>,
) -> ApiResult<Json<AnalysisResponse>> {
    let curve = request.curve()?;
    let analysis = curve.analyze();
    info!(
        points = curve.len(),
        model_type = %request.model_type,
        max_power = analysis.max_power.power,
        "Curve analysed"
    );

    let Some(narrator) = state.narrator.as_ref() else {
        return Err(
            ApiError::Internal("Narrative generation is not configured".to_string())
                .with_analysis(analysis),
        );
    };

    let context = state
        .context_builder
        .build(&curve, &analysis, &request.operating_context());

    let deadline = Duration::from_secs(state.config.llm.deadline_secs);
    let start = Instant::now();
    let summary = match timeout(deadline, narrator.request(&context)).await {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => return Err(ApiError::from(e).with_analysis(analysis)),
        Err(_) => {
            warn!(
                deadline_secs = deadline.as_secs(),
                provider = narrator.provider_name(),
                "Narrative request cancelled at deadline"
            );
            return Err(ApiError::DeadlineExceeded(deadline.as_secs()).with_analysis(analysis));
        }
    };

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "AI analysis complete"
    );
    Ok(Json(AnalysisResponse::new(summary, &analysis, &request)))
}

pub async fn segment_report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SegmentRequest>,
) -> ApiResult<Json<SegmentResponse>> {
    let report = state.segmenter.segment(&request.summary);
    let preview = state.preview.extract(&request.summary);

    let sections = ReportSection::ALL
        .iter()
        .map(|section| {
            let view = report.section(section.keyword());
            SectionEntry {
                keyword: section.keyword().to_string(),
                title: section.title().to_string(),
                available: view.is_available(),
                body: view.body().map(str::to_string),
            }
        })
        .collect();

    Ok(Json(SegmentResponse {
        preview,
        sections,
        blocks: report.blocks().to_vec(),
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PredictionRequest>,
) -> ApiResult<Json<PredictionResult>> {
    request.validate()?;
    let output = state.predictions.predict(&request).await?;
    let curve = output.into_curve()?;
    info!(
        model_type = %request.model_type,
        points = curve.len(),
        "Prediction received"
    );
    Ok(Json(PredictionResult::new(&request, curve)))
}

pub async fn create_prediction(
    State(state): State<AppState>,
    ApiJson(prediction): ApiJson<NewPrediction>,
) -> ApiResult<Json<PredictionRecord>> {
    let record = state.store.create(prediction).await?;
    info!(id = %record.id, "Prediction saved");
    Ok(Json(record))
}

pub async fn list_predictions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PredictionRecord>>> {
    Ok(Json(state.store.recent(RECENT_PREDICTIONS_LIMIT).await?))
}

pub async fn get_prediction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PredictionRecord>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::InvalidInput(format!("Invalid prediction id: {}", id)))?;

    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Prediction {} not found", id)))
}
