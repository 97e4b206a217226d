//! Client for the external model-serving service.

use async_trait::async_trait;
use fuelcell_core::{
    FuelCellError, PredictionRequest, PredictionServiceConfig, PredictionServiceOutput, Result,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const PREDICT_PATH: &str = "/predict-output";

#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionServiceOutput>;
}

pub struct HttpPredictionClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    detail: Option<serde_json::Value>,
}

impl HttpPredictionClient {
    pub fn new(config: &PredictionServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FuelCellError::Config(format!("prediction client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, PREDICT_PATH)
    }
}

/// Message for a failed call: the service's `detail` when present.
fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(ServiceErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) => detail,
        Ok(ServiceErrorBody {
            detail: Some(detail),
        }) => detail.to_string(),
        _ => "Prediction service error".to_string(),
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionServiceOutput> {
        request.validate()?;

        let url = self.endpoint();
        info!(
            model_type = %request.model_type,
            points = request.currents.len(),
            "Requesting prediction"
        );

        let response = self
            .client
            .post(&url)
            .json(&request.to_service_payload())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Prediction service unreachable");
                FuelCellError::UpstreamService(format!("Prediction service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = upstream_message(&body);
            warn!(status = status.as_u16(), message = %message, "Prediction service rejected request");

            return Err(if status.is_client_error() {
                FuelCellError::InvalidInput(message)
            } else {
                FuelCellError::UpstreamService(format!("{} ({})", message, status))
            });
        }

        let output = response
            .json::<PredictionServiceOutput>()
            .await
            .map_err(|e| {
                FuelCellError::UpstreamService(format!("Malformed prediction response: {}", e))
            })?;

        output.clone().into_curve().map_err(|e| {
            FuelCellError::UpstreamService(format!("Prediction service returned {}", e))
        })?;

        Ok(output)
    }
}
