use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fuelcell_core::{CurveAnalysis, FuelCellError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound(String),

    #[error("Upstream service error")]
    Upstream(String),

    #[error("Upstream service did not answer within {0} seconds")]
    DeadlineExceeded(u64),

    #[error("Internal server error")]
    Internal(String),

    /// Narrative failure reported alongside the numeric result that was already computed.
    #[error("{error}")]
    Partial {
        error: Box<ApiError>,
        analysis: Box<CurveAnalysis>,
    },
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CurveAnalysis>,
}

impl ApiError {
    pub fn with_analysis(self, analysis: CurveAnalysis) -> Self {
        ApiError::Partial {
            error: Box::new(self),
            analysis: Box::new(analysis),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Partial { error, .. } => error.status(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::InvalidInput(details)
            | ApiError::NotFound(details)
            | ApiError::Upstream(details)
            | ApiError::Internal(details) => Some(details.clone()).filter(|d| !d.is_empty()),
            ApiError::DeadlineExceeded(_) => None,
            ApiError::Partial { error, .. } => error.details(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            details: self.details(),
            analysis: match self {
                ApiError::Partial { analysis, .. } => Some(analysis.as_ref().clone()),
                _ => None,
            },
        }
    }
}

impl From<FuelCellError> for ApiError {
    fn from(err: FuelCellError) -> Self {
        match err {
            FuelCellError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            FuelCellError::UpstreamService(msg) => ApiError::Upstream(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, details = ?self.details(), "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, details = ?self.details(), "Request rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fuelcell_core::{CharacteristicPoint, DerivedMetrics};

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ApiError::from(FuelCellError::InvalidInput("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FuelCellError::UpstreamService("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(FuelCellError::Config("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::DeadlineExceeded(5).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::NotFound("p".into()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_partial_keeps_inner_status_and_details() {
        let point = CharacteristicPoint {
            current: 1.0,
            voltage: 1.0,
            power: 1.0,
        };
        let analysis = CurveAnalysis {
            max_power: point,
            max_voltage: point,
            metrics: DerivedMetrics {
                voltage_drop: 0.0,
                voltage_drop_percent: None,
                power_density: None,
                efficiency_ratio: None,
            },
        };

        let err = ApiError::Upstream("quota exceeded".into()).with_analysis(analysis);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let body = serde_json::to_value(err.body()).unwrap();
        assert_eq!(body["error"], "Upstream service error");
        assert_eq!(body["details"], "quota exceeded");
        assert_eq!(body["analysis"]["maxPower"]["power"], 1.0);
    }

    #[test]
    fn test_body_omits_empty_details() {
        let body = serde_json::to_value(ApiError::DeadlineExceeded(120).body()).unwrap();
        assert_eq!(
            body["error"],
            "Upstream service did not answer within 120 seconds"
        );
        assert!(body.get("details").is_none());
        assert!(body.get("analysis").is_none());
    }
}
