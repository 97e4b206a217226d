//! Record shapes exchanged with the prediction service and the prediction store.

use crate::curve::Curve;
use crate::error::{FuelCellError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of records returned by a "recent predictions" listing.
pub const RECENT_PREDICTIONS_LIMIT: usize = 10;

/// Human-readable name for a regression model identifier.
pub fn model_display_name(model_type: &str) -> &str {
    match model_type {
        "linear" => "Linear Regression",
        "svr" => "Support Vector Regression",
        "ann" => "Artificial Neural Network",
        "stack_model" => "Stack Model",
        "" => "Unknown",
        other => other,
    }
}

/// Operating conditions and current sweep to run through a prediction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub model_type: String,
    pub currents: Vec<f64>,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
}

impl PredictionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.model_type.trim().is_empty() {
            return Err(FuelCellError::InvalidInput(
                "modelType must not be empty".to_string(),
            ));
        }
        if self.currents.is_empty() {
            return Err(FuelCellError::InvalidInput(
                "currents must contain at least one value".to_string(),
            ));
        }
        Ok(())
    }

    /// Body understood by the prediction service.
    pub fn to_service_payload(&self) -> PredictionServicePayload {
        PredictionServicePayload {
            model_type: self.model_type.clone(),
            currents: self.currents.clone(),
            temperature: self.temperature,
            hydrogen: self.hydrogen,
            oxygen: self.oxygen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionServicePayload {
    pub model_type: String,
    #[serde(rename = "I")]
    pub currents: Vec<f64>,
    #[serde(rename = "T")]
    pub temperature: f64,
    #[serde(rename = "Hydrogen")]
    pub hydrogen: f64,
    #[serde(rename = "Oxygen")]
    pub oxygen: f64,
}

/// Curve predicted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionServiceOutput {
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
}

impl PredictionServiceOutput {
    pub fn into_curve(self) -> Result<Curve> {
        Curve::new(self.currents, self.voltages, self.powers)
    }
}

/// Predicted curve together with the conditions that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
    pub model_type: String,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
}

impl PredictionResult {
    pub fn new(request: &PredictionRequest, curve: Curve) -> Self {
        Self {
            currents: curve.currents().to_vec(),
            voltages: curve.voltages().to_vec(),
            powers: curve.powers().to_vec(),
            model_type: request.model_type.clone(),
            temperature: request.temperature,
            hydrogen: request.hydrogen,
            oxygen: request.oxygen,
        }
    }
}

/// Flat record accepted by the persistence store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrediction {
    pub model_type: String,
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
}

impl NewPrediction {
    pub fn validate(&self) -> Result<()> {
        Curve::new(
            self.currents.clone(),
            self.voltages.clone(),
            self.powers.clone(),
        )
        .map(|_| ())
    }

    pub fn into_record(self) -> PredictionRecord {
        PredictionRecord {
            id: Uuid::new_v4(),
            model_type: self.model_type,
            currents: self.currents,
            voltages: self.voltages,
            powers: self.powers,
            temperature: self.temperature,
            hydrogen: self.hydrogen,
            oxygen: self.oxygen,
            created_at: Utc::now(),
        }
    }
}

impl From<PredictionResult> for NewPrediction {
    fn from(result: PredictionResult) -> Self {
        Self {
            model_type: result.model_type,
            currents: result.currents,
            voltages: result.voltages,
            powers: result.powers,
            temperature: result.temperature,
            hydrogen: result.hydrogen,
            oxygen: result.oxygen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: Uuid,
    pub model_type: String,
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_display_names() {
        assert_eq!(model_display_name("svr"), "Support Vector Regression");
        assert_eq!(model_display_name("stack_model"), "Stack Model");
        assert_eq!(model_display_name("custom"), "custom");
        assert_eq!(model_display_name(""), "Unknown");
    }

    #[test]
    fn test_service_payload_field_names() {
        let request = PredictionRequest {
            model_type: "linear".to_string(),
            currents: vec![0.0, 10.0],
            temperature: 70.0,
            hydrogen: 1.0,
            oxygen: 2.0,
        };

        let value = serde_json::to_value(request.to_service_payload()).unwrap();
        assert_eq!(
            value,
            json!({"model_type": "linear", "I": [0.0, 10.0], "T": 70.0, "Hydrogen": 1.0, "Oxygen": 2.0})
        );
    }

    #[test]
    fn test_prediction_request_validation() {
        let mut request = PredictionRequest {
            model_type: "linear".to_string(),
            currents: vec![],
            temperature: 70.0,
            hydrogen: 1.0,
            oxygen: 2.0,
        };
        assert!(request.validate().is_err());

        request.currents.push(1.0);
        assert!(request.validate().is_ok());

        request.model_type = "  ".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_new_prediction_rejects_mismatched_curve() {
        let record = NewPrediction {
            model_type: "svr".to_string(),
            currents: vec![1.0, 2.0],
            voltages: vec![1.0],
            powers: vec![1.0, 2.0],
            temperature: 60.0,
            hydrogen: 1.0,
            oxygen: 1.0,
        };
        assert!(record.validate().is_err());
    }
}
