use crate::curve::{Curve, CurveAnalysis};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single curve index materialized as a named operating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicPoint {
    pub current: f64,
    pub voltage: f64,
    pub power: f64,
}

/// Ratios derived once per curve from the MPP and the maximum-voltage point.
///
/// Ratios are pre-formatted with a fixed number of decimals. A ratio whose
/// divisor is zero is `None` and serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub voltage_drop: f64,
    pub voltage_drop_percent: Option<String>,
    pub power_density: Option<String>,
    pub efficiency_ratio: Option<String>,
}

/// Cathode and anode relative humidity, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Humidity {
    pub cathode: f64,
    pub anode: f64,
}

impl Humidity {
    /// Humidity is only meaningful when both readings are present.
    pub fn from_readings(cathode: Option<f64>, anode: Option<f64>) -> Option<Self> {
        match (cathode, anode) {
            (Some(cathode), Some(anode)) => Some(Self { cathode, anode }),
            (None, None) => None,
            _ => {
                warn!(
                    ?cathode,
                    ?anode,
                    "Only one humidity reading supplied, treating humidity as not provided"
                );
                None
            }
        }
    }
}

/// Conditions under which a curve was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingContext {
    pub model_type: String,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
    pub humidity: Option<Humidity>,
}

/// Body of an analysis request as it arrives at the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub currents: Vec<f64>,
    pub voltages: Vec<f64>,
    pub powers: Vec<f64>,
    pub model_type: String,
    pub temperature: f64,
    pub hydrogen: f64,
    pub oxygen: f64,
    #[serde(rename = "RH_Cathode", default, skip_serializing_if = "Option::is_none")]
    pub rh_cathode: Option<f64>,
    #[serde(rename = "RH_Anode", default, skip_serializing_if = "Option::is_none")]
    pub rh_anode: Option<f64>,
}

impl AnalysisRequest {
    /// Validate the three sequences into a [`Curve`].
    pub fn curve(&self) -> Result<Curve> {
        Curve::new(
            self.currents.clone(),
            self.voltages.clone(),
            self.powers.clone(),
        )
    }

    pub fn operating_context(&self) -> OperatingContext {
        OperatingContext {
            model_type: self.model_type.clone(),
            temperature: self.temperature,
            hydrogen: self.hydrogen,
            oxygen: self.oxygen,
            humidity: Humidity::from_readings(self.rh_cathode, self.rh_anode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    #[serde(rename = "RH_Cathode", default, skip_serializing_if = "Option::is_none")]
    pub rh_cathode: Option<f64>,
    #[serde(rename = "RH_Anode", default, skip_serializing_if = "Option::is_none")]
    pub rh_anode: Option<f64>,
    pub metrics: DerivedMetrics,
}

/// Full analysis result: characteristic points, metrics and the narrative text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub summary: String,
    pub max_power: CharacteristicPoint,
    pub max_voltage: CharacteristicPoint,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResponse {
    pub fn new(summary: String, analysis: &CurveAnalysis, request: &AnalysisRequest) -> Self {
        Self {
            summary,
            max_power: analysis.max_power,
            max_voltage: analysis.max_voltage,
            metadata: AnalysisMetadata {
                rh_cathode: request.rh_cathode,
                rh_anode: request.rh_anode,
                metrics: analysis.metrics.clone(),
            },
        }
    }
}
