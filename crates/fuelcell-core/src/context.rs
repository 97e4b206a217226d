//! Deterministic numeric context for narrative generation.
//!
//! Every slot of [`AnalysisContext`] is a non-empty, pre-formatted string so
//! prompt rendering never has to deal with missing values.

use crate::config_manager::StackConfiguration;
use crate::curve::{Curve, CurveAnalysis};
use crate::fixed::to_fixed;
use crate::types::{Humidity, OperatingContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HUMIDITY_NOT_PROVIDED: &str = "Humidity data not provided";
pub const HUMIDITY_NOT_APPLICABLE: &str = "- Not applicable for this model type.";
pub const NOT_AVAILABLE: &str = "n/a";

/// Formatted values handed to the prompt template, one field per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisContext {
    pub model_type: String,
    pub temperature: String,
    pub hydrogen: String,
    pub oxygen: String,
    pub humidity_info: String,
    pub humidity_recommendation: String,
    pub current_range: String,
    pub voltage_range: String,
    pub power_range: String,
    pub max_power: String,
    pub max_power_current: String,
    pub max_power_voltage: String,
    pub max_voltage: String,
    pub avg_cell_voltage_mpp: String,
    pub avg_cell_ocv: String,
    pub voltage_drop: String,
    pub voltage_drop_percent: String,
    pub power_density: String,
    pub efficiency_ratio: String,
    pub cell_count: String,
    pub max_stack_voltage: String,
    pub max_cell_voltage: String,
    pub target_cell_voltage_min: String,
    pub target_cell_voltage_max: String,
}

impl AnalysisContext {
    /// Slot name to value, as consumed by the prompt template.
    pub fn variables(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("model_type", self.model_type.clone()),
            ("temperature", self.temperature.clone()),
            ("hydrogen", self.hydrogen.clone()),
            ("oxygen", self.oxygen.clone()),
            ("humidity_info", self.humidity_info.clone()),
            ("humidity_recommendation", self.humidity_recommendation.clone()),
            ("current_range", self.current_range.clone()),
            ("voltage_range", self.voltage_range.clone()),
            ("power_range", self.power_range.clone()),
            ("max_power", self.max_power.clone()),
            ("max_power_current", self.max_power_current.clone()),
            ("max_power_voltage", self.max_power_voltage.clone()),
            ("max_voltage", self.max_voltage.clone()),
            ("avg_cell_voltage_mpp", self.avg_cell_voltage_mpp.clone()),
            ("avg_cell_ocv", self.avg_cell_ocv.clone()),
            ("voltage_drop", self.voltage_drop.clone()),
            ("voltage_drop_percent", self.voltage_drop_percent.clone()),
            ("power_density", self.power_density.clone()),
            ("efficiency_ratio", self.efficiency_ratio.clone()),
            ("cell_count", self.cell_count.clone()),
            ("max_stack_voltage", self.max_stack_voltage.clone()),
            ("max_cell_voltage", self.max_cell_voltage.clone()),
            ("target_cell_voltage_min", self.target_cell_voltage_min.clone()),
            ("target_cell_voltage_max", self.target_cell_voltage_max.clone()),
        ])
    }
}

/// Builds [`AnalysisContext`] values for a configured stack.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    stack: StackConfiguration,
}

impl ContextBuilder {
    pub fn new(stack: StackConfiguration) -> Self {
        Self { stack }
    }

    pub fn stack(&self) -> &StackConfiguration {
        &self.stack
    }

    /// Stack voltage divided by the configured cell count. Display only.
    pub fn per_cell_voltage(&self, stack_voltage: f64) -> f64 {
        stack_voltage / f64::from(self.stack.cell_count.max(1))
    }

    pub fn build(
        &self,
        curve: &Curve,
        analysis: &CurveAnalysis,
        conditions: &OperatingContext,
    ) -> AnalysisContext {
        let (humidity_info, humidity_recommendation) = humidity_slots(conditions.humidity);
        let mpp = &analysis.max_power;
        let ocv = &analysis.max_voltage;
        let metrics = &analysis.metrics;

        AnalysisContext {
            model_type: conditions.model_type.clone(),
            temperature: conditions.temperature.to_string(),
            hydrogen: conditions.hydrogen.to_string(),
            oxygen: conditions.oxygen.to_string(),
            humidity_info,
            humidity_recommendation,
            current_range: format_range(curve.currents(), 2),
            voltage_range: format_range(curve.voltages(), 3),
            power_range: format_range(curve.powers(), 2),
            max_power: to_fixed(mpp.power, 2),
            max_power_current: to_fixed(mpp.current, 2),
            max_power_voltage: to_fixed(mpp.voltage, 3),
            max_voltage: to_fixed(ocv.voltage, 3),
            avg_cell_voltage_mpp: to_fixed(self.per_cell_voltage(mpp.voltage), 3),
            avg_cell_ocv: to_fixed(self.per_cell_voltage(ocv.voltage), 3),
            voltage_drop: to_fixed(metrics.voltage_drop, 3),
            voltage_drop_percent: or_not_available(&metrics.voltage_drop_percent),
            power_density: or_not_available(&metrics.power_density),
            efficiency_ratio: or_not_available(&metrics.efficiency_ratio),
            cell_count: self.stack.cell_count.to_string(),
            max_stack_voltage: to_fixed(self.stack.max_stack_voltage(), 0),
            max_cell_voltage: to_fixed(self.stack.max_cell_voltage, 2),
            target_cell_voltage_min: to_fixed(self.stack.target_cell_voltage_min, 1),
            target_cell_voltage_max: to_fixed(self.stack.target_cell_voltage_max, 1),
        }
    }
}

/// `"min - max"` with a fixed number of decimals.
pub fn format_range(values: &[f64], decimals: usize) -> String {
    if values.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    format!("{} - {}", to_fixed(min, decimals), to_fixed(max, decimals))
}

fn humidity_slots(humidity: Option<Humidity>) -> (String, String) {
    match humidity {
        Some(h) => (
            format!("Cathode RH: {}%\nAnode RH: {}%", h.cathode, h.anode),
            format!(
                "- Current RH: Cathode {}%, Anode {}%\n   - Recommendation: Ensure membrane stays hydrated (approx 80-100% RH) to maintain proton conductivity.",
                h.cathode, h.anode
            ),
        ),
        None => (
            HUMIDITY_NOT_PROVIDED.to_string(),
            HUMIDITY_NOT_APPLICABLE.to_string(),
        ),
    }
}

fn or_not_available(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
