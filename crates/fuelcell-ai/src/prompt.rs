//! Prompt template for the fuel cell narrative.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern"));

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing prompt variable: {0}")]
    MissingVariable(String),
}

/// Text with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholders(&self) -> BTreeSet<String> {
        PLACEHOLDER
            .captures_iter(&self.text)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Substitute every placeholder; fails on the first one with no value.
    pub fn render<K, V>(&self, variables: &BTreeMap<K, V>) -> Result<String, PromptError>
    where
        K: AsRef<str> + Ord,
        V: AsRef<str>,
    {
        let lookup: BTreeMap<&str, &str> = variables
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();

        if let Some(missing) = self
            .placeholders()
            .into_iter()
            .find(|name| !lookup.contains_key(name.as_str()))
        {
            return Err(PromptError::MissingVariable(missing));
        }

        Ok(PLACEHOLDER
            .replace_all(&self.text, |caps: &Captures| {
                lookup.get(&caps[1]).copied().unwrap_or_default().to_string()
            })
            .into_owned())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(FUEL_CELL_ANALYSIS_TEMPLATE)
    }
}

pub const FUEL_CELL_ANALYSIS_TEMPLATE: &str = r####"You are an experienced electrochemist specialising in PEM (Proton Exchange Membrane) fuel cells.

## STACK CONFIGURATION:
The data below belongs to a PEMFC stack with these fixed properties. Interpret every voltage and power figure in this context:
* **Stack Size:** {cell_count} cells connected in series.
* **Theoretical Limits:** Max stack voltage ~{max_stack_voltage}V ({max_cell_voltage}V per cell).
* **Practical Target:** {target_cell_voltage_min}V - {target_cell_voltage_max}V per cell under load.
* **Goal:** The curve comes from a prediction model used to explore operating conditions without physical testing.

## OPERATING CONDITIONS:
Model Type: {model_type}
Operating Temperature: {temperature}°C
Hydrogen Flow Rate: {hydrogen} L/min
Oxygen Flow Rate: {oxygen} L/min
{humidity_info}

## PERFORMANCE DATA SUMMARY:
Current Range: {current_range} A
Stack Voltage Range: {voltage_range} V
Power Output Range: {power_range} W

## CRITICAL PERFORMANCE POINTS:
**Maximum Power Point (MPP):**
- Power Output: {max_power} W
- Operating Current: {max_power_current} A
- Stack Voltage: {max_power_voltage} V
- **Avg. Cell Voltage at MPP:** {avg_cell_voltage_mpp} V (Stack V / {cell_count})

**Maximum Voltage Point (Open Circuit):**
- Stack Voltage: {max_voltage} V
- **Avg. Cell OCV:** {avg_cell_ocv} V (Stack V / {cell_count})

**Derived Metrics:**
- Voltage drop OCV to MPP: {voltage_drop} V ({voltage_drop_percent}%)
- Power per ampere at MPP: {power_density} W/A
- Voltage per watt at MPP: {efficiency_ratio} V/W

## ANALYSIS REQUIREMENTS:

### Summary
Give a 2-3 sentence summary and state whether the average cell voltage at MPP ({avg_cell_voltage_mpp} V) meets the practical target of {target_cell_voltage_min}-{target_cell_voltage_max} V.

### Key Findings
1. **MPP Analysis:** explain why maximum power occurs at {max_power_current} A and whether that point lies in the ohmic or the concentration loss region.
2. **Polarization Behavior:** analyse the drop from {max_voltage} V to {max_power_voltage} V with reference to the activation, ohmic and mass transport regions.
3. **Efficiency:** discuss voltage efficiency at MPP relative to the theoretical maximum.

### Performance Analysis
- **Temperature Effects:** impact of {temperature}°C on performance (Nernst voltage, membrane conductivity, reaction kinetics).
- **Gas Flow Dynamics:** whether {hydrogen} L/min H2 and {oxygen} L/min O2 suit {max_power_current} A operation (stoichiometric ratio).
- **Humidity:**
{humidity_recommendation}
- **Limiting Factors:** the dominant losses (activation, ohmic, concentration polarization).

### Recommendations
Concrete operating changes that would move the stack towards the practical target.

## GUIDELINES:
- Treat all voltages as **stack voltage** (sum of {cell_count} cells).
- Start directly with the heading "### Summary" and keep the headings Summary, Key Findings, Performance Analysis, Recommendations.
- Do not describe yourself; answer with the sections only.
"####;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let template = PromptTemplate::new("P={max_power} W at {max_power_current} A; P again {max_power}");
        let vars = BTreeMap::from([("max_power", "6.00"), ("max_power_current", "2.00")]);

        assert_eq!(
            template.render(&vars).unwrap(),
            "P=6.00 W at 2.00 A; P again 6.00"
        );
    }

    #[test]
    fn test_render_reports_missing_variable() {
        let template = PromptTemplate::new("{present} {absent}");
        let vars = BTreeMap::from([("present", "x")]);

        assert_eq!(
            template.render(&vars),
            Err(PromptError::MissingVariable("absent".to_string()))
        );
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let template = PromptTemplate::new("{ not a slot } {1abc}");
        assert!(template.placeholders().is_empty());
        let vars: BTreeMap<&str, &str> = BTreeMap::new();
        assert_eq!(template.render(&vars).unwrap(), "{ not a slot } {1abc}");
    }

    #[test]
    fn test_default_template_uses_only_context_slots() {
        let slots = [
            "model_type",
            "temperature",
            "hydrogen",
            "oxygen",
            "humidity_info",
            "humidity_recommendation",
            "current_range",
            "voltage_range",
            "power_range",
            "max_power",
            "max_power_current",
            "max_power_voltage",
            "max_voltage",
            "avg_cell_voltage_mpp",
            "avg_cell_ocv",
            "voltage_drop",
            "voltage_drop_percent",
            "power_density",
            "efficiency_ratio",
            "cell_count",
            "max_stack_voltage",
            "max_cell_voltage",
            "target_cell_voltage_min",
            "target_cell_voltage_max",
        ];

        for placeholder in PromptTemplate::default().placeholders() {
            assert!(
                slots.contains(&placeholder.as_str()),
                "unexpected placeholder {}",
                placeholder
            );
        }
    }
}
