//! Characteristic point extraction over a current/voltage/power curve.
//!
//! Both point finders resolve ties by taking the first index that reaches the
//! maximum, scanning from index 0 upwards.

use crate::error::{FuelCellError, Result};
use crate::fixed::to_fixed;
use crate::types::{CharacteristicPoint, DerivedMetrics};
use serde::{Deserialize, Serialize};

/// Three index-aligned sequences of equal, non-zero length with finite values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    currents: Vec<f64>,
    voltages: Vec<f64>,
    powers: Vec<f64>,
}

impl Curve {
    pub fn new(currents: Vec<f64>, voltages: Vec<f64>, powers: Vec<f64>) -> Result<Self> {
        validate_shape(&currents, &voltages, &powers)?;

        for (name, values) in [
            ("currents", &currents),
            ("voltages", &voltages),
            ("powers", &powers),
        ] {
            if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                return Err(FuelCellError::InvalidInput(format!(
                    "{} contains a non-finite value at index {}",
                    name, index
                )));
            }
        }

        Ok(Self {
            currents,
            voltages,
            powers,
        })
    }

    pub fn len(&self) -> usize {
        self.currents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currents.is_empty()
    }

    pub fn currents(&self) -> &[f64] {
        &self.currents
    }

    pub fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    // Every index produced by first_max_index is in bounds for a validated curve.
    fn point(&self, index: usize) -> CharacteristicPoint {
        CharacteristicPoint {
            current: self.currents[index],
            voltage: self.voltages[index],
            power: self.powers[index],
        }
    }

    /// Maximum Power Point of this curve.
    pub fn max_power_point(&self) -> CharacteristicPoint {
        self.point(first_max_index(&self.powers))
    }

    /// Maximum-voltage (open-circuit) point of this curve.
    pub fn max_voltage_point(&self) -> CharacteristicPoint {
        self.point(first_max_index(&self.voltages))
    }

    /// Run the whole numeric path: both characteristic points and their metrics.
    pub fn analyze(&self) -> CurveAnalysis {
        let max_power = self.max_power_point();
        let max_voltage = self.max_voltage_point();
        CurveAnalysis {
            max_power,
            max_voltage,
            metrics: compute_metrics(&max_power, &max_voltage),
        }
    }
}

/// Output of the numeric path, independent of any narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveAnalysis {
    pub max_power: CharacteristicPoint,
    pub max_voltage: CharacteristicPoint,
    pub metrics: DerivedMetrics,
}

/// Point at the first index holding the largest power value.
pub fn find_max_power_point(
    currents: &[f64],
    voltages: &[f64],
    powers: &[f64],
) -> Result<CharacteristicPoint> {
    validate_shape(currents, voltages, powers)?;
    let index = first_max_index(powers);
    Ok(CharacteristicPoint {
        current: currents[index],
        voltage: voltages[index],
        power: powers[index],
    })
}

/// Point at the first index holding the largest voltage value.
pub fn find_max_voltage_point(
    currents: &[f64],
    voltages: &[f64],
    powers: &[f64],
) -> Result<CharacteristicPoint> {
    validate_shape(currents, voltages, powers)?;
    let index = first_max_index(voltages);
    Ok(CharacteristicPoint {
        current: currents[index],
        voltage: voltages[index],
        power: powers[index],
    })
}

/// Derive the voltage drop and efficiency ratios from the two characteristic points.
///
/// A ratio with a zero divisor is reported as `None` instead of a non-finite number.
pub fn compute_metrics(mpp: &CharacteristicPoint, ocv: &CharacteristicPoint) -> DerivedMetrics {
    let voltage_drop = ocv.voltage - mpp.voltage;

    DerivedMetrics {
        voltage_drop,
        voltage_drop_percent: ratio(voltage_drop, ocv.voltage)
            .map(|v| to_fixed(v * 100.0, 1)),
        power_density: ratio(mpp.power, mpp.current).map(|v| to_fixed(v, 2)),
        efficiency_ratio: ratio(mpp.voltage, mpp.power).map(|v| to_fixed(v, 4)),
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

fn validate_shape(currents: &[f64], voltages: &[f64], powers: &[f64]) -> Result<()> {
    if currents.is_empty() || voltages.is_empty() || powers.is_empty() {
        return Err(FuelCellError::InvalidInput(
            "currents, voltages and powers must each contain at least one value".to_string(),
        ));
    }
    if currents.len() != voltages.len() || currents.len() != powers.len() {
        return Err(FuelCellError::InvalidInput(format!(
            "curve sequences differ in length: currents={}, voltages={}, powers={}",
            currents.len(),
            voltages.len(),
            powers.len()
        )));
    }
    Ok(())
}

// Strictly-greater replacement keeps the first occurrence on ties.
fn first_max_index(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate().skip(1) {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Curve {
        Curve::new(vec![0.0, 1.0, 2.0], vec![5.0, 4.0, 3.0], vec![0.0, 4.0, 6.0]).unwrap()
    }

    #[test]
    fn test_characteristic_points() {
        let curve = sample();
        assert_eq!(
            curve.max_power_point(),
            CharacteristicPoint {
                current: 2.0,
                voltage: 3.0,
                power: 6.0
            }
        );
        assert_eq!(
            curve.max_voltage_point(),
            CharacteristicPoint {
                current: 0.0,
                voltage: 5.0,
                power: 0.0
            }
        );
    }

    #[test]
    fn test_free_functions_match_curve_methods() {
        let curve = sample();
        let mpp =
            find_max_power_point(curve.currents(), curve.voltages(), curve.powers()).unwrap();
        let ocv =
            find_max_voltage_point(curve.currents(), curve.voltages(), curve.powers()).unwrap();
        assert_eq!(mpp, curve.max_power_point());
        assert_eq!(ocv, curve.max_voltage_point());
    }

    #[test]
    fn test_ties_resolve_to_first_index() {
        let currents = [1.0, 2.0, 3.0, 4.0];
        let voltages = [4.0, 4.0, 2.0, 1.0];
        let powers = [4.0, 8.0, 6.0, 8.0];

        let mpp = find_max_power_point(&currents, &voltages, &powers).unwrap();
        assert_eq!(mpp.current, 2.0);

        let ocv = find_max_voltage_point(&currents, &voltages, &powers).unwrap();
        assert_eq!(ocv.current, 1.0);
    }

    #[test]
    fn test_mpp_power_is_maximum_for_varied_curves() {
        let cases: Vec<(Vec<f64>, Vec<f64>)> = vec![
            (vec![0.5], vec![0.9]),
            (vec![0.0, 10.0, 20.0, 30.0], vec![400.0, 330.0, 300.0, 200.0]),
            (vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -0.5]),
        ];

        for (currents, voltages) in cases {
            let powers: Vec<f64> = currents.iter().zip(&voltages).map(|(i, v)| i * v).collect();
            let mpp = find_max_power_point(&currents, &voltages, &powers).unwrap();
            let max = powers.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(mpp.power, max);

            let index = powers.iter().position(|p| *p == max).unwrap();
            assert_eq!(mpp.current, currents[index]);
            assert_eq!(mpp.voltage, voltages[index]);
        }
    }

    #[test]
    fn test_rejects_empty_and_mismatched_sequences() {
        let err = find_max_power_point(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, FuelCellError::InvalidInput(_)));

        let err = find_max_voltage_point(&[1.0, 2.0], &[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("differ in length"));

        assert!(Curve::new(vec![1.0], vec![1.0, 2.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let err = Curve::new(vec![0.0, 1.0], vec![1.0, f64::NAN], vec![0.0, 1.0]).unwrap_err();
        assert!(err.to_string().contains("voltages"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_metrics_from_characteristic_points() {
        let curve = sample();
        let metrics = compute_metrics(&curve.max_power_point(), &curve.max_voltage_point());

        assert_relative_eq!(metrics.voltage_drop, 2.0);
        assert_eq!(metrics.voltage_drop_percent.as_deref(), Some("40.0"));
        assert_eq!(metrics.power_density.as_deref(), Some("3.00"));
        assert_eq!(metrics.efficiency_ratio.as_deref(), Some("0.5000"));
    }

    #[test]
    fn test_zero_divisors_yield_missing_ratios() {
        let origin = CharacteristicPoint {
            current: 0.0,
            voltage: 0.0,
            power: 0.0,
        };
        let metrics = compute_metrics(&origin, &origin);

        assert_eq!(metrics.voltage_drop, 0.0);
        assert!(metrics.voltage_drop_percent.is_none());
        assert!(metrics.power_density.is_none());
        assert!(metrics.efficiency_ratio.is_none());
    }

    #[test]
    fn test_zero_mpp_current_keeps_other_ratios() {
        let mpp = CharacteristicPoint {
            current: 0.0,
            voltage: 3.0,
            power: 6.0,
        };
        let ocv = CharacteristicPoint {
            current: 0.0,
            voltage: 5.0,
            power: 0.0,
        };
        let metrics = compute_metrics(&mpp, &ocv);

        assert!(metrics.power_density.is_none());
        assert_eq!(metrics.voltage_drop_percent.as_deref(), Some("40.0"));
        assert_eq!(metrics.efficiency_ratio.as_deref(), Some("0.5000"));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let curve = sample();
        let first = curve.analyze();
        for _ in 0..5 {
            assert_eq!(curve.analyze(), first);
        }
    }

    #[test]
    fn test_ratio_midpoints_round_up() {
        let mpp = CharacteristicPoint {
            current: 8.0,
            voltage: 0.5,
            power: 1.0,
        };
        let ocv = CharacteristicPoint {
            current: 0.0,
            voltage: 0.8,
            power: 0.0,
        };

        let metrics = compute_metrics(&mpp, &ocv);
        assert_eq!(metrics.power_density.as_deref(), Some("0.13"));
        assert_eq!(metrics.voltage_drop_percent.as_deref(), Some("37.5"));
        assert_eq!(metrics.efficiency_ratio.as_deref(), Some("0.5000"));
    }
}
