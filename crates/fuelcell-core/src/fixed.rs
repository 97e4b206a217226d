//! Fixed-decimal rendering of measurement values.

// Extra digits inspected to recognise a value sitting exactly on a rounding midpoint.
const MIDPOINT_DIGITS: usize = 30;

/// Render `value` with `decimals` places, rounding exact midpoints away from zero.
///
/// `format!("{:.N}")` rounds midpoints to even (`0.125` becomes `"0.12"`); report
/// figures round them up (`"0.13"`).
pub fn to_fixed(value: f64, decimals: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if !value.is_finite() {
        return value.to_string();
    }

    let expanded = format!("{:.*}", decimals + MIDPOINT_DIGITS, value.abs());
    let (kept, tail) = expanded.split_at(expanded.len() - MIDPOINT_DIGITS);
    let on_midpoint = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !on_midpoint {
        return format!("{:.*}", decimals, value);
    }

    let mut digits: Vec<char> = kept.trim_end_matches('.').chars().collect();
    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        match *digit {
            '.' => continue,
            '9' => *digit = '0',
            d => {
                *digit = (d as u8 + 1) as char;
                carry = false;
                break;
            }
        }
    }
    if carry {
        digits.insert(0, '1');
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}", sign, digits.into_iter().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoints_round_up() {
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(-0.125, 2), "-0.13");
    }

    #[test]
    fn test_carry_propagates() {
        assert_eq!(to_fixed(9.5, 0), "10");
        assert_eq!(to_fixed(99.5, 0), "100");
        assert_eq!(to_fixed(1.875, 2), "1.88");
        assert_eq!(to_fixed(19.75, 1), "19.8");
    }

    #[test]
    fn test_non_midpoints_match_standard_formatting() {
        // 1.005 is stored just below the midpoint
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(45.833333, 1), "45.8");
        assert_eq!(to_fixed(260.0, 2), "260.00");
        assert_eq!(to_fixed(0.001923, 4), "0.0019");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(to_fixed(-0.0, 2), "0.00");
    }
}
