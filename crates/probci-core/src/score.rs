//! Fixed-precision score scaling.
//!
//! Scores arrive as binary floats in `[0, 1]`. They are rounded to
//! [`ScaledScore::DECIMAL_PLACES`] decimal places and multiplied by 100; the
//! result must be a whole number of percentage points. Any remainder means
//! the scoring system drifted and is reported as a failure.

use std::fmt;

/// A score rounded to 15 decimal places and scaled by 100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledScore {
    repr: String,
    integral: bool,
}

impl ScaledScore {
    pub const DECIMAL_PLACES: usize = 15;

    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return Self {
                repr: score.to_string(),
                integral: false,
            };
        }

        // `{:.15}` rounds the exact binary value, so the digits below are the
        // decimal rounding of the float and not of its shortest repr.
        let fixed = format!("{:.*}", Self::DECIMAL_PLACES, score);
        let (sign, digits) = match fixed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", fixed.as_str()),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let fraction = format!("{fraction:0<width$}", width = Self::DECIMAL_PLACES);
        let (percent_digits, remainder) = fraction.split_at(2);

        let shifted = format!("{whole}{percent_digits}");
        let shifted = match shifted.trim_start_matches('0') {
            "" => "0",
            trimmed => trimmed,
        };

        let integral = remainder.bytes().all(|b| b == b'0');
        // Scaling by 100 keeps the full 15 fractional digits of the rounded
        // value, so the two digits shifted out come back as trailing zeros.
        let repr = if integral {
            format!("{sign}{shifted}")
        } else {
            format!("{sign}{shifted}.{remainder}00")
        };

        Self { repr, integral }
    }

    /// Whether the scaled score has no fractional remainder.
    pub fn is_integral(&self) -> bool {
        self.integral
    }
}

impl fmt::Display for ScaledScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}
