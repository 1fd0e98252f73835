//! Splitting of NeuroML quantity strings such as `"0.025ms"` or `"-65 mV"`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{Result, WidgetsError};
use crate::introspect::Scalar;

static QUANTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*([-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?)\s*([A-Za-z_][A-Za-z0-9_]*)?\s*$",
    )
    .expect("quantity pattern is valid")
});

/// A magnitude with its (possibly empty) unit
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: String,
    /// The source text was written without a fraction or exponent
    pub integral: bool,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: unit.into(),
            integral: false,
        }
    }

    /// Same unit and integral style, new magnitude
    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: self.unit.clone(),
            integral: self.integral,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_empty()
    }

    /// The magnitude as it is written back, without the unit
    pub fn magnitude_text(&self) -> String {
        if self.integral && self.magnitude.fract() == 0.0 {
            format!("{:.0}", self.magnitude)
        } else {
            Scalar::Float(self.magnitude).to_string()
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.magnitude_text())?;
        if !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

/// Split a quantity string into magnitude and unit.
///
/// `"0.025ms"` gives `(0.025, "ms")`, `"123"` gives `(123, "")`.
pub fn split_quantity(text: &str) -> Result<Quantity> {
    let caps = QUANTITY_RE
        .captures(text)
        .ok_or_else(|| WidgetsError::Unit {
            value: text.to_string(),
        })?;
    let number = &caps[1];
    let magnitude = number.parse::<f64>().map_err(|_| WidgetsError::Unit {
        value: text.to_string(),
    })?;
    Ok(Quantity {
        magnitude,
        unit: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        integral: !number.contains(['.', 'e', 'E']),
    })
}

/// Whether `text` is a number followed by a unit
pub fn has_unit(text: &str) -> bool {
    split_quantity(text).is_ok_and(|q| !q.is_dimensionless())
}
