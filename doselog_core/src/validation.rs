//! Range checks for entry fields.
//!
//! The store runs these on every add and update, whatever the caller has
//! already checked.

use crate::{Entry, EntryChanges, Error, Result};
use serde::{Deserialize, Serialize};

/// Highest accepted side-effect severity
pub const MAX_SEVERITY: u8 = 10;

/// Upper bounds for weight and dose
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Pounds
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,

    /// Milligrams
    #[serde(default = "default_max_dose")]
    pub max_dose: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_weight: default_max_weight(),
            max_dose: default_max_dose(),
        }
    }
}

fn default_max_weight() -> f64 {
    500.0
}

fn default_max_dose() -> f64 {
    20.0
}

impl Limits {
    /// Reject limits that would make every entry invalid
    pub fn check(&self) -> Result<()> {
        if !self.max_weight.is_finite() || self.max_weight <= 0.0 {
            return Err(Error::Config(format!(
                "max_weight must be a positive number, got {}",
                self.max_weight
            )));
        }
        if !self.max_dose.is_finite() || self.max_dose < 0.0 {
            return Err(Error::Config(format!(
                "max_dose must be a non-negative number, got {}",
                self.max_dose
            )));
        }
        Ok(())
    }
}

/// Weight must be finite, positive and at most `limits.max_weight`
pub fn validate_weight(weight: f64, limits: &Limits) -> Result<()> {
    if !weight.is_finite() {
        return Err(Error::Validation("weight must be a valid number".into()));
    }
    if weight <= 0.0 {
        return Err(Error::Validation(format!(
            "weight must be positive, got {}",
            weight
        )));
    }
    if weight > limits.max_weight {
        return Err(Error::Validation(format!(
            "weight must be at most {} lbs, got {}",
            limits.max_weight, weight
        )));
    }
    Ok(())
}

/// Dose must be finite, non-negative and at most `limits.max_dose`
pub fn validate_dose(dose: f64, limits: &Limits) -> Result<()> {
    if !dose.is_finite() {
        return Err(Error::Validation("dose must be a valid number".into()));
    }
    if dose < 0.0 {
        return Err(Error::Validation(format!(
            "dose cannot be negative, got {}",
            dose
        )));
    }
    if dose > limits.max_dose {
        return Err(Error::Validation(format!(
            "dose must be at most {} mg, got {}",
            limits.max_dose, dose
        )));
    }
    Ok(())
}

pub fn validate_severity(field: &str, value: u8) -> Result<()> {
    if value > MAX_SEVERITY {
        return Err(Error::Validation(format!(
            "{} must be between 0 and {}, got {}",
            field, MAX_SEVERITY, value
        )));
    }
    Ok(())
}

/// Validate every numeric field of a complete entry
pub fn validate_entry(entry: &Entry, limits: &Limits) -> Result<()> {
    validate_weight(entry.weight, limits)?;
    validate_dose(entry.dose, limits)?;
    validate_severity("nausea", entry.nausea)?;
    validate_severity("fatigue", entry.fatigue)?;
    validate_severity("gi", entry.gi)?;
    validate_severity("sleep", entry.sleep)?;
    Ok(())
}

/// Validate only the fields present in a change set
pub fn validate_changes(changes: &EntryChanges, limits: &Limits) -> Result<()> {
    if let Some(weight) = changes.weight {
        validate_weight(weight, limits)?;
    }
    if let Some(dose) = changes.dose {
        validate_dose(dose, limits)?;
    }
    for (field, value) in [
        ("nausea", changes.nausea),
        ("fatigue", changes.fatigue),
        ("gi", changes.gi),
        ("sleep", changes.sleep),
    ] {
        if let Some(value) = value {
            validate_severity(field, value)?;
        }
    }
    Ok(())
}
