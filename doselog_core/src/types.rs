//! Core domain types for the dose log.
//!
//! This module defines the record types the store works with:
//! - Entries and their stable identifiers
//! - Partial changes applied by `update`
//! - Selectors used to designate a single entry

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Opaque, stable identifier assigned to an entry when it is created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

const LEGACY_ROW_NAMESPACE: Uuid = Uuid::from_u128(0x5d0c_1e94_8a3b_4f27_9c61_0b7e_d2a4_f318);

impl EntryId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Name-based identifier, the same every time for the same `name`.
    /// Used for rows read from files that predate the id column.
    pub(crate) fn derived(name: &[u8]) -> Self {
        Self(Uuid::new_v5(&LEGACY_ROW_NAMESPACE, name))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| Error::Validation(format!("Invalid entry id '{}': {}", s, e)))
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One dated health-log record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub date: NaiveDate,
    /// Body weight in pounds
    pub weight: f64,
    /// Medication dose in milligrams
    pub dose: f64,
    pub nausea: u8,
    pub fatigue: u8,
    pub gi: u8,
    pub sleep: u8,
    pub notes: Option<String>,
}

impl Entry {
    /// Create an entry with a fresh id, no side effects and no notes
    pub fn new(date: NaiveDate, weight: f64, dose: f64) -> Self {
        Self {
            id: EntryId::new(),
            date,
            weight,
            dose,
            nausea: 0,
            fatigue: 0,
            gi: 0,
            sleep: 0,
            notes: None,
        }
    }

    /// Set the four side-effect severities (nausea, fatigue, GI, sleep)
    pub fn with_side_effects(mut self, nausea: u8, fatigue: u8, gi: u8, sleep: u8) -> Self {
        self.nausea = nausea;
        self.fatigue = fatigue;
        self.gi = gi;
        self.sleep = sleep;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = normalize_notes(Some(notes.into()));
        self
    }

    /// Human-readable row label, e.g. `2024-01-01 | 200.0 lbs | 2.0mg`.
    ///
    /// The label round-trips through [`Selector::from_label`].
    pub fn display_label(&self) -> String {
        format!("{} | {:?} lbs | {:?}mg", self.date, self.weight, self.dose)
    }
}

/// Empty or whitespace-only notes are stored as absent
pub(crate) fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}

// ============================================================================
// Partial updates
// ============================================================================

/// A partial record applied to an existing entry by `update`.
///
/// `notes: Some(None)` clears the notes; `notes: None` leaves them untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryChanges {
    pub weight: Option<f64>,
    pub dose: Option<f64>,
    pub nausea: Option<u8>,
    pub fatigue: Option<u8>,
    pub gi: Option<u8>,
    pub sleep: Option<u8>,
    pub notes: Option<Option<String>>,
}

impl EntryChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields present in this change set
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(weight) = self.weight {
            entry.weight = weight;
        }
        if let Some(dose) = self.dose {
            entry.dose = dose;
        }
        if let Some(nausea) = self.nausea {
            entry.nausea = nausea;
        }
        if let Some(fatigue) = self.fatigue {
            entry.fatigue = fatigue;
        }
        if let Some(gi) = self.gi {
            entry.gi = gi;
        }
        if let Some(sleep) = self.sleep {
            entry.sleep = sleep;
        }
        if let Some(notes) = &self.notes {
            entry.notes = normalize_notes(notes.clone());
        }
    }
}

// ============================================================================
// Selectors
// ============================================================================

/// Designates a single entry for update or delete
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// Match by stable identifier
    Id(EntryId),
    /// Match the first entry with exactly this date, weight and dose
    Composite {
        date: NaiveDate,
        weight: f64,
        dose: f64,
    },
}

impl Selector {
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Selector::Id(id) => entry.id == *id,
            Selector::Composite { date, weight, dose } => {
                entry.date == *date && entry.weight == *weight && entry.dose == *dose
            }
        }
    }

    /// Parse a label produced by [`Entry::display_label`]
    pub fn from_label(label: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid entry label '{}'", label));

        let mut parts = label.split('|').map(str::trim);
        let (Some(date), Some(weight), Some(dose), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
        let weight = weight
            .strip_suffix("lbs")
            .and_then(|w| w.trim().parse::<f64>().ok())
            .ok_or_else(invalid)?;
        let dose = dose
            .strip_suffix("mg")
            .and_then(|d| d.trim().parse::<f64>().ok())
            .ok_or_else(invalid)?;

        Ok(Selector::Composite { date, weight, dose })
    }
}

impl From<&Entry> for Selector {
    fn from(entry: &Entry) -> Self {
        Selector::Id(entry.id)
    }
}

impl From<EntryId> for Selector {
    fn from(id: EntryId) -> Self {
        Selector::Id(id)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "id {}", id),
            Selector::Composite { date, weight, dose } => {
                write!(f, "{} | {:?} lbs | {:?}mg", date, weight, dose)
            }
        }
    }
}
