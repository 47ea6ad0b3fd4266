//! Observation record and its validation state machine
//!
//! `pending` → `approved` | `rejected`. Both decided states are terminal.
//! Decision metadata exists exactly when the state is terminal, which the
//! `Option<ValidationMeta>` field and the database CHECK constraint both enforce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Validation lifecycle stage of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationState {
    /// Awaiting an admin decision (initial)
    Pending,
    /// Counted by aggregation and export (terminal)
    Approved,
    /// Excluded from every public view (terminal)
    Rejected,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationState::Pending => "pending",
            ValidationState::Approved => "approved",
            ValidationState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ValidationState::Pending)
    }
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ValidationState::Pending),
            "approved" => Ok(ValidationState::Approved),
            "rejected" => Ok(ValidationState::Rejected),
            other => Err(format!("unknown validation state '{}'", other)),
        }
    }
}

/// Admin decision on a pending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Terminal state this decision moves a record into
    pub fn target_state(&self) -> ValidationState {
        match self {
            Decision::Approve => ValidationState::Approved,
            Decision::Reject => ValidationState::Rejected,
        }
    }
}

impl FromStr for Decision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// Listing order by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Who decided, when, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMeta {
    pub decided_by: String,
    pub decided_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One classified, geotagged waste sighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub id: Uuid,
    pub contributor_id: String,
    /// Open category set; whatever the classifier emits
    pub label: String,
    /// Always within [0, 1]
    pub confidence: f64,
    pub lat: f64,
    pub lng: f64,
    /// Opaque handle owned by image storage
    pub image_ref: String,
    pub created_at: DateTime<Utc>,
    pub state: ValidationState,
    /// Present exactly when `state` is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationMeta>,
}

impl ObservationRecord {
    /// Legacy boolean view, derived from the state machine and never stored
    pub fn is_validated(&self) -> bool {
        self.state == ValidationState::Approved
    }
}

/// Input for `RecordStore::create`
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub contributor_id: String,
    pub label: String,
    pub confidence: f64,
    pub lat: f64,
    pub lng: f64,
    pub image_ref: String,
}

impl NewObservation {
    /// Check every field range; any failure is `InvalidObservation`
    pub fn validate(&self) -> Result<()> {
        require_non_blank("contributor_id", &self.contributor_id)?;
        require_non_blank("label", &self.label)?;
        require_non_blank("image_ref", &self.image_ref)?;

        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidObservation(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }

        validate_location(self.lat, self.lng)
    }
}

/// Latitude in [-90, 90], longitude in [-180, 180], both finite
pub fn validate_location(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidObservation(format!(
            "lat must be within [-90, 90], got {}",
            lat
        )));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(Error::InvalidObservation(format!(
            "lng must be within [-180, 180], got {}",
            lng
        )));
    }
    Ok(())
}

fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidObservation(format!("{} is required", field)));
    }
    Ok(())
}
