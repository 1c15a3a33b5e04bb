//! Projects and weekly progress updates.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{PERCENT_MAX, PERCENT_MIN};
use crate::error::CoreError;

/// A selectable project (`projects` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
}

/// Row inserted into `project_updates`.
///
/// `None` fields are omitted from the payload so PostgREST applies column defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectUpdate {
    pub project_id: String,
    pub updated_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_travaux: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_paiements: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pv_chantier: Option<NaiveDate>,
    pub commentaires: String,
}

/// Form input for a progress update, before the author is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateInput {
    pub progress_travaux: Option<f64>,
    pub progress_paiements: Option<f64>,
    pub pv_date: Option<NaiveDate>,
    pub commentaires: String,
}

impl UpdateInput {
    /// Check both percentages and attach project and author.
    pub fn into_update(
        self,
        project_id: &str,
        updated_by: &str,
    ) -> Result<ProjectUpdate, CoreError> {
        if project_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("no project selected".to_owned()));
        }
        validate_percentage("progress_travaux", self.progress_travaux)?;
        validate_percentage("progress_paiements", self.progress_paiements)?;
        Ok(ProjectUpdate {
            project_id: project_id.to_owned(),
            updated_by: updated_by.to_owned(),
            progress_travaux: self.progress_travaux,
            progress_paiements: self.progress_paiements,
            pv_chantier: self.pv_date,
            commentaires: self.commentaires,
        })
    }
}

/// Lenient percentage parsing: blank or garbage yields `None`, `,` is a decimal separator.
#[must_use]
pub fn pct_or_none(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn validate_percentage(field: &str, value: Option<f64>) -> Result<(), CoreError> {
    match value {
        Some(v) if !(PERCENT_MIN..=PERCENT_MAX).contains(&v) => Err(CoreError::InvalidInput(
            format!("{field} must be between {PERCENT_MIN} and {PERCENT_MAX}, got {v}"),
        )),
        _ => Ok(()),
    }
}

/// Parse the optional PV date sent by an HTML date input (`YYYY-MM-DD`).
pub fn parse_pv_date(raw: Option<&str>) -> Result<Option<NaiveDate>, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| CoreError::InvalidInput(format!("invalid PV date '{raw}': {e}")))
}

/// Accepts both integer and text primary keys.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id value: {other}"))),
    }
}
