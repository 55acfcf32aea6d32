//! Candidate profile model consumed by the matching pipelines.
//!
//! A profile carries up to three semantic field embeddings, one per
//! [`ProfileField`]. Matching requires at least the professional-summary
//! vector; older profiles that predate the three-field format may instead
//! carry a single legacy embedding, which is accepted as a fallback.


use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::{MatchError, Result};

/// The semantic field a profile embedding represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    ProfessionalSummary,
    JobPreferences,
    Interests,
}

impl fmt::Display for ProfileField {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfessionalSummary => write!(f, "professional_summary"),
            Self::JobPreferences => write!(f, "job_preferences"),
            Self::Interests => write!(f, "interests"),
        }
    }
}

/// A fixed-dimension embedding labeled with the field it represents.
///
/// Produced once per profile-field update and immutable until the field's
/// text is regenerated, at which point it is replaced whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileVector {
    pub field: ProfileField,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate_id: String,
    pub full_name: String,
    #[serde(default)]
    pub current_title: String,
    #[serde(default)]
    pub current_company: String,
    #[serde(default)]
    pub location: String,
    /// Text of the three semantic summaries; embeddings in `vectors` are
    /// derived from these.
    #[serde(default)]
    pub professional_summary: String,
    #[serde(default)]
    pub job_preferences: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub vectors: Vec<ProfileVector>,
    /// Single-embedding format from before the three-field summaries.
    #[serde(default)]
    pub legacy_embedding: Option<Vec<f32>>,
}

impl CandidateProfile {
    /// The embedding for a specific semantic field, if present.
    #[inline]
    pub fn vector(&self, field: ProfileField) -> Option<&[f32]> {
        self.vectors
            .iter()
            .find(|v| v.field == field)
            .map(|v| v.embedding.as_slice())
    }

    /// The professional-summary embedding used for matching.
    ///
    /// Falls back to the legacy single embedding when the profile has not
    /// been re-vectorized into the three-field format yet. A profile with
    /// neither cannot be matched.
    #[inline]
    pub fn primary_vector(&self) -> Result<&[f32]> {
        if let Some(v) = self.vector(ProfileField::ProfessionalSummary) {
            return Ok(v);
        }

        if let Some(legacy) = self.legacy_embedding.as_deref() {
            warn!(
                "Using legacy embedding for candidate {}",
                self.candidate_id
            );
            return Ok(legacy);
        }

        Err(MatchError::MissingEmbedding(
            ProfileField::ProfessionalSummary,
        ))
    }

    /// Compact single-string summary of the candidate, used as the subject
    /// context for judgment gateway calls.
    #[inline]
    pub fn summary_context(&self) -> String {
        let mut header = self.full_name.clone();
        if !self.current_title.is_empty() {
            header.push_str(", ");
            header.push_str(&self.current_title);
        }
        if !self.current_company.is_empty() {
            header.push_str(" at ");
            header.push_str(&self.current_company);
        }
        let mut parts = vec![header];
        if !self.professional_summary.is_empty() {
            parts.push(self.professional_summary.clone());
        }
        if !self.job_preferences.is_empty() {
            parts.push(self.job_preferences.clone());
        }
        if !self.interests.is_empty() {
            parts.push(self.interests.clone());
        }
        parts.join("\n")
    }
}
