use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::attributes::{ExperienceLevel, Language, Location};

/// A job seeker's structured attributes, as read by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub preferred_location: Option<Location>,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default)]
    pub languages: BTreeSet<Language>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: String,
    pub skills: Vec<String>,
    pub experience_level: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub willing_to_relocate: bool,
    pub languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CandidateRow> for CandidateProfile {
    type Error = String;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let experience_level = row
            .experience_level
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ExperienceLevel>)
            .transpose()?;

        let languages = row
            .languages
            .iter()
            .map(|l| l.parse::<Language>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(CandidateProfile {
            id: row.id,
            skills: row.skills,
            experience_level,
            preferred_location: Location::from_parts(row.city, row.region, row.country),
            willing_to_relocate: row.willing_to_relocate,
            languages,
        })
    }
}
