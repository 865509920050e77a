use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::attributes::{ContractType, ExperienceLevel, Language, Location};

fn default_open() -> bool {
    true
}

/// An employer's role requirements, as read by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub min_experience: Option<ExperienceLevel>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub contract_type: ContractType,
    #[serde(default)]
    pub language_requirement: Option<Language>,
    #[serde(default = "default_open")]
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub required_skills: Vec<String>,
    pub min_experience: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub contract_type: String,
    pub language_requirement: Option<String>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for JobPosting {
    type Error = String;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let min_experience = row
            .min_experience
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ExperienceLevel>)
            .transpose()?;
        let language_requirement = row
            .language_requirement
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<Language>)
            .transpose()?;

        Ok(JobPosting {
            id: row.id,
            title: row.title,
            category: row.category,
            required_skills: row.required_skills,
            min_experience,
            location: Location::from_parts(row.city, row.region, row.country),
            contract_type: row.contract_type.parse()?,
            language_requirement,
            is_open: row.is_open,
        })
    }
}
