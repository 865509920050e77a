//! Feature Scoring: independent, normalized sub-scores for a (candidate, job) pair.
//!
//! Every dimension returns a value in [0, 1]. Attributes that are unknown on
//! either side score `NEUTRAL_SCORE` so partial profiles still produce a result.
//!
//! The service holds an `Arc<dyn FeatureScorer>`; `RuleBasedScorer` is the only backend.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::attributes::{ExperienceLevel, Language, Location};
use crate::models::candidate::CandidateProfile;
use crate::models::job::JobPosting;

/// Sub-score used when a dimension cannot be assessed.
pub const NEUTRAL_SCORE: f64 = 0.5;

const SAME_REGION_SCORE: f64 = 0.75;
const SAME_COUNTRY_SCORE: f64 = 0.5;
const SAME_COUNTRY_RELOCATING_SCORE: f64 = 0.7;
const OTHER_COUNTRY_SCORE: f64 = 0.1;
const OTHER_COUNTRY_RELOCATING_SCORE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Skill,
    Experience,
    Location,
    Language,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Skill,
        Dimension::Experience,
        Dimension::Location,
        Dimension::Language,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Skill => "skill",
            Dimension::Experience => "experience",
            Dimension::Location => "location",
            Dimension::Language => "language",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimension name → normalized sub-score. Serializes as `{"skill": 1.0, ...}`.
pub type SubScores = BTreeMap<Dimension, f64>;

/// Implement this to swap scoring backends without touching the service or handlers.
pub trait FeatureScorer: Send + Sync {
    fn score(&self, candidate: &CandidateProfile, job: &JobPosting) -> SubScores;

    fn backend(&self) -> &'static str;
}

/// Deterministic rule-based scorer.
pub struct RuleBasedScorer;

impl FeatureScorer for RuleBasedScorer {
    fn score(&self, candidate: &CandidateProfile, job: &JobPosting) -> SubScores {
        let mut scores = SubScores::new();
        scores.insert(
            Dimension::Skill,
            skill_overlap(&candidate.skills, &job.required_skills),
        );
        scores.insert(
            Dimension::Experience,
            experience_fit(candidate.experience_level, job.min_experience),
        );
        scores.insert(
            Dimension::Location,
            location_fit(
                candidate.preferred_location.as_ref(),
                candidate.willing_to_relocate,
                job.location.as_ref(),
            ),
        );
        scores.insert(
            Dimension::Language,
            language_fit(&candidate.languages, job.language_requirement),
        );
        scores
    }

    fn backend(&self) -> &'static str {
        "rule_based"
    }
}

/// Lower-cases and trims tags, dropping empties and duplicates.
pub fn normalize_skills(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fraction of required skills the candidate holds.
pub fn skill_overlap(candidate_skills: &[String], required_skills: &[String]) -> f64 {
    let required = normalize_skills(required_skills);
    let held = normalize_skills(candidate_skills);
    if required.is_empty() || held.is_empty() {
        return NEUTRAL_SCORE;
    }
    let matched = required.intersection(&held).count();
    matched as f64 / required.len() as f64
}

/// 1.0 at or above the required level, 0.5 per level short, floored at 0.
pub fn experience_fit(actual: Option<ExperienceLevel>, required: Option<ExperienceLevel>) -> f64 {
    let (Some(actual), Some(required)) = (actual, required) else {
        return NEUTRAL_SCORE;
    };
    let shortfall = required.rank().saturating_sub(actual.rank());
    (1.0 - 0.5 * shortfall as f64).max(0.0)
}

/// Categorical distance between the candidate's preferred location and the job's.
pub fn location_fit(
    preferred: Option<&Location>,
    willing_to_relocate: bool,
    job: Option<&Location>,
) -> f64 {
    let (Some(preferred), Some(job)) = (preferred, job) else {
        return NEUTRAL_SCORE;
    };

    let same_country = same_part(&preferred.country, &job.country);
    if same_country == Some(false) {
        return if willing_to_relocate {
            OTHER_COUNTRY_RELOCATING_SCORE
        } else {
            OTHER_COUNTRY_SCORE
        };
    }
    if same_part(&preferred.city, &job.city) == Some(true) {
        return 1.0;
    }
    if same_part(&preferred.region, &job.region) == Some(true) {
        return SAME_REGION_SCORE;
    }
    if same_country == Some(true) {
        return if willing_to_relocate {
            SAME_COUNTRY_RELOCATING_SCORE
        } else {
            SAME_COUNTRY_SCORE
        };
    }
    NEUTRAL_SCORE
}

/// `None` when either side is blank, otherwise whether the normalized values agree.
fn same_part(a: &Option<String>, b: &Option<String>) -> Option<bool> {
    let a = a.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())?;
    let b = b.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())?;
    Some(a == b)
}

pub fn language_fit(languages: &BTreeSet<Language>, requirement: Option<Language>) -> f64 {
    let Some(requirement) = requirement else {
        return NEUTRAL_SCORE;
    };
    if languages.is_empty() {
        return NEUTRAL_SCORE;
    }
    if languages.contains(&requirement) {
        1.0
    } else {
        0.0
    }
}
