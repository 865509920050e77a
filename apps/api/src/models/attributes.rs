//! Attribute types shared by candidate profiles and job postings.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Self-declared or required experience level. Ordered: beginner < intermediate < expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    pub fn rank(self) -> u8 {
        match self {
            ExperienceLevel::Beginner => 0,
            ExperienceLevel::Intermediate => 1,
            ExperienceLevel::Expert => 2,
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "expert" => Ok(ExperienceLevel::Expert),
            other => Err(format!("unknown experience level '{other}'")),
        }
    }
}

/// Languages the platform tracks proficiency for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Danish,
    German,
    Romanian,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "danish" | "da" => Ok(Language::Danish),
            "german" | "de" => Ok(Language::German),
            "romanian" | "ro" => Ok(Language::Romanian),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    #[default]
    Seasonal,
    FixedTerm,
    Permanent,
}

impl FromStr for ContractType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seasonal" => Ok(ContractType::Seasonal),
            "fixed_term" | "fixed-term" => Ok(ContractType::FixedTerm),
            "permanent" => Ok(ContractType::Permanent),
            other => Err(format!("unknown contract type '{other}'")),
        }
    }
}

/// A place, from most to least specific. Any part may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Location {
    /// Builds a location from nullable columns; `None` when every part is blank.
    pub fn from_parts(
        city: Option<String>,
        region: Option<String>,
        country: Option<String>,
    ) -> Option<Self> {
        let location = Location {
            city,
            region,
            country,
        };
        if location.is_empty() {
            None
        } else {
            Some(location)
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.city, &self.region, &self.country]
            .iter()
            .all(|part| part.as_deref().map(str::trim).unwrap_or("").is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_levels_are_ordered() {
        assert!(ExperienceLevel::Beginner < ExperienceLevel::Intermediate);
        assert!(ExperienceLevel::Intermediate < ExperienceLevel::Expert);
        assert_eq!(ExperienceLevel::Expert.rank(), 2);
    }

    #[test]
    fn test_parse_is_case_and_whitespace_insensitive() {
        assert_eq!(
            " Expert ".parse::<ExperienceLevel>().unwrap(),
            ExperienceLevel::Expert
        );
        assert_eq!("DA".parse::<Language>().unwrap(), Language::Danish);
        assert_eq!(
            "fixed-term".parse::<ContractType>().unwrap(),
            ContractType::FixedTerm
        );
    }

    #[test]
    fn test_parse_unknown_value_is_error() {
        assert!("guru".parse::<ExperienceLevel>().is_err());
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn test_location_from_blank_parts_is_none() {
        assert!(Location::from_parts(None, Some("  ".into()), None).is_none());
        assert!(Location::from_parts(Some("Odense".into()), None, None).is_some());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Language::Romanian).unwrap();
        assert_eq!(json, "\"romanian\"");
        let contract: ContractType = serde_json::from_str("\"fixed_term\"").unwrap();
        assert_eq!(contract, ContractType::FixedTerm);
    }
}
