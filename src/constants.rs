//! # Trait Constants
//!
//! The fixed set of Big Five personality traits an evaluator works through.
//! The ordering here is canonical: orchestration walks traits in this order
//! when selecting the next one to present, and the backend uses the same
//! snake_case names in its routes and payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the five personality dimensions being annotated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl TraitKind {
    /// All traits in canonical workflow order
    pub const ALL: [TraitKind; 5] = [
        Self::Openness,
        Self::Conscientiousness,
        Self::Extraversion,
        Self::Agreeableness,
        Self::Neuroticism,
    ];

    /// Position of this trait in the canonical order
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Human-readable name for display surfaces
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Openness => "Openness",
            Self::Conscientiousness => "Conscientiousness",
            Self::Extraversion => "Extraversion",
            Self::Agreeableness => "Agreeableness",
            Self::Neuroticism => "Neuroticism",
        }
    }

    /// Short description of the trait shown alongside the workflow
    pub fn description(&self) -> &'static str {
        match self {
            Self::Openness => {
                "Openness refers to the individual's receptiveness to new experiences, \
                 ideas, and perspectives. People high in openness typically have curiosity, \
                 creativity, and imagination, and enjoy trying new things."
            }
            Self::Conscientiousness => {
                "Conscientiousness refers to the individual's self-discipline, sense of \
                 responsibility, and organizational skills. People high in conscientiousness \
                 are typically careful, reliable, organized, and follow rules and plans strictly."
            }
            Self::Extraversion => {
                "Extraversion refers to the individual's level of activity in social \
                 interactions and tendency to seek stimulation. People high in extraversion \
                 are typically energetic, talkative, confident, and enjoy interacting with others."
            }
            Self::Agreeableness => {
                "Agreeableness refers to the individual's friendliness and level of \
                 cooperation when interacting with others. People high in agreeableness \
                 typically trust others, are compassionate, understanding, and willing to help."
            }
            Self::Neuroticism => {
                "Neuroticism refers to the individual's tendency to experience negative \
                 emotions and emotional stability. People high in neuroticism may be more \
                 prone to anxiety, irritability, and depression, and cope less well with stress."
            }
        }
    }
}

impl fmt::Display for TraitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Openness => write!(f, "openness"),
            Self::Conscientiousness => write!(f, "conscientiousness"),
            Self::Extraversion => write!(f, "extraversion"),
            Self::Agreeableness => write!(f, "agreeableness"),
            Self::Neuroticism => write!(f, "neuroticism"),
        }
    }
}

impl std::str::FromStr for TraitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openness" => Ok(Self::Openness),
            "conscientiousness" => Ok(Self::Conscientiousness),
            "extraversion" => Ok(Self::Extraversion),
            "agreeableness" => Ok(Self::Agreeableness),
            "neuroticism" => Ok(Self::Neuroticism),
            _ => Err(format!("Invalid trait: {s}")),
        }
    }
}
