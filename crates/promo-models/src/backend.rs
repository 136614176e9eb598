//! Generation backend selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The external video generation service a job renders with.
///
/// Both backends expose the same submit/poll/fetch shape but differ in
/// request format, status vocabulary and sensible clip length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Direct-connect image-to-video service. Short clips.
    #[default]
    Seedance,
    /// General-purpose text-to-video service. Longer clips.
    Creatok,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Seedance => "seedance",
            BackendKind::Creatok => "creatok",
        }
    }

    /// Default clip duration in seconds for this backend.
    pub fn default_duration_secs(&self) -> u32 {
        match self {
            BackendKind::Seedance => 5,
            BackendKind::Creatok => 15,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown video backend: {0}")]
pub struct ParseBackendError(pub String);

impl FromStr for BackendKind {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seedance" => Ok(BackendKind::Seedance),
            "creatok" => Ok(BackendKind::Creatok),
            other => Err(ParseBackendError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_durations() {
        assert_eq!(BackendKind::Seedance.default_duration_secs(), 5);
        assert_eq!(BackendKind::Creatok.default_duration_secs(), 15);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("seedance".parse::<BackendKind>().unwrap(), BackendKind::Seedance);
        assert_eq!(" Creatok ".parse::<BackendKind>().unwrap(), BackendKind::Creatok);
        assert!("sora".parse::<BackendKind>().is_err());
    }
}
