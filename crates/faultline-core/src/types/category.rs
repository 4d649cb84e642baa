//! Error category and severity enums.

use serde::{Deserialize, Serialize};

/// The closed set of error domains the classifier can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    TypeScript,
    JavaScript,
    Python,
    Memory,
    Network,
    React,
    Vue,
    Angular,
    Django,
    FastApi,
    Database,
    Docker,
    Cicd,
    Build,
    Security,
    Async,
    General,
}

impl ErrorCategory {
    pub fn all() -> &'static [ErrorCategory] {
        &[
            Self::TypeScript, Self::JavaScript, Self::Python, Self::Memory,
            Self::Network, Self::React, Self::Vue, Self::Angular,
            Self::Django, Self::FastApi, Self::Database, Self::Docker,
            Self::Cicd, Self::Build, Self::Security, Self::Async,
            Self::General,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript", Self::JavaScript => "javascript",
            Self::Python => "python", Self::Memory => "memory",
            Self::Network => "network", Self::React => "react",
            Self::Vue => "vue", Self::Angular => "angular",
            Self::Django => "django", Self::FastApi => "fastapi",
            Self::Database => "database", Self::Docker => "docker",
            Self::Cicd => "cicd", Self::Build => "build",
            Self::Security => "security", Self::Async => "async",
            Self::General => "general",
        }
    }

    /// Categories whose matches start closer to critical severity.
    pub fn is_critical_prone(&self) -> bool {
        matches!(self, Self::Memory | Self::Security)
    }

    /// Fixed severity-score increment contributed by category membership.
    pub fn severity_bump(&self) -> f64 {
        match self {
            Self::Memory | Self::Security => 0.2,
            Self::Build | Self::Docker => 0.15,
            Self::Database | Self::Network => 0.1,
            _ => 0.0,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bucketed urgency level derived from confidence and keyword heuristics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Bucket a severity score: <0.4 low, <0.6 medium, <0.8 high, else critical.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_buckets() {
        assert_eq!(Severity::from_score(0.0), Severity::Low);
        assert_eq!(Severity::from_score(0.39), Severity::Low);
        assert_eq!(Severity::from_score(0.4), Severity::Medium);
        assert_eq!(Severity::from_score(0.6), Severity::High);
        assert_eq!(Severity::from_score(0.8), Severity::Critical);
        assert_eq!(Severity::from_score(2.5), Severity::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_category_names_are_unique() {
        let mut names: Vec<&str> = ErrorCategory::all().iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ErrorCategory::all().len());
    }

    #[test]
    fn test_critical_prone_set() {
        assert!(ErrorCategory::Memory.is_critical_prone());
        assert!(ErrorCategory::Security.is_critical_prone());
        assert!(!ErrorCategory::TypeScript.is_critical_prone());
    }
}
