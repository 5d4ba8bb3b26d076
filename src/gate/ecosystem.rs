//! Package ecosystem classification from artifact paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Package ecosystem an artifact belongs to, inferred from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Maven,
    Npm,
    PyPi,
    Unsupported,
}

impl Ecosystem {
    /// Classify an artifact by its path suffix. The suffixes are disjoint,
    /// so the match order carries no semantics. An empty path is unsupported.
    pub fn from_path(path: &str) -> Ecosystem {
        if path.ends_with(".jar") {
            Ecosystem::Maven
        } else if path.ends_with(".tgz") {
            Ecosystem::Npm
        } else if path.ends_with(".whl")
            || path.ends_with(".tar.gz")
            || path.ends_with(".zip")
            || path.ends_with(".egg")
        {
            Ecosystem::PyPi
        } else {
            Ecosystem::Unsupported
        }
    }

    /// Tag used in issue-tracker reference URLs. The tracker files PyPI
    /// packages under `pip`.
    pub fn tag(&self) -> &'static str {
        match self {
            Ecosystem::Maven => "maven",
            Ecosystem::Npm => "npm",
            Ecosystem::PyPi => "pip",
            Ecosystem::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ecosystem::Maven => "maven",
            Ecosystem::Npm => "npm",
            Ecosystem::PyPi => "pypi",
            Ecosystem::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Outcome of classifying one artifact path against the configured toggles.
///
/// Disabled is reported separately from Unsupported so the pipeline can log
/// the correct reason; both allow the download without scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Enabled(Ecosystem),
    Disabled(Ecosystem),
    Unsupported,
}

/// Applies the per-ecosystem enable flags on top of suffix classification.
#[derive(Debug, Clone)]
pub struct Classifier {
    maven: bool,
    npm: bool,
    pypi: bool,
}

impl Classifier {
    pub fn new(maven: bool, npm: bool, pypi: bool) -> Self {
        Self { maven, npm, pypi }
    }

    pub fn classify(&self, path: &str) -> Classification {
        match Ecosystem::from_path(path) {
            Ecosystem::Unsupported => Classification::Unsupported,
            ecosystem => {
                if self.enabled(ecosystem) {
                    Classification::Enabled(ecosystem)
                } else {
                    debug!(
                        path = path,
                        ecosystem = %ecosystem,
                        "ecosystem scanning is disabled for this path"
                    );
                    Classification::Disabled(ecosystem)
                }
            }
        }
    }

    fn enabled(&self, ecosystem: Ecosystem) -> bool {
        match ecosystem {
            Ecosystem::Maven => self.maven,
            Ecosystem::Npm => self.npm,
            Ecosystem::PyPi => self.pypi,
            Ecosystem::Unsupported => false,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}
