use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Classification service backends
///
/// `Dlp` talks to the Cloud DLP REST API; `Local` runs the in-process
/// pattern detectors (development and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    Local,
    Dlp,
}

impl FromStr for ClassifierBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ClassifierBackend::Local),
            "dlp" => Ok(ClassifierBackend::Dlp),
            _ => Err(anyhow::anyhow!("Invalid classifier backend: {}", s)),
        }
    }
}

impl Display for ClassifierBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ClassifierBackend::Local => write!(f, "local"),
            ClassifierBackend::Dlp => write!(f, "dlp"),
        }
    }
}
