//! Built-in detectors for the local classifier.
//!
//! Each detector reports one info type at a fixed likelihood. Names follow the
//! DLP info type identifiers so job specs are portable between backends.

use regex::Regex;
use sieve_core::{Finding, Likelihood};

use crate::error::ClassificationError;

/// Common given names matched by the `FIRST_NAME` detector.
const FIRST_NAMES: &[&str] = &[
    "Aaron", "Adam", "Alice", "Amanda", "Amy", "Andrew", "Anna", "Anthony", "Barbara", "Benjamin",
    "Betty", "Brian", "Carol", "Charles", "Christopher", "Daniel", "David", "Deborah", "Donald",
    "Dorothy", "Edward", "Elizabeth", "Emily", "Emma", "George", "Helen", "James", "Jennifer",
    "Jessica", "John", "Joseph", "Karen", "Kenneth", "Laura", "Linda", "Lisa", "Margaret", "Maria",
    "Mark", "Mary", "Matthew", "Michael", "Michelle", "Nancy", "Olivia", "Patricia", "Paul",
    "Richard", "Robert", "Sandra", "Sarah", "Steven", "Susan", "Thomas", "William",
];

#[derive(Debug, Clone)]
pub struct Detector {
    pub info_type: &'static str,
    pub likelihood: Likelihood,
    pub regex: Regex,
}

impl Detector {
    fn new(
        info_type: &'static str,
        likelihood: Likelihood,
        pattern: &str,
    ) -> Result<Self, ClassificationError> {
        let regex = Regex::new(pattern).map_err(|e| {
            ClassificationError::ConfigError(format!("Invalid {} pattern: {}", info_type, e))
        })?;
        Ok(Detector {
            info_type,
            likelihood,
            regex,
        })
    }

    pub fn count(&self, text: &str) -> u64 {
        self.regex.find_iter(text).count() as u64
    }
}

/// Predefined detectors, one per supported info type.
pub fn predefined_detectors() -> Result<Vec<Detector>, ClassificationError> {
    let first_names = format!(r"\b(?:{})\b", FIRST_NAMES.join("|"));

    Ok(vec![
        Detector::new(
            "EMAIL_ADDRESS",
            Likelihood::Likely,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        )?,
        Detector::new(
            "PHONE_NUMBER",
            Likelihood::Possible,
            r"(?:\+?1[\s.-]?)?\(?\b\d{3}\)?[\s.-]\d{3}[\s.-]\d{4}\b",
        )?,
        Detector::new(
            "US_SOCIAL_SECURITY_NUMBER",
            Likelihood::Likely,
            r"\b(?:00[1-9]|0[1-9]\d|[1-578]\d{2}|6[0-57-9]\d|66[0-57-9])-(?:0[1-9]|[1-9]\d)-(?:000[1-9]|00[1-9]\d|0[1-9]\d{2}|[1-9]\d{3})\b",
        )?,
        Detector::new("FIRST_NAME", Likelihood::Possible, &first_names)?,
    ])
}

/// Run `detectors` over `text` and return per-category counts.
///
/// Only categories listed in `info_types` are reported, and only when the
/// detector's likelihood meets `min_likelihood`. A non-zero `max_findings`
/// caps each category's count. Categories with no matches are omitted and the
/// output follows the order of `info_types`.
pub fn inspect(
    detectors: &[Detector],
    text: &str,
    info_types: &[String],
    min_likelihood: Likelihood,
    max_findings: u32,
) -> Vec<Finding> {
    info_types
        .iter()
        .filter_map(|info_type| {
            let detector = detectors.iter().find(|d| d.info_type == info_type.as_str())?;
            if !detector.likelihood.meets(min_likelihood) {
                return None;
            }
            let mut count = detector.count(text);
            if max_findings > 0 {
                count = count.min(u64::from(max_findings));
            }
            (count > 0).then(|| Finding {
                info_type: info_type.clone(),
                count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_types() -> Vec<String> {
        [
            "FIRST_NAME",
            "PHONE_NUMBER",
            "EMAIL_ADDRESS",
            "US_SOCIAL_SECURITY_NUMBER",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_detects_email_in_csv() {
        let detectors = predefined_detectors().unwrap();
        let text = "id,contact\n1,jane.doe@example.com\n2,ops@example.org\n";

        let findings = inspect(&detectors, text, &all_types(), Likelihood::Possible, 0);
        let email = findings
            .iter()
            .find(|f| f.info_type == "EMAIL_ADDRESS")
            .unwrap();
        assert_eq!(email.count, 2);
    }

    #[test]
    fn test_plain_notes_have_no_findings() {
        let detectors = predefined_detectors().unwrap();
        let text = "remember to water the plants and buy more coffee beans\n";

        let findings = inspect(&detectors, text, &all_types(), Likelihood::Possible, 0);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_ssn_and_phone() {
        let detectors = predefined_detectors().unwrap();
        let text = "ssn 123-45-6789, call (415) 555-0134";

        let findings = inspect(&detectors, text, &all_types(), Likelihood::Possible, 0);
        let types: Vec<&str> = findings.iter().map(|f| f.info_type.as_str()).collect();
        assert_eq!(types, vec!["PHONE_NUMBER", "US_SOCIAL_SECURITY_NUMBER"]);
    }

    #[test]
    fn test_invalid_ssn_area_is_ignored() {
        let detectors = predefined_detectors().unwrap();
        let findings = inspect(
            &detectors,
            "000-12-3456 and 666-12-3456",
            &["US_SOCIAL_SECURITY_NUMBER".to_string()],
            Likelihood::Possible,
            0,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_threshold_drops_weaker_detectors() {
        let detectors = predefined_detectors().unwrap();
        let text = "Mary can be reached at mary@example.com or 415-555-0134";

        let findings = inspect(&detectors, text, &all_types(), Likelihood::Likely, 0);
        let types: Vec<&str> = findings.iter().map(|f| f.info_type.as_str()).collect();
        assert_eq!(types, vec!["EMAIL_ADDRESS"]);
    }

    #[test]
    fn test_unrequested_categories_are_not_reported() {
        let detectors = predefined_detectors().unwrap();
        let findings = inspect(
            &detectors,
            "a@example.com",
            &["PHONE_NUMBER".to_string()],
            Likelihood::Possible,
            0,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_max_findings_caps_each_count() {
        let detectors = predefined_detectors().unwrap();
        let text = "a@example.com b@example.com c@example.com";

        let findings = inspect(
            &detectors,
            text,
            &["EMAIL_ADDRESS".to_string()],
            Likelihood::Possible,
            2,
        );
        assert_eq!(findings[0].count, 2);
    }
}
