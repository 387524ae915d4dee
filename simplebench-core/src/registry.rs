//! Case Registry
//!
//! Holds declared cases in registration order and selects the subset to run.
//!
//! Filtering options:
//! - Regex pattern matching on the case id (`group/title`)
//! - Group filtering

use crate::case::Case;
use crate::error::ConfigError;
use regex::Regex;

/// Ordered collection of cases
#[derive(Debug, Default)]
pub struct CaseRegistry {
    cases: Vec<Case>,
}

impl CaseRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a case; `group/title` must be unique
    pub fn register(&mut self, case: Case) -> Result<(), ConfigError> {
        if self
            .cases
            .iter()
            .any(|c| c.group() == case.group() && c.title() == case.title())
        {
            return Err(ConfigError::DuplicateCase {
                group: case.group().to_string(),
                title: case.title().to_string(),
            });
        }
        self.cases.push(case);
        Ok(())
    }

    /// Remove every case
    pub fn clear(&mut self) {
        self.cases.clear();
    }

    /// All cases in registration order
    pub fn list(&self) -> &[Case] {
        &self.cases
    }

    /// Number of registered cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Distinct groups in first-registration order
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for case in &self.cases {
            if !groups.contains(&case.group()) {
                groups.push(case.group());
            }
        }
        groups
    }

    /// Cases matching both filters, in registration order.
    ///
    /// `filter` is matched against [`Case::id`] (`group/title`).
    pub fn select(&self, filter: Option<&Regex>, group: Option<&str>) -> Vec<&Case> {
        self.cases
            .iter()
            .filter(|c| {
                if let Some(re) = filter {
                    if !re.is_match(&c.id()) {
                        return false;
                    }
                }

                if let Some(g) = group {
                    if c.group() != g {
                        return false;
                    }
                }

                true
            })
            .collect()
    }
}
