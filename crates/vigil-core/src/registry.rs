// crates/vigil-core/src/registry.rs
//
// In-memory subject registry: a fixed table of subjects and their stake
// thresholds. Stands in for the on-network scanner/agent/pool registries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::subject::{Subject, SubjectId, SubjectType};
use crate::traits::{StakeSubjectValidator, StakeThreshold};

/// A registry entry as it appears in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub subject_type: SubjectType,
    pub subject_id: SubjectId,
    pub min_stake: u128,
    pub max_stake: u128,
    #[serde(default = "default_activated")]
    pub activated: bool,
}

fn default_activated() -> bool {
    true
}

impl SubjectEntry {
    pub fn subject(&self) -> Subject {
        Subject {
            subject_type: self.subject_type,
            subject_id: self.subject_id,
        }
    }
}

/// Fixed table of subjects and thresholds.
#[derive(Debug, Clone, Default)]
pub struct StaticSubjectRegistry {
    subjects: HashMap<Subject, StakeThreshold>,
}

impl StaticSubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a subject.
    pub fn register(&mut self, subject: Subject, min: u128, max: u128, activated: bool) {
        self.subjects.insert(
            subject,
            StakeThreshold {
                min,
                max,
                activated,
            },
        );
    }

    /// Builder form of `register` for activated subjects.
    pub fn with_subject(mut self, subject: Subject, min: u128, max: u128) -> Self {
        self.register(subject, min, max, true);
        self
    }

    /// Toggle whether a known subject accepts deposits. Unknown subjects are ignored.
    pub fn set_activated(&mut self, subject: &Subject, activated: bool) {
        if let Some(threshold) = self.subjects.get_mut(subject) {
            threshold.activated = activated;
        }
    }

    pub fn from_entries(entries: &[SubjectEntry]) -> Self {
        let mut registry = Self::new();
        for e in entries {
            registry.register(e.subject(), e.min_stake, e.max_stake, e.activated);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl StakeSubjectValidator for StaticSubjectRegistry {
    fn stake_threshold(&self, subject: &Subject) -> Option<StakeThreshold> {
        self.subjects.get(subject).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_subject_not_activated() {
        let registry = StaticSubjectRegistry::new();
        let subject = Subject::new(SubjectType::Scanner, 1);
        assert!(registry.stake_threshold(&subject).is_none());
        assert!(!registry.is_stake_activated(&subject));
    }

    #[test]
    fn test_register_and_deactivate() {
        let subject = Subject::new(SubjectType::Agent, 9);
        let mut registry = StaticSubjectRegistry::new().with_subject(subject, 100, 3_000);
        assert!(registry.is_stake_activated(&subject));
        assert_eq!(registry.stake_threshold(&subject).unwrap().max, 3_000);

        registry.set_activated(&subject, false);
        assert!(!registry.is_stake_activated(&subject));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entries_deserialize() {
        let json = r#"[{"subject_type":"scanner","subject_id":"0x01","min_stake":10,"max_stake":500}]"#;
        let entries: Vec<SubjectEntry> = serde_json::from_str(json).unwrap();
        let registry = StaticSubjectRegistry::from_entries(&entries);
        let subject = Subject::new(SubjectType::Scanner, 1);
        let threshold = registry.stake_threshold(&subject).unwrap();
        assert_eq!(threshold.min, 10);
        assert!(threshold.activated);
    }
}
