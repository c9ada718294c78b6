//! Semantic-role statements: the unit of input and output for the model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A semantic role slot within a statement.
///
/// The set is closed: upstream role extraction and model configuration share
/// this vocabulary. Verbs, negations and modals carry grammatical rather than
/// entity content and are never embedded or clustered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Verb,
    Negation,
    Modal,
    Patient,
    Target,
}

impl Role {
    /// All roles in canonical order.
    pub const fn all() -> [Role; 6] {
        [
            Role::Agent,
            Role::Verb,
            Role::Negation,
            Role::Modal,
            Role::Patient,
            Role::Target,
        ]
    }

    /// Whether fillers for this role can be embedded and clustered.
    pub const fn is_embeddable(self) -> bool {
        matches!(self, Role::Agent | Role::Patient | Role::Target)
    }

    /// Lowercase name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Verb => "verb",
            Role::Negation => "negation",
            Role::Modal => "modal",
            Role::Patient => "patient",
            Role::Target => "target",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One semantic-role statement: a partial mapping from roles to filler
/// phrases. Not every role is present in every statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statement {
    roles: BTreeMap<Role, String>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, convenient for tests and corpus construction.
    pub fn with(mut self, role: Role, filler: impl Into<String>) -> Self {
        self.roles.insert(role, filler.into());
        self
    }

    /// The filler for a role, if present.
    pub fn get(&self, role: Role) -> Option<&str> {
        self.roles.get(&role).map(String::as_str)
    }

    /// Insert or overwrite the filler for a role.
    pub fn set(&mut self, role: Role, filler: impl Into<String>) {
        self.roles.insert(role, filler.into());
    }

    /// Remove a role, returning its filler if it was present.
    pub fn remove(&mut self, role: Role) -> Option<String> {
        self.roles.remove(&role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Iterate (role, filler) pairs in canonical role order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.roles.iter().map(|(r, f)| (*r, f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// An ordered corpus of statements. Statement order matters: predictions are
/// aligned to input indices.
pub type Corpus = Vec<Statement>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddable_split() {
        assert!(Role::Agent.is_embeddable());
        assert!(Role::Patient.is_embeddable());
        assert!(Role::Target.is_embeddable());
        assert!(!Role::Verb.is_embeddable());
        assert!(!Role::Negation.is_embeddable());
        assert!(!Role::Modal.is_embeddable());
    }

    #[test]
    fn statement_set_get_remove() {
        let mut s = Statement::new();
        s.set(Role::Agent, "the government");
        assert_eq!(s.get(Role::Agent), Some("the government"));
        assert!(s.contains(Role::Agent));
        assert_eq!(s.remove(Role::Agent), Some("the government".to_string()));
        assert!(s.is_empty());
    }

    #[test]
    fn statement_serde_roundtrip() {
        let s = Statement::new()
            .with(Role::Agent, "the fed")
            .with(Role::Verb, "cut")
            .with(Role::Patient, "interest rates");
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"agent\""));
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn role_display_matches_serialized_name() {
        for role in Role::all() {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }
}
