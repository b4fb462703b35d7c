//! Declarative retry table for single-field saves.
//!
//! Some backends reject certain values on a case-sensitive enum check. The
//! table maps such a value to alternate encodings tried, in order, after a
//! field-scoped validation rejection.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::CandidateRule;

#[derive(Debug, Clone, Default)]
pub struct CandidateTable {
    /// `(field, lowercased value)` -> alternates.
    rules: HashMap<(String, String), Vec<String>>,
}

impl CandidateTable {
    pub fn from_rules(rules: &[CandidateRule]) -> Self {
        let mut table = Self::default();
        for rule in rules {
            table
                .rules
                .entry((rule.field.clone(), rule.value.to_lowercase()))
                .or_default()
                .extend(rule.candidates.iter().cloned());
        }
        table
    }

    /// Alternates for `field = value`. Only string values have alternates;
    /// the value itself is never repeated.
    pub fn candidates_for(&self, field: &str, value: &Value) -> Vec<Value> {
        let Value::String(s) = value else {
            return Vec::new();
        };
        let Some(alternates) = self.rules.get(&(field.to_string(), s.to_lowercase())) else {
            return Vec::new();
        };
        let mut out: Vec<Value> = Vec::with_capacity(alternates.len());
        for alt in alternates {
            let alt = Value::String(alt.clone());
            if alt != *value && !out.contains(&alt) {
                out.push(alt);
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Progress through one save: the primary value, then each candidate once.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdateAttempt {
    pub field: String,
    pub primary_value: Value,
    pub candidate_values: Vec<Value>,
    /// 0 is the primary value; `n` is `candidate_values[n - 1]`.
    pub attempt_index: usize,
}

impl FieldUpdateAttempt {
    pub fn new(field: impl Into<String>, primary_value: Value, candidate_values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            primary_value,
            candidate_values,
            attempt_index: 0,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.candidate_values.len() + 1
    }

    pub fn current_value(&self) -> &Value {
        match self.attempt_index {
            0 => &self.primary_value,
            n => &self.candidate_values[n - 1],
        }
    }

    /// Move to the next candidate. Returns `false` once the list is used up,
    /// leaving the index unchanged.
    pub fn advance(&mut self) -> bool {
        if self.attempt_index + 1 >= self.max_attempts() {
            return false;
        }
        self.attempt_index += 1;
        true
    }

    /// Attempts made so far, counting the current one.
    pub fn attempts(&self) -> usize {
        self.attempt_index + 1
    }
}
