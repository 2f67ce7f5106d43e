//! Frozen mapping between class names and integer keys.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{MentalisError, Result};

/// Class names in key order.
///
/// Keys are assigned in first-seen order during fit and never change
/// afterwards; the classifier's score vector is indexed by these keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSpace {
    labels: Vec<String>,
    keys: HashMap<String, u32>,
}

impl LabelSpace {
    /// Assign keys to labels in the order they first appear.
    pub fn fit<'a, I>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut space = LabelSpace {
            labels: Vec::new(),
            keys: HashMap::new(),
        };

        for label in labels {
            if label.is_empty() {
                return Err(MentalisError::data("empty label in fit data"));
            }
            if !space.keys.contains_key(label) {
                space.keys.insert(label.to_string(), space.labels.len() as u32);
                space.labels.push(label.to_string());
            }
        }

        if space.labels.is_empty() {
            return Err(MentalisError::data("no labels to fit"));
        }

        Ok(space)
    }

    pub fn label_to_key(&self, label: &str) -> Option<u32> {
        self.keys.get(label).copied()
    }

    pub fn key_to_label(&self, key: u32) -> Option<&str> {
        self.labels.get(key as usize).map(String::as_str)
    }

    /// Labels in key order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl TryFrom<Vec<String>> for LabelSpace {
    type Error = MentalisError;

    /// Rebuild a persisted label list; every label must be non-empty and
    /// unique so keys keep round-tripping.
    fn try_from(labels: Vec<String>) -> Result<Self> {
        let mut keys = HashMap::with_capacity(labels.len());
        for (key, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(MentalisError::model_load(format!("label {key} is empty")));
            }
            if keys.insert(label.clone(), key as u32).is_some() {
                return Err(MentalisError::model_load(format!("duplicate label '{label}'")));
            }
        }
        Ok(LabelSpace { labels, keys })
    }
}

impl From<LabelSpace> for Vec<String> {
    fn from(space: LabelSpace) -> Self {
        space.labels
    }
}
