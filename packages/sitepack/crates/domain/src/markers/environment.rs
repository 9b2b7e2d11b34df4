use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker variable values for one interpreter (`python_version`,
/// `sys_platform`, ...). Unknown variables read as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerEnvironment(BTreeMap<String, String>);

impl MarkerEnvironment {
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self(values)
    }

    /// Parse a flat JSON object of string values.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for MarkerEnvironment {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
