//! Static path → description annotations for listing rows

use std::collections::HashMap;

/// Read-only mapping from an exact path (`/`-prefixed, no trailing
/// separator except for the root) to a human-readable description
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionIndex {
    entries: HashMap<String, String>,
}

impl DescriptionIndex {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Exact-match lookup
    pub fn describe(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DescriptionIndex {
    fn default() -> Self {
        Self::new(default_descriptions())
    }
}

pub fn default_descriptions() -> HashMap<String, String> {
    HashMap::from([("/".to_string(), "Root".to_string())])
}
