use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Lightweight handle to a descriptor. Resolved lazily through the coordinator.
///
/// Identity is `(project, timestamp)`; the description is display-only and
/// does not take part in equality or hashing.
#[derive(Clone, Serialize, Deserialize)]
pub struct DescriptorProxy {
    project: Option<String>,
    description: String,
    timestamp: u64,
}

impl DescriptorProxy {
    pub fn new(project: Option<&str>, description: &str, timestamp: u64) -> Self {
        Self {
            project: project.filter(|p| !p.is_empty()).map(str::to_string),
            description: description.to_string(),
            timestamp,
        }
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl PartialEq for DescriptorProxy {
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project && self.timestamp == other.timestamp
    }
}

impl Eq for DescriptorProxy {}

impl Hash for DescriptorProxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project.hash(state);
        self.timestamp.hash(state);
    }
}

impl fmt::Debug for DescriptorProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DescriptorProxy({}@{})",
            self.project.as_deref().unwrap_or("<workspace>"),
            self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_ignores_description() {
        let a = DescriptorProxy::new(Some("P"), "Rename", 100);
        let b = DescriptorProxy::new(Some("P"), "Rename (edited)", 100);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn project_and_stamp_both_matter() {
        let base = DescriptorProxy::new(Some("P"), "Rename", 100);
        assert_ne!(base, DescriptorProxy::new(Some("Q"), "Rename", 100));
        assert_ne!(base, DescriptorProxy::new(Some("P"), "Rename", 101));
        assert_ne!(base, DescriptorProxy::new(None, "Rename", 100));
    }
}
