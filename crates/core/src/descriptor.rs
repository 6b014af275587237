use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::flags::DescriptorFlags;
use crate::proxy::DescriptorProxy;

/// Refactoring id carried by the sentinel recorded for operations without a descriptor.
pub const UNKNOWN_REFACTORING_ID: &str = "refhist.unknown.refactoring";

const UNKNOWN_REFACTORING_DESCRIPTION: &str = "Unknown refactoring";

/// Immutable record of one completed refactoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringDescriptor {
    id: String,
    /// `None` = workspace-level refactoring.
    project: Option<String>,
    description: String,
    comment: Option<String>,
    arguments: BTreeMap<String, String>,
    flags: DescriptorFlags,
    /// 0 until performed.
    timestamp: u64,
}

impl RefactoringDescriptor {
    pub fn new(
        id: impl Into<String>,
        project: Option<&str>,
        description: impl Into<String>,
        arguments: BTreeMap<String, String>,
        flags: DescriptorFlags,
    ) -> Self {
        Self {
            id: id.into(),
            project: project.filter(|p| !p.is_empty()).map(str::to_string),
            description: description.into(),
            comment: None,
            arguments,
            flags,
            timestamp: 0,
        }
    }

    /// The sentinel pushed when a completed operation carries no descriptor.
    pub fn unknown() -> Self {
        Self::new(
            UNKNOWN_REFACTORING_ID,
            None,
            UNKNOWN_REFACTORING_DESCRIPTION,
            BTreeMap::new(),
            DescriptorFlags::NONE,
        )
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Returns a copy carrying the given perform-time stamp.
    pub fn stamped(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn arguments(&self) -> &BTreeMap<String, String> {
        &self.arguments
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).map(String::as_str)
    }

    pub fn flags(&self) -> DescriptorFlags {
        self.flags
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_REFACTORING_ID
    }

    pub fn proxy(&self) -> DescriptorProxy {
        DescriptorProxy::new(self.project.as_deref(), &self.description, self.timestamp)
    }
}
