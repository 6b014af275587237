use std::collections::HashSet;

use crate::proxy::DescriptorProxy;

/// An ordered, deduplicated set of descriptor proxies.
///
/// Insertion order is preserved. Stores return entries newest first, but a
/// merged history makes no ordering promise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefactoringHistory {
    proxies: Vec<DescriptorProxy>,
}

impl RefactoringHistory {
    /// The empty history.
    pub const EMPTY: RefactoringHistory = RefactoringHistory { proxies: Vec::new() };

    pub fn new(proxies: impl IntoIterator<Item = DescriptorProxy>) -> Self {
        let mut history = Self::EMPTY;
        history.extend(proxies);
        history
    }

    pub fn descriptors(&self) -> &[DescriptorProxy] {
        &self.proxies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DescriptorProxy> {
        self.proxies.iter()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn contains(&self, proxy: &DescriptorProxy) -> bool {
        self.proxies.contains(proxy)
    }

    /// Appends every proxy not already present.
    pub fn extend(&mut self, proxies: impl IntoIterator<Item = DescriptorProxy>) {
        let mut seen: HashSet<DescriptorProxy> = self.proxies.iter().cloned().collect();
        for proxy in proxies {
            if seen.insert(proxy.clone()) {
                self.proxies.push(proxy);
            }
        }
    }

    /// Returns this history without the entries also present in `other`.
    pub fn remove_all(&self, other: &RefactoringHistory) -> RefactoringHistory {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        let excluded: HashSet<&DescriptorProxy> = other.proxies.iter().collect();
        RefactoringHistory {
            proxies: self
                .proxies
                .iter()
                .filter(|p| !excluded.contains(p))
                .cloned()
                .collect(),
        }
    }
}

impl IntoIterator for RefactoringHistory {
    type Item = DescriptorProxy;
    type IntoIter = std::vec::IntoIter<DescriptorProxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.proxies.into_iter()
    }
}

impl<'a> IntoIterator for &'a RefactoringHistory {
    type Item = &'a DescriptorProxy;
    type IntoIter = std::slice::Iter<'a, DescriptorProxy>;

    fn into_iter(self) -> Self::IntoIter {
        self.proxies.iter()
    }
}

impl FromIterator<DescriptorProxy> for RefactoringHistory {
    fn from_iter<I: IntoIterator<Item = DescriptorProxy>>(iter: I) -> Self {
        Self::new(iter)
    }
}
