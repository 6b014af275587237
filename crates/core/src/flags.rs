use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Properties of a performed refactoring, used to filter history queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DescriptorFlags: u32 {
        /// The refactoring may break clients of the changed code.
        const BREAKING_CHANGE = 1 << 0;
        /// The refactoring changes the structure of the code (signatures, hierarchy).
        const STRUCTURAL_CHANGE = 1 << 1;
        /// The refactoring touches more than one element.
        const MULTI_CHANGE = 1 << 2;
        /// The refactoring was explicitly requested by the user.
        const USER_CHANGE = 1 << 8;
    }
}

impl DescriptorFlags {
    /// The empty filter: every descriptor passes.
    pub const NONE: Self = Self::empty();

    /// A descriptor passes `filter` iff every bit of the filter is set on it.
    pub fn passes(self, filter: DescriptorFlags) -> bool {
        (self | filter) == self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_passes_everything() {
        assert!(DescriptorFlags::NONE.passes(DescriptorFlags::NONE));
        assert!(DescriptorFlags::BREAKING_CHANGE.passes(DescriptorFlags::NONE));
    }

    #[test]
    fn filter_bits_must_be_subset() {
        let flags = DescriptorFlags::STRUCTURAL_CHANGE | DescriptorFlags::MULTI_CHANGE;
        assert!(flags.passes(DescriptorFlags::STRUCTURAL_CHANGE));
        assert!(flags.passes(DescriptorFlags::STRUCTURAL_CHANGE | DescriptorFlags::MULTI_CHANGE));
        assert!(!flags.passes(DescriptorFlags::BREAKING_CHANGE));
        assert!(!flags.passes(DescriptorFlags::BREAKING_CHANGE | DescriptorFlags::MULTI_CHANGE));
    }
}
