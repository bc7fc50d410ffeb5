//! Compiler option flags.

use bitflags::bitflags;

bitflags! {
    /// Additive compilation flags.
    ///
    /// Unrecognized bits are rejected by `bitflags` construction; the
    /// recognized set currently holds one flag.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CompilerOptions: u8 {
        /// Insert null guards along access chains: a null owner anywhere
        /// short-circuits the enclosing expression to its static type's
        /// default value instead of faulting, and suppresses all writes
        /// past that point.
        const CHECK_NULL_REFERENCES = 1 << 0;
    }
}

impl CompilerOptions {
    /// No flags set.
    pub const NONE: Self = Self::empty();
    /// All recognized flags set.
    pub const ALL: Self = Self::all();

    #[inline]
    pub fn check_null_references(self) -> bool {
        self.contains(Self::CHECK_NULL_REFERENCES)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;

    #[test]
    fn none_and_all() {
        assert!(!CompilerOptions::NONE.check_null_references());
        assert!(CompilerOptions::ALL.check_null_references());
        assert_eq!(
            CompilerOptions::ALL,
            CompilerOptions::CHECK_NULL_REFERENCES
        );
    }
}
