//! Flags describing how a declared member is dispatched.

use bitflags::bitflags;

bitflags! {
    /// Flags attached to every member a template declares.
    ///
    /// # Common Combinations
    ///
    /// ```rust
    /// use templar_core::MemberFlags;
    ///
    /// // Parent-level property, evaluated with the instantiation as receiver
    /// let prop = MemberFlags::PARENT | MemberFlags::PROPERTY;
    ///
    /// // Operator supplied by a custom instantiation namespace
    /// let op = MemberFlags::PARENT | MemberFlags::OPERATOR | MemberFlags::NAMESPACE;
    /// assert!(op.is_parent_level());
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// Receiver is the instantiation, not an instance.
        const PARENT = 1 << 0;
        /// Read through the attribute protocol rather than called.
        const PROPERTY = 1 << 1;
        /// Called with arguments after binding a receiver.
        const METHOD = 1 << 2;
        /// Operator overload.
        const OPERATOR = 1 << 3;
        /// Supplied by a custom instantiation namespace.
        const NAMESPACE = 1 << 4;
        /// Inherited from an ancestor template.
        const INHERITED = 1 << 5;
    }
}

impl MemberFlags {
    /// Check if the member is evaluated against the instantiation.
    pub fn is_parent_level(self) -> bool {
        self.contains(MemberFlags::PARENT)
    }

    /// Check if the member is read as a property.
    pub fn is_property(self) -> bool {
        self.contains(MemberFlags::PROPERTY)
    }
}
