//! Effect flags returned by navigator transitions.

use bitflags::bitflags;

bitflags! {
    /// What a transition changed. Callers re-render or animate per flag.
    ///
    /// # Example
    ///
    /// ```
    /// use node_engine::navigation::NavEffects;
    ///
    /// let effects = NavEffects::TARGET_CHANGED | NavEffects::DEPTH_CHANGED;
    /// assert!(effects.contains(NavEffects::TARGET_CHANGED));
    /// assert!(!effects.contains(NavEffects::TAB_CHANGED));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NavEffects: u8 {
        const NONE = 0;

        /// The navigation target moved.
        const TARGET_CHANGED = 1 << 0;

        /// A different tab is active.
        const TAB_CHANGED = 1 << 1;

        /// The path got longer or shorter (breadcrumbs changed shape).
        const DEPTH_CHANGED = 1 << 2;
    }
}

impl NavEffects {
    /// True if the transition changed anything at all.
    pub fn moved(&self) -> bool {
        !self.is_empty()
    }
}
