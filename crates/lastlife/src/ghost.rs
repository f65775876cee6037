//! # Ghost State
//!
//! A revived player who was teleported gets a short window of
//! invulnerability and invisibility while they get their bearings. The
//! window counts server ticks and only runs while the player is online.

/// Remaining ghost ticks for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GhostState {
    remaining_ticks: u32,
}

impl GhostState {
    /// Inactive ghost state.
    pub const NONE: Self = Self { remaining_ticks: 0 };

    /// Restores a persisted countdown.
    #[inline]
    #[must_use]
    pub const fn with_remaining(remaining_ticks: u32) -> Self {
        Self { remaining_ticks }
    }

    /// Starts (or restarts) the countdown.
    #[inline]
    pub fn apply(&mut self, ticks: u32) {
        self.remaining_ticks = ticks;
    }

    /// Ends the countdown immediately.
    #[inline]
    pub fn clear(&mut self) {
        self.remaining_ticks = 0;
    }

    /// Returns true while the countdown runs.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.remaining_ticks > 0
    }

    /// Ticks left.
    #[inline]
    #[must_use]
    pub const fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Advances one tick. Returns true on the tick the state expires.
    #[inline]
    pub fn tick(&mut self) -> bool {
        if self.remaining_ticks == 0 {
            return false;
        }
        self.remaining_ticks -= 1;
        self.remaining_ticks == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_once() {
        let mut ghost = GhostState::NONE;
        ghost.apply(3);
        assert!(ghost.is_active());
        assert!(!ghost.tick());
        assert!(!ghost.tick());
        assert!(ghost.tick());
        assert!(!ghost.is_active());
        assert!(!ghost.tick());
    }

    #[test]
    fn test_clear() {
        let mut ghost = GhostState::with_remaining(600);
        ghost.clear();
        assert_eq!(ghost.remaining_ticks(), 0);
        assert!(!ghost.tick());
    }
}
