//! This module contains [`CoroHandle`], a non-owning reference to a coroutine
//! slot inside a [`Runtime`](crate::runtime::Runtime).
use std::fmt;

/// A non-owning, cheap-to-copy reference to a coroutine.
///
/// A handle is an index into the runtime's slot arena plus the generation the
/// slot carried when the coroutine was spawned. Destroying the coroutine, or
/// reusing its slot for a younger one, changes the generation, so every stale
/// handle is rejected with
/// [`StaleHandle`](crate::error::RuntimeError::StaleHandle) instead of
/// silently touching the wrong coroutine.
///
/// Any number of handles may reference the same coroutine. A handle never
/// keeps its coroutine alive; "no handle" is expressed as
/// `Option<CoroHandle>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoroHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl CoroHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index inside the arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation this handle was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for CoroHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "co{}@{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CoroHandle::new(2, 5)), "co2@5");
    }

    #[test]
    fn test_copy_eq() {
        let a = CoroHandle::new(1, 1);
        let b = a;
        assert_eq!(a, b);
        assert_ne!(a, CoroHandle::new(1, 2));
        assert_ne!(a, CoroHandle::new(2, 1));
    }

    #[test]
    fn test_hash() {
        let mut set = HashSet::new();
        set.insert(CoroHandle::new(0, 1));
        assert!(set.contains(&CoroHandle::new(0, 1)));
        assert!(!set.contains(&CoroHandle::new(0, 2)));
    }
}
