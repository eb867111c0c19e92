//! This module contains the runtime configuration. Pass a [`RuntimeCfg`] to
//! [`Runtime::with_config`](crate::runtime::Runtime::with_config) to override
//! the defaults.

/// Configuration for a [`Runtime`](crate::runtime::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeCfg {
    slots_capacity: usize,
}

impl RuntimeCfg {
    /// The default configuration.
    pub const fn default() -> Self {
        Self { slots_capacity: 8 }
    }

    /// Sets how many coroutine slots the arena reserves up front.
    /// The arena still grows past this on demand.
    pub const fn with_slots_capacity(mut self, slots_capacity: usize) -> Self {
        self.slots_capacity = slots_capacity;
        self
    }

    /// Returns the reserved slot count.
    pub fn slots_capacity(&self) -> usize {
        self.slots_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let cfg = RuntimeCfg::default();
        assert_eq!(cfg.slots_capacity(), 8);
    }

    #[test]
    fn test_with_slots_capacity() {
        let cfg = RuntimeCfg::default().with_slots_capacity(64);
        assert_eq!(cfg.slots_capacity(), 64);
    }
}
