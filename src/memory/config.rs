//! Configuration for the memory manager

use serde::{Deserialize, Serialize};

use crate::{
    checks::CheckMode,
    error::{Result, StructMemError},
};

/// Configuration of a [`MemoryManager`](super::MemoryManager)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Validation applied by every view and buffer the manager creates
    pub check_mode: CheckMode,
    /// Minimum alignment of allocated blocks
    pub default_alignment: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            check_mode: CheckMode::default(),
            default_alignment: crate::config::DEFAULT_ALIGNMENT,
        }
    }
}

impl MemoryConfig {
    /// Defaults with the process-wide check mode
    pub fn from_env() -> Self {
        Self {
            check_mode: CheckMode::process_default(),
            ..Default::default()
        }
    }

    /// Set the check mode
    pub fn with_check_mode(mut self, check_mode: CheckMode) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Set the minimum block alignment
    pub fn with_default_alignment(mut self, alignment: usize) -> Self {
        self.default_alignment = alignment;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.default_alignment.is_power_of_two() {
            return Err(StructMemError::invalid_argument(
                "default_alignment",
                "Alignment must be a power of two",
            ));
        }
        Ok(())
    }
}
