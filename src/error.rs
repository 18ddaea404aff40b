//! Error types and handling for structmem

/// Result type alias for structmem operations
pub type Result<T> = std::result::Result<T, StructMemError>;

/// Errors reported by layouts, views, cursor buffers and allocators
///
/// Every variant is local and synchronous: the caller has to fix the call,
/// nothing here is transient or worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructMemError {
    /// A parameter violates a stated precondition
    #[error("Invalid argument: {parameter} - {message}")]
    InvalidArgument { parameter: String, message: String },

    /// Absolute access outside `[0, limit)`
    #[error("Index out of range: {index} (limit {limit})")]
    IndexOutOfRange { index: usize, limit: usize },

    /// Relative read with no remaining elements
    #[error("Buffer underflow: position {position}, limit {limit}")]
    Underflow { position: usize, limit: usize },

    /// Relative write with no remaining elements, or a bulk transfer that does not fit
    #[error("Buffer overflow: requested {requested}, remaining {remaining}")]
    Overflow { requested: usize, remaining: usize },

    /// `reset()` without a mark
    #[error("Invalid mark state: no mark is set")]
    InvalidMarkState,

    /// Host allocator failure
    #[error("Memory error: {message}")]
    Memory { message: String },

    /// Arena handle used after its slot was freed
    #[error("Stale handle: arena {arena}, slot {index}, generation {generation}")]
    StaleHandle {
        arena: u32,
        index: u32,
        generation: u32,
    },
}

impl StructMemError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create an index out of range error
    pub fn index_out_of_range(index: usize, limit: usize) -> Self {
        Self::IndexOutOfRange { index, limit }
    }

    /// Create an underflow error
    pub fn underflow(position: usize, limit: usize) -> Self {
        Self::Underflow { position, limit }
    }

    /// Create an overflow error
    pub fn overflow(requested: usize, remaining: usize) -> Self {
        Self::Overflow {
            requested,
            remaining,
        }
    }

    /// Create a memory error
    pub fn memory(message: impl Into<String>) -> Self {
        Self::Memory {
            message: message.into(),
        }
    }

    /// Create a stale handle error
    pub fn stale_handle(arena: u32, index: u32, generation: u32) -> Self {
        Self::StaleHandle {
            arena,
            index,
            generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StructMemError::invalid_argument("position", "exceeds limit");
        assert!(matches!(err, StructMemError::InvalidArgument { .. }));

        let err = StructMemError::index_out_of_range(4, 4);
        assert!(matches!(err, StructMemError::IndexOutOfRange { index: 4, limit: 4 }));

        let err = StructMemError::overflow(3, 1);
        assert!(matches!(err, StructMemError::Overflow { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StructMemError::underflow(2, 2);
        let display = format!("{}", err);
        assert!(display.contains("Buffer underflow"));
        assert!(display.contains("position 2"));

        let display = format!("{}", StructMemError::InvalidMarkState);
        assert!(display.contains("no mark"));
    }
}
