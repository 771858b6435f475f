use std::fmt;

/// Broad failure category shared by every layer of the engine.
///
/// Each module error maps onto one of these through its `kind()` method so
/// callers can branch on the category without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Page store open/read/write/destroy failure
    Io,
    /// Key, record or page absent
    NotFound,
    /// All frames pinned, or a structure cannot grow further
    ResourceExhausted,
    /// Bad name, out-of-range locator, malformed schema
    InvalidArgument,
    /// Unpin of an unpinned page, shutdown with pins held, double close
    InvalidState,
}

impl ErrorKind {
    /// Integer result code for this category
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Io => codes::WRITE_FAILED,
            ErrorKind::NotFound => codes::READ_NON_EXISTING_PAGE,
            ErrorKind::ResourceExhausted => codes::NO_EVICTABLE_PAGE,
            ErrorKind::InvalidArgument => codes::INVALID_PARAMETER,
            ErrorKind::InvalidState => codes::SHUTDOWN_FAILED,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Io => "io error",
            ErrorKind::NotFound => "not found",
            ErrorKind::ResourceExhausted => "resource exhausted",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidState => "invalid state",
        };
        f.write_str(name)
    }
}

/// Result codes reported by `code()` on the error types.
pub mod codes {
    pub const FILE_NOT_FOUND: i32 = 1;
    pub const WRITE_FAILED: i32 = 3;
    pub const READ_NON_EXISTING_PAGE: i32 = 4;

    pub const INVALID_PAGE_NUM: i32 = 83;
    pub const INVALID_SLOT_NUM: i32 = 84;
    pub const INVALID_PARAMETER: i32 = 86;
    pub const SHUTDOWN_FAILED: i32 = 87;
    pub const UNPIN_FAILED: i32 = 88;
    pub const MARK_DIRTY_FAILED: i32 = 89;
    pub const NO_EVICTABLE_PAGE: i32 = 91;
    pub const POOL_INIT_FAILED: i32 = 94;

    pub const COMPARE_DIFFERENT_TYPES: i32 = 200;
    pub const EXPR_NOT_BOOLEAN: i32 = 201;
    pub const BOOLEAN_ARG_NOT_BOOLEAN: i32 = 202;
    pub const NO_MORE_TUPLES: i32 = 203;
    pub const UNKNOWN_DATATYPE: i32 = 205;

    pub const KEY_NOT_FOUND: i32 = 300;
    pub const ORDER_TOO_LARGE: i32 = 302;
    pub const NO_MORE_ENTRIES: i32 = 303;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_distinct() {
        let kinds = [
            ErrorKind::Io,
            ErrorKind::NotFound,
            ErrorKind::ResourceExhausted,
            ErrorKind::InvalidArgument,
            ErrorKind::InvalidState,
        ];
        let mut seen: Vec<i32> = kinds.iter().map(|k| k.code()).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), kinds.len());
        assert!(seen.iter().all(|&code| code != 0));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not found");
        assert_eq!(ErrorKind::InvalidState.to_string(), "invalid state");
    }
}
