use thiserror::Error as ThisError;

/// Result type for sorted-set operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    /// Fatal case, index entries are not in sort-order. Carries the
    /// members of the two offending entries, in traversal order.
    #[error("entries out of order: {0:?} followed by {1:?}")]
    SortError(String, String),
    /// Fatal case, a level link records the wrong number of level-0 hops.
    #[error("span mismatch at level {level} after {member:?}: expected {expected}, found {found}")]
    SpanMismatch {
        level: usize,
        member: String,
        expected: usize,
        found: usize,
    },
    /// Fatal case, backward link does not point to the level-0 predecessor.
    #[error("backward link broken at {0:?}")]
    BackwardMismatch(String),
    /// Fatal case, tail does not refer to the last level-0 node.
    #[error("tail does not refer to the last entry")]
    TailMismatch,
    /// Fatal case, recorded length differs from reachable entries.
    #[error("length mismatch: recorded {0}, reachable {1}")]
    LengthMismatch(usize, usize),
    /// Fatal case, recorded level differs from the tallest node.
    #[error("level mismatch: recorded {0}, tallest node {1}")]
    LevelMismatch(usize, usize),
    /// Fatal case, header links an unused level or a node a freed slot.
    #[error("dangling link at level {0}")]
    DanglingLink(usize),
    /// Fatal case, member table and index disagree on a member.
    #[error("member table disagrees with index for {0:?}")]
    TableMismatch(String),
    /// Returned by add() when score is NaN.
    #[error("score for {0:?} is not a number")]
    NotANumber(String),
    /// Returned while parsing a malformed score border.
    #[error("min or max is not a float: {0:?}")]
    InvalidScoreBorder(String),
    /// Returned by rank-window reads for windows outside the set.
    #[error("rank window [{0}, {1}) out of range for {2} entries")]
    RankOutOfRange(usize, usize, usize),
}
