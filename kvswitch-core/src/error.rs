use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("Expected {expected} reply, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Reply is not valid UTF-8")]
    InvalidUtf8,
    #[error("Map reply has an odd number of elements ({0})")]
    OddPairs(usize),
}
