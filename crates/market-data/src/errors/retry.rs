/// Whether a failed provider call may be repeated as-is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request itself is wrong (unknown symbol, empty range, bad data).
    Never,
    /// Upstream trouble; repeating the call later can succeed.
    WithBackoff,
}
