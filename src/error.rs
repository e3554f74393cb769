use thiserror::Error;

/// A programming defect detected by the reference-counting machinery.
///
/// These are never returned to callers; they are raised through [`fatal`]
/// at the point of misuse.
///
/// 引用计数机制检测到的编程缺陷。
/// 它们不会返回给调用者，而是在误用处通过 [`fatal`] 抛出。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A link accessor was used while at least one handle owns the node.
    #[error("link accessor `{accessor}` used while node is handle-owned (use_count = {use_count})")]
    LinkWhileOwned {
        accessor: &'static str,
        use_count: usize,
    },

    /// The link field holds the other interpretation.
    #[error("link accessor `{accessor}` found the wrong interpretation (expected {expected})")]
    LinkStateMismatch {
        accessor: &'static str,
        expected: &'static str,
    },

    /// A decrement observed a count that was already zero.
    #[error("reference count decremented below zero")]
    RefCountUnderflow,
}

/// Report a usage error and panic.
///
/// 报告使用错误并 panic。
#[cold]
#[inline(never)]
pub(crate) fn fatal(err: UsageError) -> ! {
    tracing::error!(error = %err, "fatal usage error");
    panic!("BUG: {err}. This indicates incorrect API usage or a library bug.");
}
