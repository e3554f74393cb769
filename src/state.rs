use crate::sync::{AtomicUsize, Mutex};
use std::ptr::NonNull;
use std::string::String;

/// Largest count an object may reach before incrementing aborts the process.
/// 对象计数在递增导致进程中止之前可以达到的最大值。
pub(crate) const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Label used in log records when none is configured.
/// 未配置时日志记录中使用的标签。
pub(crate) const DEFAULT_LABEL: &str = "free-list";

/// The unowned chain of a free list.
#[derive(Debug)]
pub(crate) struct PoolState<T> {
    /// First unowned node, linked through each node's `Link::next`.
    /// 第一个无所有者节点，通过每个节点的 `Link::next` 链接。
    pub(crate) head: Option<NonNull<T>>,
    /// Set once the owning `FreeList` has been torn down. Nodes released
    /// afterwards are destroyed instead of recycled.
    /// 所属 `FreeList` 被拆除后设置。之后释放的节点会被销毁而不是回收。
    pub(crate) closed: bool,
}

// SAFETY: the chain is only touched under the pool mutex, and the nodes on it
// are unowned, so moving the state between threads moves the nodes with it.
unsafe impl<T: Send> Send for PoolState<T> {}

/// State shared between a `FreeList` and the nodes it has handed out.
///
/// Owned nodes hold an `Arc` to this as their back-reference, so it outlives
/// the `FreeList` itself while handles are outstanding.
///
/// `FreeList` 与其分发出去的节点之间共享的状态。
/// 被持有的节点以 `Arc` 作为回指引用，因此在有未释放句柄时它比 `FreeList` 本身活得更久。
#[derive(Debug)]
pub(crate) struct PoolShared<T> {
    /// The unowned chain. Protected by a Mutex.
    /// 无所有者链表。由 Mutex 保护。
    pub(crate) state: Mutex<PoolState<T>>,
    /// Number of nodes on the chain. Written under the mutex, readable without it.
    /// 链表上的节点数量。在互斥锁下写入，无需互斥锁即可读取。
    pub(crate) available: AtomicUsize,
    pub(crate) label: String,
}
