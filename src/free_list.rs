use crate::node::{Recyclable, next, set_list, set_next};
use crate::ptr::Shared;
use crate::state::{DEFAULT_LABEL, PoolShared, PoolState};
use crate::sync::{Arc, AtomicUsize, Mutex, Ordering};
use std::boxed::Box;
use std::ptr::NonNull;
use std::string::String;
use std::vec::Vec;

/// Builder for configuring a `FreeList`.
///
/// - `label`: Name attached to the list's log records
/// - `prefill`: Seed the list with freshly constructed nodes
///
/// # Example
/// ```
/// # use recycle_rc::{FreeList, Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
/// # use std::ptr::NonNull;
/// # struct Slab { rc: RefCount, link: Link<Slab> }
/// # unsafe impl Managed for Slab {
/// #     fn ref_count(&self) -> &RefCount { &self.rc }
/// #     unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) { unsafe { recycle(this, key) } }
/// # }
/// # unsafe impl Recyclable for Slab { fn link(&self) -> &Link<Self> { &self.link } }
/// let pool = FreeList::builder()
///     .label("slabs")
///     .prefill(16, || Slab { rc: RefCount::new(), link: Link::new() })
///     .build();
/// assert_eq!(pool.available(), 16);
/// ```
///
/// 用于配置 `FreeList` 的构建器。
pub struct FreeListBuilder<T: Recyclable> {
    label: String,
    nodes: Vec<Box<T>>,
}

impl<T: Recyclable> FreeListBuilder<T> {
    /// Create a new builder with default settings and no nodes.
    /// 创建一个带有默认设置且没有节点的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            label: String::from(DEFAULT_LABEL),
            nodes: Vec::new(),
        }
    }

    /// Set the name used in log records.
    ///
    /// Default: `"free-list"`
    ///
    /// 设置日志记录中使用的名称。
    #[inline]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Seed `count` nodes produced by `make`.
    ///
    /// 用 `make` 生成的 `count` 个节点预填充。
    pub fn prefill(mut self, count: usize, mut make: impl FnMut() -> T) -> Self {
        self.nodes.reserve(count);
        for _ in 0..count {
            self.nodes.push(Box::new(make()));
        }
        self
    }

    /// Seed already-constructed nodes.
    #[inline]
    pub fn nodes(mut self, nodes: impl IntoIterator<Item = Box<T>>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Build the `FreeList` with the configured settings.
    ///
    /// 使用配置的设置构建 `FreeList`。
    pub fn build(self) -> FreeList<T> {
        let list = FreeList {
            shared: Arc::new(PoolShared {
                state: Mutex::new(PoolState {
                    head: None,
                    closed: false,
                }),
                available: AtomicUsize::new(0),
                label: self.label,
            }),
        };

        for node in self.nodes {
            list.put(node);
        }

        tracing::debug!(
            label = %list.shared.label,
            available = list.available(),
            "free list built"
        );

        list
    }
}

impl<T: Recyclable> Default for FreeListBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A mutex-protected pool of recyclable objects.
///
/// `get()` hands out the head node wrapped in a [`Shared`]; when the last
/// handle to it drops, the node's [`recycle`](crate::recycle) hook puts it
/// back. An empty pool yields a null handle, and what to do about it
/// (grow, wait, fail) is up to the caller.
///
/// Dropping the list destroys every node still on it. Nodes that are handle-owned at that
/// point are orphaned: they stay valid until their handles go away, then are
/// destroyed instead of recycled. Tearing down a list with outstanding handles
/// is a usage error and is logged as such.
///
/// **Typical Usage**:
/// ```
/// use recycle_rc::{FreeList, Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
/// use std::ptr::NonNull;
///
/// struct Buffer {
///     rc: RefCount,
///     link: Link<Buffer>,
///     bytes: Vec<u8>,
/// }
///
/// unsafe impl Managed for Buffer {
///     fn ref_count(&self) -> &RefCount {
///         &self.rc
///     }
///
///     unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) {
///         unsafe { recycle(this, key) }
///     }
/// }
///
/// unsafe impl Recyclable for Buffer {
///     fn link(&self) -> &Link<Self> {
///         &self.link
///     }
/// }
///
/// let pool = FreeList::builder()
///     .label("buffers")
///     .prefill(2, || Buffer {
///         rc: RefCount::new(),
///         link: Link::new(),
///         bytes: Vec::with_capacity(64),
///     })
///     .build();
///
/// let mut buf = pool.get();
/// buf.get_mut().unwrap().bytes.extend_from_slice(b"hello");
/// let reader = buf.clone();
/// assert_eq!(reader.bytes, b"hello");
/// assert_eq!(pool.available(), 1);
///
/// drop(buf);
/// drop(reader);
/// assert_eq!(pool.available(), 2);
/// ```
///
/// 一个受互斥锁保护的可回收对象池。
/// `get()` 将头节点包装在 `Shared` 中分发出去；当指向它的最后一个句柄被 drop 时，
/// 节点的 `recycle` 钩子会把它放回去。空池返回空句柄，如何处理（扩容、等待、失败）由调用者决定。
/// drop 链表会销毁仍在链表上的所有节点。此时被句柄持有的节点成为孤儿：
/// 它们在句柄消失前保持有效，之后被销毁而不是回收。
pub struct FreeList<T: Recyclable> {
    shared: Arc<PoolShared<T>>,
}

impl<T: Recyclable> FreeList<T> {
    /// Create an empty list with default settings.
    /// 创建一个使用默认设置的空链表。
    #[inline]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the free list.
    /// 创建一个用于配置空闲链表的构建器。
    #[inline]
    pub fn builder() -> FreeListBuilder<T> {
        FreeListBuilder::new()
    }

    /// Enqueue an unowned node.
    ///
    /// This is how the pool is seeded: freshly constructed nodes have a count
    /// of zero and can be put directly.
    ///
    /// # Panics
    /// Panics if the node's count is not zero.
    ///
    /// 将一个无所有者节点入队。
    /// 这也是给池预填充的方式：新构造的节点计数为零，可以直接放入。
    #[inline]
    pub fn put(&self, node: Box<T>) {
        let node = NonNull::from(Box::leak(node));
        unsafe { self.shared.put_raw(node) };
    }

    /// Take the head node, wrapped in a handle. Returns a null handle when the
    /// pool is empty.
    ///
    /// 取出头节点并包装在句柄中。池为空时返回空句柄。
    pub fn get(&self) -> Shared<T> {
        let node = {
            let mut state = self.shared.state.lock();
            let Some(node) = state.head else {
                drop(state);
                tracing::trace!(label = %self.shared.label, "free list exhausted");
                return Shared::null();
            };
            // SAFETY: nodes on the chain are live and unowned.
            let node_ref = unsafe { node.as_ref() };
            state.head = next(node_ref);
            set_list(node_ref, Arc::clone(&self.shared));
            self.shared.available.fetch_sub(1, Ordering::Relaxed);
            node
        };

        // SAFETY: the node left the chain above, so this is its only owner.
        unsafe { Shared::from_raw(node) }
    }

    /// Number of nodes currently on the list.
    ///
    /// Exact at quiescent points; advisory while other threads are active.
    ///
    /// 当前链表上的节点数量。在静止点精确；其他线程活跃时仅供参考。
    #[inline]
    pub fn available(&self) -> usize {
        self.shared.available.load(Ordering::Relaxed)
    }

    /// Whether `get` would currently return a null handle.
    /// `get` 当前是否会返回空句柄。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Name attached to this list's log records. 链表日志记录使用的名称。
    #[inline]
    pub fn label(&self) -> &str {
        &self.shared.label
    }

    /// Tear the list down now and return how many nodes were destroyed.
    ///
    /// Equivalent to dropping the list, with the count reported.
    ///
    /// 立即拆除链表并返回被销毁的节点数量。
    pub fn close(self) -> usize {
        self.teardown()
    }

    fn teardown(&self) -> usize {
        let Some(destroyed) = self.shared.close() else {
            return 0;
        };

        // Every handle-owned node keeps one `Arc` to the shared state.
        let outstanding = Arc::strong_count(&self.shared).saturating_sub(1);
        if outstanding > 0 {
            tracing::warn!(
                label = %self.shared.label,
                outstanding,
                "free list torn down with outstanding handles; their nodes are orphaned"
            );
        }

        destroyed
    }
}

#[cfg(test)]
impl<T: Recyclable> FreeList<T> {
    /// Walk the chain under the lock and count its nodes.
    pub(crate) fn chain_len(&self) -> usize {
        let state = self.shared.state.lock();
        let mut len = 0;
        let mut cursor = state.head;
        while let Some(node) = cursor {
            cursor = next(unsafe { node.as_ref() });
            len += 1;
        }
        len
    }

    pub(crate) fn shared_for_test(&self) -> &Arc<PoolShared<T>> {
        &self.shared
    }
}

impl<T: Recyclable> Default for FreeList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Recyclable> Drop for FreeList<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Recyclable> std::fmt::Debug for FreeList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeList")
            .field("label", &self.shared.label)
            .field("available", &self.available())
            .finish()
    }
}

impl<T: Recyclable> PoolShared<T> {
    /// Push `node` onto the chain, or destroy it if the list is closed.
    ///
    /// # Safety
    /// `node` is a live, unowned `Box` allocation that is on no chain.
    pub(crate) unsafe fn put_raw(&self, node: NonNull<T>) {
        // SAFETY: caller guarantees the node is live.
        let node_ref = unsafe { node.as_ref() };

        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            tracing::warn!(
                label = %self.label,
                "node released after its free list was torn down; destroying orphan"
            );
            drop(unsafe { Box::from_raw(node.as_ptr()) });
            return;
        }

        set_next(node_ref, state.head);
        state.head = Some(node);
        self.available.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark the list closed, detach the chain and destroy it outside the lock.
    /// Returns `None` if the list was already closed.
    fn close(&self) -> Option<usize> {
        let mut cursor = {
            let mut state = self.state.lock();
            if state.closed {
                return None;
            }
            state.closed = true;
            self.available.store(0, Ordering::Relaxed);
            state.head.take()
        };

        let mut destroyed = 0;
        while let Some(node) = cursor {
            // SAFETY: detached chain nodes are live, unowned and reachable only here.
            cursor = next(unsafe { node.as_ref() });
            drop(unsafe { Box::from_raw(node.as_ptr()) });
            destroyed += 1;
        }

        tracing::debug!(label = %self.label, destroyed, "free list torn down");
        Some(destroyed)
    }
}
