use crate::base::{Managed, UnmanageKey};
use crate::error::{UsageError, fatal};
use crate::state::PoolShared;
use crate::sync::{Arc, UnsafeCell};
use std::ptr::NonNull;

/// The two interpretations of a node's link field.
enum Slot<T> {
    /// Sitting on a free list: next unowned node, or `None` at the end.
    Linked(Option<NonNull<T>>),
    /// Held by handles: the list to return to.
    Owned(Arc<PoolShared<T>>),
}

/// Dual-purpose link embedded in every [`Recyclable`] object.
///
/// While the node is on a free list it links to the next unowned node; while
/// handles own it, it points back at the list it returns to. The field is only
/// touched while the node's count is zero (under the list's mutex, or inside
/// the zero-transition hook). Any other access is a fatal usage error.
///
/// 嵌入在每个 [`Recyclable`] 对象中的双用途链接。
///
/// 节点在空闲链表上时，它链接到下一个无所有者节点；被句柄持有时，它指回要归还的链表。
/// 该字段只在节点计数为零时被访问（在链表互斥锁下，或在零值转换钩子中），
/// 其他任何访问都是致命的使用错误。
pub struct Link<T> {
    slot: UnsafeCell<Slot<T>>,
}

// SAFETY: the slot is only accessed while the owning node is unowned, which the
// refcount protocol and the pool mutex make exclusive.
unsafe impl<T: Send> Send for Link<T> {}
unsafe impl<T: Send> Sync for Link<T> {}

impl<T> Link<T> {
    /// An unlinked field, suitable for a freshly constructed node.
    ///
    /// 未链接的字段，用于新构造的节点。
    #[inline]
    pub fn new() -> Self {
        Self {
            slot: UnsafeCell::new(Slot::Linked(None)),
        }
    }
}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Reading the slot here could race with the pool, so stay opaque.
        f.write_str("Link { .. }")
    }
}

/// A [`Managed`] object that can live on a [`FreeList`](crate::FreeList).
///
/// Implementors embed a [`Link<Self>`] and route [`Managed::unmanage`] to
/// [`recycle`]:
///
/// ```
/// use recycle_rc::{Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
/// use std::ptr::NonNull;
///
/// struct Frame {
///     rc: RefCount,
///     link: Link<Frame>,
///     data: Vec<u8>,
/// }
///
/// unsafe impl Managed for Frame {
///     fn ref_count(&self) -> &RefCount {
///         &self.rc
///     }
///
///     unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) {
///         unsafe { recycle(this, key) }
///     }
/// }
///
/// unsafe impl Recyclable for Frame {
///     fn link(&self) -> &Link<Self> {
///         &self.link
///     }
/// }
/// ```
///
/// # Safety
///
/// `link` must return the same field for the whole life of the object, and
/// objects must be allocated with `Box` (the free list destroys them as boxes
/// when it is torn down).
///
/// 可以存放在 `FreeList` 上的 `Managed` 对象。
/// 实现者需嵌入一个 `Link<Self>`，并将 `Managed::unmanage` 转发给 `recycle`。
pub unsafe trait Recyclable: Managed + Sized {
    /// The embedded link field. 嵌入的链接字段。
    fn link(&self) -> &Link<Self>;
}

/// Return a node whose count just reached zero to the list it came from.
///
/// This is the [`Managed::unmanage`] body for pooled types. If the list has
/// been torn down in the meantime the node is destroyed instead.
///
/// # Safety
///
/// Same contract as [`Managed::unmanage`]: `this` is live, its count is zero
/// and it was handed out by [`FreeList::get`](crate::FreeList::get).
///
/// 将计数刚归零的节点归还到其来源链表。
/// 这是池化类型的 `Managed::unmanage` 实现。如果链表已被拆除，节点会被销毁。
pub unsafe fn recycle<T: Recyclable>(this: NonNull<T>, _key: &UnmanageKey) {
    let list = take_list(unsafe { this.as_ref() });
    unsafe { list.put_raw(this) };
}

/// Check the node is unowned and hand back its link.
#[inline]
fn unowned<'a, T: Recyclable>(node: &'a T, accessor: &'static str) -> &'a Link<T> {
    let use_count = node.use_count();
    if use_count != 0 {
        fatal(UsageError::LinkWhileOwned {
            accessor,
            use_count,
        });
    }
    node.link()
}

/// Next unowned node on the chain.
pub(crate) fn next<T: Recyclable>(node: &T) -> Option<NonNull<T>> {
    // SAFETY: `unowned` verified the node is unowned; only the pool touches it now.
    let next = unowned(node, "next").slot.with(|slot| match unsafe { &*slot } {
        Slot::Linked(next) => Some(*next),
        Slot::Owned(_) => None,
    });
    match next {
        Some(next) => next,
        None => fatal(UsageError::LinkStateMismatch {
            accessor: "next",
            expected: "linked",
        }),
    }
}

pub(crate) fn set_next<T: Recyclable>(node: &T, next: Option<NonNull<T>>) {
    // SAFETY: as in `next`.
    unowned(node, "set_next")
        .slot
        .with_mut(|slot| unsafe { *slot = Slot::Linked(next) });
}

/// Move the back-reference out, leaving the node unlinked.
pub(crate) fn take_list<T: Recyclable>(node: &T) -> Arc<PoolShared<T>> {
    // SAFETY: as in `next`.
    let list = unowned(node, "take_list").slot.with_mut(|slot| unsafe {
        match std::ptr::replace(slot, Slot::Linked(None)) {
            Slot::Owned(list) => Some(list),
            linked => {
                // Put the link back before failing so the chain is left as found.
                *slot = linked;
                None
            }
        }
    });
    match list {
        Some(list) => list,
        None => fatal(UsageError::LinkStateMismatch {
            accessor: "take_list",
            expected: "owned",
        }),
    }
}

pub(crate) fn set_list<T: Recyclable>(node: &T, list: Arc<PoolShared<T>>) {
    // SAFETY: as in `next`.
    unowned(node, "set_list")
        .slot
        .with_mut(|slot| unsafe { *slot = Slot::Owned(list) });
}
