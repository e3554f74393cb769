use crate::error::{UsageError, fatal};
use crate::state::MAX_REFCOUNT;
use crate::sync::{AtomicUsize, Ordering, fence};
use std::boxed::Box;
use std::ptr::NonNull;

/// The intrusive reference counter embedded in every managed object.
///
/// The counter is not part of the object's domain state: it is mutated through
/// `&self` and only by the handle machinery. Outside code may read it via
/// [`RefCount::use_count`] but has no way to change it.
///
/// A fresh counter starts at zero, meaning "unowned". Objects seeded into a
/// free list stay at zero until the first handle adopts them.
///
/// 嵌入在每个受管对象中的侵入式引用计数器。
///
/// 计数器不属于对象的业务状态：它通过 `&self` 修改，且只由句柄机制修改。
/// 外部代码可以通过 [`RefCount::use_count`] 读取，但无法修改它。
///
/// 新计数器从零开始，表示"无所有者"。
pub struct RefCount {
    count: AtomicUsize,
}

impl RefCount {
    /// Create a counter with no owners.
    /// 创建一个没有所有者的计数器。
    #[inline]
    pub fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// Current number of attributions.
    ///
    /// Advisory only: other threads may change the value before the caller
    /// acts on it.
    ///
    /// 当前的归属数量。仅供参考：其他线程可能在调用者使用前修改该值。
    #[inline]
    pub fn use_count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Increment and return the previous value.
    #[inline]
    pub(crate) fn inc(&self) -> usize {
        let prev = self.count.fetch_add(1, Ordering::Relaxed);
        if prev > MAX_REFCOUNT {
            std::process::abort();
        }
        prev
    }

    /// Decrement and return the previous value. The caller decides what a
    /// previous value of 1 means.
    #[inline]
    fn dec(&self) -> usize {
        self.count.fetch_sub(1, Ordering::Release)
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RefCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RefCount").field(&self.use_count()).finish()
    }
}

/// Proof that the zero transition is being handled by the counting machinery.
///
/// Only this module can construct a key, so [`Managed::unmanage`] cannot be
/// invoked from outside code:
///
/// ```compile_fail
/// let key = recycle_rc::UnmanageKey { _private: () };
/// ```
///
/// 证明零值转换正由计数机制处理的标记。
/// 只有本模块能构造该标记，因此外部代码无法调用 [`Managed::unmanage`]。
pub struct UnmanageKey {
    _private: (),
}

impl std::fmt::Debug for UnmanageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UnmanageKey")
    }
}

/// An object that carries its own reference count.
///
/// # Safety
///
/// - `ref_count` must return the same counter for the whole life of the
///   object, and that counter must not be shared with any other object.
/// - If the default [`unmanage`](Managed::unmanage) is kept, every object
///   adopted by a [`Shared`](crate::Shared) must have been allocated with
///   `Box` (which [`Shared::new`](crate::Shared::new) does).
///
/// 携带自身引用计数的对象。
///
/// # 安全性
/// - `ref_count` 在对象整个生命周期内必须返回同一个计数器，且不能与其他对象共享。
/// - 如果保留默认的 `unmanage`，被 `Shared` 接管的每个对象都必须由 `Box` 分配。
pub unsafe trait Managed {
    /// The embedded counter.
    fn ref_count(&self) -> &RefCount;

    /// Dispose of the object once its count has reached zero.
    ///
    /// Invoked exactly once per zero transition, synchronously, by the
    /// decrement that observed it. The default destroys the object. Pooled
    /// types override it with [`recycle`](crate::recycle).
    ///
    /// # Safety
    ///
    /// `this` points to a live object whose count is zero and which nothing
    /// else will touch until the hook returns.
    ///
    /// 在对象计数归零后处置它。
    /// 每次零值转换由观察到该转换的递减操作同步调用恰好一次。
    /// 默认实现销毁对象；池化类型用 `recycle` 覆盖它。
    unsafe fn unmanage(this: NonNull<Self>, _key: &UnmanageKey) {
        drop(unsafe { Box::from_raw(this.as_ptr()) });
    }

    /// Advisory attribution count, see [`RefCount::use_count`].
    #[inline]
    fn use_count(&self) -> usize {
        self.ref_count().use_count()
    }
}

/// Add one attribution to `ptr`, returning the previous count.
///
/// # Safety
/// `ptr` must point to a live object.
#[inline]
pub(crate) unsafe fn inc_ref<T: Managed>(ptr: NonNull<T>) -> usize {
    unsafe { ptr.as_ref() }.ref_count().inc()
}

/// Remove one attribution from `ptr`, returning the previous count.
///
/// When the previous count was exactly 1 the object's hook runs before this
/// returns, and `ptr` must be considered dangling afterwards.
///
/// # Safety
/// `ptr` must point to a live object and the caller must own one of its
/// attributions.
///
/// 从 `ptr` 移除一个归属，返回之前的计数。
/// 如果之前的计数恰好为 1，对象的钩子会在返回前执行，此后 `ptr` 必须视为悬垂指针。
#[inline]
pub(crate) unsafe fn dec_ref<T: Managed>(ptr: NonNull<T>) -> usize {
    // The zero decision comes from this single RMW, never from a second load.
    let prev = unsafe { ptr.as_ref() }.ref_count().dec();
    if prev == 1 {
        // Pairs with the Release decrements of the other owners.
        fence(Ordering::Acquire);
        unsafe { T::unmanage(ptr, &UnmanageKey { _private: () }) };
    } else if prev == 0 {
        fatal(UsageError::RefCountUnderflow);
    }
    prev
}
