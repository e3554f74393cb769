use crate::base::{Managed, dec_ref, inc_ref};
use std::boxed::Box;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// A nullable, thread-safe handle holding one attribution against an
/// intrusively counted object.
///
/// - Cloning adds an attribution.
/// - Moving transfers it without touching the count.
/// - Dropping or [`reset`](Shared::reset) removes it; the last removal runs
///   the object's [`Managed::unmanage`] hook (destroy, or return to its
///   [`FreeList`](crate::FreeList)).
///
/// The object is shared; each `Shared` value is owned by exactly one slot.
///
/// **Typical Usage**:
/// ```
/// use recycle_rc::{Managed, RefCount, Shared};
///
/// struct Config {
///     rc: RefCount,
///     name: String,
/// }
///
/// unsafe impl Managed for Config {
///     fn ref_count(&self) -> &RefCount {
///         &self.rc
///     }
/// }
///
/// let a = Shared::new(Config { rc: RefCount::new(), name: "primary".into() });
/// let b = a.clone();
/// assert_eq!(a.use_count(), 2);
/// assert!(a == b);
/// assert_eq!(b.name, "primary");
///
/// drop(a);
/// assert_eq!(b.use_count(), 1);
/// ```
///
/// 一个可为空、线程安全的句柄，对侵入式计数对象持有一个归属。
/// - 克隆增加一个归属。
/// - 移动转移归属而不改变计数。
/// - drop 或 `reset` 移除归属；最后一次移除会运行对象的 `unmanage` 钩子
///   （销毁，或归还到其 `FreeList`）。
/// 对象是共享的；每个 `Shared` 值在同一时刻只属于一个位置。
pub struct Shared<T: Managed> {
    ptr: Option<NonNull<T>>,
    _marker: PhantomData<T>,
}

unsafe impl<T: Managed + Send + Sync> Send for Shared<T> {}
unsafe impl<T: Managed + Send + Sync> Sync for Shared<T> {}

impl<T: Managed> Shared<T> {
    /// A handle that references nothing.
    /// 一个不引用任何对象的句柄。
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _marker: PhantomData,
        }
    }

    /// Box `value` and adopt it. The count becomes 1.
    ///
    /// When the last handle drops, the default disposal destroys the box.
    ///
    /// 将 `value` 装箱并接管它。计数变为 1。
    #[inline]
    pub fn new(value: T) -> Self {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        unsafe { Self::from_raw(ptr) }
    }

    /// Adopt a raw reference, adding one attribution.
    ///
    /// Adopting the same pointer twice is legal and yields two independent
    /// attributions.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live object that stays alive until its count
    /// reaches zero, and whose disposal hook can handle it (a `Box`
    /// allocation for the default hook). It must not be simultaneously
    /// reachable from a free list.
    ///
    /// 接管一个原始引用，增加一个归属。
    /// 对同一指针接管两次是合法的，会产生两个独立的归属。
    #[inline]
    pub unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        unsafe { inc_ref(ptr) };
        Self {
            ptr: Some(ptr),
            _marker: PhantomData,
        }
    }

    /// Whether this handle refers to nothing. 句柄是否为空。
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Borrow the referenced object, if any.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: our attribution keeps the object alive for `&self`.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    /// Mutable access when this handle holds the only attribution.
    ///
    /// Freshly fetched pool objects satisfy this, which makes it the place to
    /// reset their contents before sharing them.
    ///
    /// 当此句柄持有唯一归属时提供可变访问。
    /// 刚从池中取出的对象满足该条件，适合在共享前重置其内容。
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self.ptr {
            // SAFETY: count 1 means no other handle can observe the object,
            // and `&mut self` prevents this one from being cloned meanwhile.
            Some(p) if unsafe { p.as_ref() }.ref_count().use_count() == 1 => {
                Some(unsafe { &mut *p.as_ptr() })
            }
            _ => None,
        }
    }

    /// The raw address, or null.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match self.ptr {
            Some(p) => p.as_ptr(),
            None => std::ptr::null(),
        }
    }

    /// Attribution count of the referenced object; 0 for a null handle.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.get().map_or(0, |obj| obj.ref_count().use_count())
    }

    /// Whether both handles reference the same object (or are both null).
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.ptr == other.ptr
    }

    /// Drop this handle's attribution and leave it null.
    ///
    /// 移除此句柄的归属并将其置空。
    #[inline]
    pub fn reset(&mut self) {
        if let Some(p) = self.ptr.take() {
            unsafe { dec_ref(p) };
        }
    }

    /// Move the attribution out, leaving this handle null.
    #[inline]
    pub fn take(&mut self) -> Self {
        Self {
            ptr: self.ptr.take(),
            _marker: PhantomData,
        }
    }

    /// Exchange targets. Counts do not change.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.ptr, &mut other.ptr);
    }
}

impl<T: Managed> Default for Shared<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: Managed> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Self {
        match self.ptr {
            Some(p) => unsafe { Self::from_raw(p) },
            None => Self::null(),
        }
    }

    /// Copy-assign: the incoming target gains its attribution before the
    /// previous target loses one, so an object held by both never passes
    /// through zero.
    ///
    /// 复制赋值：新目标先获得归属，旧目标再失去归属，
    /// 因此同时被两者持有的对象永远不会经过零。
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        let incoming = source.ptr;
        if let Some(p) = incoming {
            unsafe { inc_ref(p) };
        }
        let previous = std::mem::replace(&mut self.ptr, incoming);
        if let Some(p) = previous {
            unsafe { dec_ref(p) };
        }
    }
}

impl<T: Managed> Drop for Shared<T> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: Managed> Deref for Shared<T> {
    type Target = T;

    /// # Panics
    /// Panics when the handle is null.
    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(obj) => obj,
            None => panic!("BUG: dereferenced a null Shared handle"),
        }
    }
}

impl<T: Managed, U: Managed> PartialEq<Shared<U>> for Shared<T> {
    /// Compares addresses, not counts or contents.
    #[inline]
    fn eq(&self, other: &Shared<U>) -> bool {
        self.as_ptr().cast::<()>() == other.as_ptr().cast::<()>()
    }
}

impl<T: Managed> Eq for Shared<T> {}

impl<T: Managed> std::fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shared")
            .field("ptr", &self.as_ptr())
            .field("use_count", &self.use_count())
            .finish()
    }
}

impl<T: Managed> std::fmt::Pointer for Shared<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}
