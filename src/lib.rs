//! Intrusive reference counting with recycling free lists.
//!
//! - [`Managed`] is the capability an object exposes to be shared: an embedded
//!   [`RefCount`] and a disposal hook run exactly once when the count drops to
//!   zero. The hook can only be triggered by the counting machinery, which is
//!   enforced by the unforgeable [`UnmanageKey`].
//! - [`Shared<T>`] is a nullable handle holding one attribution: clone
//!   increments, move transfers, drop decrements.
//! - [`Recyclable`] objects embed a dual-purpose [`Link`] so they can sit on a
//!   [`FreeList`]. Their disposal hook is [`recycle`], which puts them back on
//!   the list they came from instead of freeing them.
//!
//! ```
//! use recycle_rc::{FreeList, Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
//! use std::ptr::NonNull;
//!
//! struct Packet {
//!     rc: RefCount,
//!     link: Link<Packet>,
//!     len: usize,
//! }
//!
//! unsafe impl Managed for Packet {
//!     fn ref_count(&self) -> &RefCount {
//!         &self.rc
//!     }
//!
//!     unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) {
//!         unsafe { recycle(this, key) }
//!     }
//! }
//!
//! unsafe impl Recyclable for Packet {
//!     fn link(&self) -> &Link<Self> {
//!         &self.link
//!     }
//! }
//!
//! let pool = FreeList::builder()
//!     .prefill(1, || Packet { rc: RefCount::new(), link: Link::new(), len: 0 })
//!     .build();
//!
//! let first = pool.get();
//! let addr = first.as_ptr();
//! assert!(pool.get().is_null()); // exhausted, not an error
//!
//! drop(first);
//! assert_eq!(pool.get().as_ptr(), addr); // same object, recycled
//! ```
//!
//! 带有回收空闲链表的侵入式引用计数。
//! - [`Managed`] 是对象被共享所需暴露的能力：内嵌的 [`RefCount`]，以及计数归零时恰好执行一次的处置钩子。
//!   该钩子只能由计数机制触发，这由不可伪造的 [`UnmanageKey`] 保证。
//! - [`Shared<T>`] 是持有一个归属的可空句柄：克隆递增，移动转移，drop 递减。
//! - [`Recyclable`] 对象内嵌双用途的 [`Link`]，因此可以存放在 [`FreeList`] 上。
//!   它们的处置钩子是 [`recycle`]，会把对象放回来源链表而不是释放它。

mod base;
mod error;
mod free_list;
mod node;
mod ptr;
mod state;
mod sync;

pub use base::{Managed, RefCount, UnmanageKey};
pub use error::UsageError;
pub use free_list::{FreeList, FreeListBuilder};
pub use node::{Link, Recyclable, recycle};
pub use ptr::Shared;

#[cfg(all(test, not(feature = "loom")))]
mod tests;
