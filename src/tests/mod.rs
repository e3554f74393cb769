//! 测试公共夹具
//! 提供普通受管对象和池化对象
use crate::{FreeList, Link, Managed, Recyclable, RefCount, UnmanageKey, recycle};
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};


/// 普通受管对象：最后一个句柄 drop 时被销毁
pub(crate) struct Tracked {
    rc: RefCount,
    pub(crate) value: i32,
    drops: Arc<AtomicUsize>,
}

impl Tracked {
    pub(crate) fn new(value: i32, drops: &Arc<AtomicUsize>) -> Self {
        Self {
            rc: RefCount::new(),
            value,
            drops: Arc::clone(drops),
        }
    }
}

unsafe impl Managed for Tracked {
    fn ref_count(&self) -> &RefCount {
        &self.rc
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// 另一种受管类型，用于跨类型比较
pub(crate) struct Other {
    rc: RefCount,
}

impl Other {
    pub(crate) fn new() -> Self {
        Self { rc: RefCount::new() }
    }
}

unsafe impl Managed for Other {
    fn ref_count(&self) -> &RefCount {
        &self.rc
    }
}

/// 池化对象：最后一个句柄 drop 时回到空闲链表
pub(crate) struct Frame {
    rc: RefCount,
    link: Link<Frame>,
    pub(crate) id: usize,
    pub(crate) in_use: AtomicBool,
    pub(crate) payload: Vec<u8>,
    drops: Arc<AtomicUsize>,
}

impl Frame {
    pub(crate) fn new(id: usize, drops: &Arc<AtomicUsize>) -> Self {
        Self {
            rc: RefCount::new(),
            link: Link::new(),
            id,
            in_use: AtomicBool::new(false),
            payload: Vec::new(),
            drops: Arc::clone(drops),
        }
    }
}

unsafe impl Managed for Frame {
    fn ref_count(&self) -> &RefCount {
        &self.rc
    }

    unsafe fn unmanage(this: NonNull<Self>, key: &UnmanageKey) {
        unsafe { recycle(this, key) }
    }
}

unsafe impl Recyclable for Frame {
    fn link(&self) -> &Link<Self> {
        &self.link
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// 创建一个预填充 `count` 个节点的池，节点 id 从 0 开始
pub(crate) fn seeded_pool(count: usize, drops: &Arc<AtomicUsize>) -> FreeList<Frame> {
    let mut id = 0;
    FreeList::builder()
        .label("test-frames")
        .prefill(count, || {
            let frame = Frame::new(id, drops);
            id += 1;
            frame
        })
        .build()
}
