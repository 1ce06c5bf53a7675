use crate::context::DispatchContext;
use parking_lot::Mutex;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// A bounded free list of dispatch contexts, shared by cloning the handle.
#[derive(Clone)]
pub struct ContextPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    free: Mutex<Vec<DispatchContext>>,
    capacity: usize,
}

impl ContextPool {
    /// Creates a pool that keeps at most `capacity` idle contexts.
    pub fn new(capacity: usize) -> Self {
        Self { inner: Arc::new(PoolInner { free: Mutex::new(Vec::new()), capacity }) }
    }

    /// Takes an idle context, or creates one when none is left.
    pub fn acquire(&self) -> PooledContext {
        let ctx = self.inner.free.lock().pop().unwrap_or_default();
        PooledContext { ctx, pool: Arc::clone(&self.inner) }
    }

    pub fn idle(&self) -> usize {
        self.inner.free.lock().len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool").field("idle", &self.idle()).field("capacity", &self.capacity()).finish()
    }
}

/// A context on loan from a [`ContextPool`]. Reset and returned to the pool on drop.
pub struct PooledContext {
    ctx: DispatchContext,
    pool: Arc<PoolInner>,
}

impl Deref for PooledContext {
    type Target = DispatchContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

impl DerefMut for PooledContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ctx
    }
}

impl fmt::Debug for PooledContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledContext").field(&self.ctx).finish()
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        let mut ctx = std::mem::take(&mut self.ctx);
        ctx.reset();

        let mut free = self.pool.free.lock();
        if free.len() < self.pool.capacity {
            free.push(ctx);
        }
    }
}
