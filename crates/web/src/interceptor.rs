use crate::context::DispatchContext;
use async_trait::async_trait;
use std::fmt;

/// Hooks around action invocation.
///
/// `before` runs ahead of the action and may [`DispatchContext::abort`] the request; the
/// action and the remaining hooks are then skipped. `after` runs once the action succeeded.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn before(&self, _ctx: &mut DispatchContext) {}

    async fn after(&self, _ctx: &mut DispatchContext) {}
}

pub struct Interceptors {
    inner: Vec<Box<dyn Interceptor>>,
}

#[async_trait]
impl Interceptor for Interceptors {
    async fn before(&self, ctx: &mut DispatchContext) {
        for interceptor in &self.inner {
            interceptor.before(ctx).await;
            if ctx.is_aborted() {
                return;
            }
        }
    }

    async fn after(&self, ctx: &mut DispatchContext) {
        for interceptor in &self.inner {
            interceptor.after(ctx).await;
            if ctx.is_aborted() {
                return;
            }
        }
    }
}

impl Interceptors {
    pub fn builder() -> InterceptorsBuilder {
        InterceptorsBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Interceptors {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors").field("len", &self.inner.len()).finish()
    }
}

pub struct InterceptorsBuilder {
    inner: Vec<Box<dyn Interceptor>>,
}

impl InterceptorsBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    #[must_use]
    pub fn add_last<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.push(Box::new(interceptor));
        self
    }

    #[must_use]
    pub fn add_first<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.insert(0, Box::new(interceptor));
        self
    }

    pub fn build(self) -> Interceptors {
        Interceptors { inner: self.inner }
    }
}

impl fmt::Debug for InterceptorsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorsBuilder").field("len", &self.inner.len()).finish()
    }
}
