use crate::context::DispatchContext;
use async_trait::async_trait;
use http::{header, StatusCode};
use std::error::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Runs a controller action against a bound dispatch context.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn invoke(&self, ctx: &mut DispatchContext) -> Result<(), BoxError>;
}

/// An [`ActionHandler`] backed by a synchronous closure.
#[derive(Debug)]
pub struct FnAction<F> {
    f: F,
}

pub fn action_fn<F>(f: F) -> FnAction<F>
where
    F: Fn(&mut DispatchContext) -> Result<(), BoxError> + Send + Sync,
{
    FnAction { f }
}

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&mut DispatchContext) -> Result<(), BoxError> + Send + Sync,
{
    async fn invoke(&self, ctx: &mut DispatchContext) -> Result<(), BoxError> {
        (self.f)(ctx)
    }
}

/// Answers an `OPTIONS` request with the methods registered for the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoOptionsAction;

#[async_trait]
impl ActionHandler for AutoOptionsAction {
    async fn invoke(&self, ctx: &mut DispatchContext) -> Result<(), BoxError> {
        let allow = match ctx.allowed() {
            Some(allowed) => allowed.to_header_value()?,
            None => return Err("options request is not bound to an allowed method set".into()),
        };
        ctx.reply_mut().status(StatusCode::OK).header(header::ALLOW, allow);
        Ok(())
    }
}
