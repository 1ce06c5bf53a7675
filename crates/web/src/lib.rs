//! Controller dispatch on top of `micro-router`
//!
//! This crate takes the route a request matched and turns it into a call of a controller
//! action. Controllers are registered as descriptors; actions may be declared on the
//! controller itself or on any type it embeds, and are resolved once per route when the
//! [`Application`] is built or reloaded.
//!
//! # Features
//!
//! - Breadth first action resolution across embedded types, with ambiguity detection
//! - Pooled, resettable [`DispatchContext`]s carrying view args, reply state and reverse URLs
//! - Interceptors around every action
//! - Automatic `OPTIONS` responses
//! - Lock free lookups and atomic routing reloads
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use http::uri::Scheme;
//! use micro_dispatch::{
//!     action_fn, ActionDescriptor, Application, ControllerDescriptor, ControllerRegistry, Prepared, RequestInfo,
//! };
//! use micro_router::{DomainConfig, RouteConfig, RoutingConfig};
//!
//! # async fn run() -> Result<(), micro_dispatch::DispatchError> {
//! let controllers = ControllerRegistry::builder()
//!     .register(ControllerDescriptor::new("User").action(ActionDescriptor::new("Show").handler(action_fn(|ctx| {
//!         let id = ctx.param("id").unwrap_or_default().to_owned();
//!         ctx.reply_mut().text(format!("user {id}"));
//!         Ok(())
//!     }))))
//!     .build()?;
//!
//! let routing = RoutingConfig::new().domain(
//!     "localhost",
//!     DomainConfig::new("localhost").route("user", RouteConfig::new("/users/:id").controller("User").action("Show")),
//! );
//!
//! let app = Application::builder().routing(routing).controllers(controllers).build()?;
//!
//! let request = RequestInfo { scheme: Scheme::HTTP, host: "localhost", method: Method::GET, path: "/users/42" };
//! if let Prepared::Dispatch(mut ctx) = app.prepare(request)? {
//!     app.invoke(&mut ctx).await?;
//!     assert_eq!(ctx.reply().body_bytes().as_ref(), b"user 42");
//! }
//! # Ok(())
//! # }
//! ```

mod application;
mod context;
mod controller;
mod error;
mod handler;
mod interceptor;
mod pool;
mod registry;
mod reply;
mod target;

pub use application::{Application, ApplicationBuilder, Lookup, Prepared, Routing};
pub use context::{DispatchContext, RequestInfo, Resolved};
pub use controller::{ActionDescriptor, ControllerDescriptor, EmbeddedField, ParameterDescriptor, TypeTag};
pub use error::{ApplicationBuildError, DispatchError, RegistryError, ResolveError};
pub use handler::{action_fn, ActionHandler, AutoOptionsAction, BoxError, FnAction};
pub use interceptor::{Interceptor, Interceptors, InterceptorsBuilder};
pub use pool::{ContextPool, PooledContext, DEFAULT_POOL_CAPACITY};
pub use registry::{ControllerRegistry, ControllerRegistryBuilder};
pub use reply::{RedirectTarget, Reply};
pub use target::CallTarget;
