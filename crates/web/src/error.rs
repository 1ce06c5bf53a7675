use crate::handler::BoxError;
use micro_router::{ConfigError, LookupError};
use thiserror::Error;

/// A controller registry that cannot be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("type '{name}' is registered more than once")]
    DuplicateType { name: String },

    #[error("type '{controller}' declares action '{action}' more than once")]
    DuplicateAction { controller: String, action: String },

    #[error("type '{controller}' declares field index {index} more than once")]
    DuplicateField { controller: String, index: usize },

    #[error("type '{controller}' embeds unregistered type '{embedded}'")]
    UnknownEmbeddedType { controller: String, embedded: String },

    #[error("embedding cycle: {cycle}")]
    EmbeddingCycle { cycle: String },

    #[error("base type '{name}' is not registered")]
    UnknownBaseType { name: String },
}

/// A controller action that cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("controller '{controller}' not found")]
    ControllerNotFound { controller: String },

    #[error("action '{action}' not found on controller '{controller}'")]
    ActionNotFound { controller: String, action: String },

    #[error("action '{action}' of controller '{controller}' is ambiguous between {}", candidates.join(", "))]
    AmbiguousAction { controller: String, action: String, candidates: Vec<String> },
}

impl ResolveError {
    pub fn controller_not_found<S: ToString>(controller: S) -> Self {
        Self::ControllerNotFound { controller: controller.to_string() }
    }

    pub fn action_not_found<C: ToString, A: ToString>(controller: C, action: A) -> Self {
        Self::ActionNotFound { controller: controller.to_string(), action: action.to_string() }
    }
}

/// An [`crate::Application`] that cannot be built.
#[derive(Error, Debug)]
pub enum ApplicationBuildError {
    #[error("routing configuration must be set")]
    MissingRouting,

    #[error("controller registry must be set")]
    MissingControllers,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Build(#[from] ApplicationBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("dispatch context is not bound to a call target")]
    Unbound,

    #[error("no handler is registered for {controller}.{action}")]
    MissingHandler { controller: String, action: String },

    #[error("action failed: {0}")]
    Handler(#[source] BoxError),
}

impl DispatchError {
    pub fn missing_handler<C: ToString, A: ToString>(controller: C, action: A) -> Self {
        Self::MissingHandler { controller: controller.to_string(), action: action.to_string() }
    }
}
