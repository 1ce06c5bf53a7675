use crate::controller::ActionDescriptor;
use crate::handler::AutoOptionsAction;
use once_cell::sync::Lazy;
use std::sync::Arc;

static AUTO_OPTIONS: Lazy<Arc<CallTarget>> = Lazy::new(|| {
    Arc::new(CallTarget {
        controller: String::new(),
        declared_by: String::new(),
        action: Arc::new(ActionDescriptor::new("Options").handler(AutoOptionsAction)),
        embedded_path: vec![],
        base_paths: vec![],
    })
});

/// A resolved controller action.
#[derive(Debug, Clone)]
pub struct CallTarget {
    pub(crate) controller: String,
    pub(crate) declared_by: String,
    pub(crate) action: Arc<ActionDescriptor>,
    pub(crate) embedded_path: Vec<usize>,
    pub(crate) base_paths: Vec<Vec<usize>>,
}

impl CallTarget {
    /// Target of synthesized `OPTIONS` responses.
    pub fn auto_options() -> Arc<CallTarget> {
        Arc::clone(&AUTO_OPTIONS)
    }

    pub fn is_auto_options(&self) -> bool {
        std::ptr::eq(self, AUTO_OPTIONS.as_ref())
    }

    /// Controller the route names.
    #[inline]
    pub fn controller(&self) -> &str {
        &self.controller
    }

    /// Type that declares the action, the controller itself or one it embeds.
    #[inline]
    pub fn declared_by(&self) -> &str {
        &self.declared_by
    }

    #[inline]
    pub fn action(&self) -> &ActionDescriptor {
        &self.action
    }

    /// Field indices leading from the controller to [`CallTarget::declared_by`], empty when
    /// the controller declares the action itself.
    #[inline]
    pub fn embedded_path(&self) -> &[usize] {
        &self.embedded_path
    }

    /// Field index paths from the controller to every embedded base type, breadth first.
    #[inline]
    pub fn base_paths(&self) -> &[Vec<usize>] {
        &self.base_paths
    }
}
