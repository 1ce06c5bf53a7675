//! Static metadata describing controllers, their actions and the types they embed.
//!
//! Controllers are plain registrations: a type name, the actions it declares and the
//! embedded fields it is composed of. Types that carry no actions, such as the shared
//! request plumbing type, are registered the same way so the embedding graph is closed.

use crate::handler::ActionHandler;
use std::fmt;
use std::sync::Arc;

/// Type of an action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Bytes,
    Json,
    Custom(String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::Int => f.write_str("int"),
            TypeTag::Uint => f.write_str("uint"),
            TypeTag::Float => f.write_str("float"),
            TypeTag::String => f.write_str("string"),
            TypeTag::Bytes => f.write_str("bytes"),
            TypeTag::Json => f.write_str("json"),
            TypeTag::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    kind: TypeTag,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeTag) -> Self {
        Self { name: name.into(), kind }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &TypeTag {
        &self.kind
    }
}

/// A named action with its ordered parameters and, optionally, the handler that runs it.
#[derive(Clone)]
pub struct ActionDescriptor {
    name: String,
    params: Vec<ParameterDescriptor>,
    handler: Option<Arc<dyn ActionHandler>>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: vec![], handler: None }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, kind: TypeTag) -> Self {
        self.params.push(ParameterDescriptor::new(name, kind));
        self
    }

    #[must_use]
    pub fn handler<H: ActionHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    #[inline]
    pub fn action_handler(&self) -> Option<&dyn ActionHandler> {
        self.handler.as_deref()
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// An embedded field: its position in the declaring type and the embedded type's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedField {
    index: usize,
    type_name: String,
}

impl EmbeddedField {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

#[derive(Debug, Clone)]
pub struct ControllerDescriptor {
    name: String,
    actions: Vec<Arc<ActionDescriptor>>,
    embedded: Vec<EmbeddedField>,
}

impl ControllerDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), actions: vec![], embedded: vec![] }
    }

    #[must_use]
    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    /// Embeds `type_name` as the field at `index`. Fields are kept in index order.
    #[must_use]
    pub fn embed(mut self, index: usize, type_name: impl Into<String>) -> Self {
        let field = EmbeddedField { index, type_name: type_name.into() };
        let at = self.embedded.partition_point(|f| f.index <= index);
        self.embedded.insert(at, field);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn actions(&self) -> &[Arc<ActionDescriptor>] {
        &self.actions
    }

    #[inline]
    pub fn embedded(&self) -> &[EmbeddedField] {
        &self.embedded
    }

    /// Looks up an action declared directly on this type. Names are case-sensitive.
    pub fn find_action(&self, name: &str) -> Option<&Arc<ActionDescriptor>> {
        self.actions.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_fields_are_ordered() {
        let controller = ControllerDescriptor::new("Path2").embed(2, "Level4").embed(0, "Level1").embed(1, "Path1");
        let names: Vec<_> = controller.embedded().iter().map(EmbeddedField::type_name).collect();
        assert_eq!(names, ["Level1", "Path1", "Level4"]);
    }

    #[test]
    fn test_find_action_is_case_sensitive() {
        let controller = ControllerDescriptor::new("Level3")
            .action(ActionDescriptor::new("Testing").param("userId", TypeTag::Int));

        let action = controller.find_action("Testing").unwrap();
        assert_eq!(action.params()[0].name(), "userId");
        assert_eq!(action.params()[0].kind(), &TypeTag::Int);
        assert!(controller.find_action("testing").is_none());
    }

    #[test]
    fn test_type_tag_display() {
        assert_eq!(TypeTag::Int.to_string(), "int");
        assert_eq!(TypeTag::Custom("models.User".into()).to_string(), "models.User");
    }
}
