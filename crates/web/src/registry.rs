//! Registry of controller types and resolution of actions across embedded types.
//!
//! An action may be declared by the controller or by any type it embeds, directly or
//! transitively. Resolution walks the embedding graph breadth first, visiting fields in
//! index order. The shallowest depth holding a declaration wins; two declarations at
//! that depth make the action ambiguous.

use crate::controller::ControllerDescriptor;
use crate::error::{RegistryError, ResolveError};
use crate::target::CallTarget;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct ControllerRegistry {
    types: HashMap<String, ControllerDescriptor>,
    base_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct ControllerRegistryBuilder {
    types: Vec<ControllerDescriptor>,
    base_type: Option<String>,
}

impl ControllerRegistryBuilder {
    #[must_use]
    pub fn register(mut self, descriptor: ControllerDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Type whose embedding paths every call target carries.
    #[must_use]
    pub fn base_type(mut self, name: impl Into<String>) -> Self {
        self.base_type = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ControllerRegistry, RegistryError> {
        let mut types = HashMap::with_capacity(self.types.len());

        for descriptor in self.types {
            check_unique_members(&descriptor)?;

            let name = descriptor.name().to_owned();
            if types.insert(name.clone(), descriptor).is_some() {
                return Err(RegistryError::DuplicateType { name });
            }
        }

        for descriptor in types.values() {
            if let Some(field) = descriptor.embedded().iter().find(|f| !types.contains_key(f.type_name())) {
                return Err(RegistryError::UnknownEmbeddedType {
                    controller: descriptor.name().to_owned(),
                    embedded: field.type_name().to_owned(),
                });
            }
        }

        if let Some(base) = &self.base_type {
            if !types.contains_key(base) {
                return Err(RegistryError::UnknownBaseType { name: base.clone() });
            }
        }

        let registry = ControllerRegistry { types, base_type: self.base_type };
        registry.check_cycles()?;

        debug!(types = registry.types.len(), base_type = ?registry.base_type, "controller registry built");
        Ok(registry)
    }
}

fn check_unique_members(descriptor: &ControllerDescriptor) -> Result<(), RegistryError> {
    let mut actions = HashSet::new();
    if let Some(action) = descriptor.actions().iter().find(|a| !actions.insert(a.name())) {
        return Err(RegistryError::DuplicateAction {
            controller: descriptor.name().to_owned(),
            action: action.name().to_owned(),
        });
    }

    let mut fields = HashSet::new();
    if let Some(field) = descriptor.embedded().iter().find(|f| !fields.insert(f.index())) {
        return Err(RegistryError::DuplicateField { controller: descriptor.name().to_owned(), index: field.index() });
    }
    Ok(())
}

/// A type reached during the breadth first walk and the field path leading to it.
type Step<'r> = (&'r ControllerDescriptor, Vec<usize>);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl ControllerRegistry {
    pub fn builder() -> ControllerRegistryBuilder {
        ControllerRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&ControllerDescriptor> {
        self.types.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn base_type(&self) -> Option<&str> {
        self.base_type.as_deref()
    }

    /// Resolves `action` on `controller`, searching embedded types breadth first.
    pub fn resolve(&self, controller: &str, action: &str) -> Result<CallTarget, ResolveError> {
        let root = self.types.get(controller).ok_or_else(|| ResolveError::controller_not_found(controller))?;

        let mut expanded = HashSet::from([root.name()]);
        let mut level = vec![(root, Vec::new())];
        while !level.is_empty() {
            let mut found = level.iter().filter_map(|(ty, path)| ty.find_action(action).map(|a| (*ty, path, a)));

            if let Some((declared_by, path, descriptor)) = found.next() {
                let others: Vec<_> = found.collect();
                if !others.is_empty() {
                    let candidates = std::iter::once((declared_by, path))
                        .chain(others.into_iter().map(|(ty, path, _)| (ty, path)))
                        .map(|(ty, path)| format!("{}{path:?}", ty.name()))
                        .collect();
                    return Err(ResolveError::AmbiguousAction {
                        controller: controller.to_owned(),
                        action: action.to_owned(),
                        candidates,
                    });
                }

                let base_paths = match &self.base_type {
                    Some(base) => self.paths_to(root, base),
                    None => vec![],
                };

                return Ok(CallTarget {
                    controller: controller.to_owned(),
                    declared_by: declared_by.name().to_owned(),
                    action: Arc::clone(descriptor),
                    embedded_path: path.clone(),
                    base_paths,
                });
            }

            level = prune(self.next_level(&level), &mut expanded);
        }

        Err(ResolveError::action_not_found(controller, action))
    }

    /// Every field index path from `controller` to an embedded `type_name`, breadth first.
    pub fn embedded_paths(&self, controller: &str, type_name: &str) -> Result<Vec<Vec<usize>>, ResolveError> {
        let root = self.types.get(controller).ok_or_else(|| ResolveError::controller_not_found(controller))?;
        Ok(self.paths_to(root, type_name))
    }

    fn paths_to<'r>(&'r self, root: &'r ControllerDescriptor, type_name: &str) -> Vec<Vec<usize>> {
        let mut paths = vec![];
        let mut level = self.next_level(&[(root, Vec::new())]);
        while !level.is_empty() {
            paths.extend(level.iter().filter(|(ty, _)| ty.name() == type_name).map(|(_, path)| path.clone()));
            level = self.next_level(&level);
        }
        paths
    }

    fn next_level<'r>(&'r self, level: &[Step<'r>]) -> Vec<Step<'r>> {
        let mut next = vec![];
        for (ty, path) in level {
            for field in ty.embedded() {
                if let Some(embedded) = self.types.get(field.type_name()) {
                    let mut path = path.clone();
                    path.push(field.index());
                    next.push((embedded, path));
                }
            }
        }
        next
    }

    fn check_cycles(&self) -> Result<(), RegistryError> {
        let mut visits = HashMap::with_capacity(self.types.len());
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();

        for name in names {
            let mut stack = vec![];
            self.visit(name, &mut visits, &mut stack)?;
        }
        Ok(())
    }

    fn visit<'r>(
        &'r self,
        name: &'r str,
        visits: &mut HashMap<&'r str, Visit>,
        stack: &mut Vec<&'r str>,
    ) -> Result<(), RegistryError> {
        match visits.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle = stack[start..].to_vec();
                cycle.push(name);
                return Err(RegistryError::EmbeddingCycle { cycle: cycle.join(" -> ") });
            }
            None => {}
        }

        visits.insert(name, Visit::InProgress);
        stack.push(name);
        if let Some(descriptor) = self.types.get(name) {
            for field in descriptor.embedded() {
                self.visit(field.type_name(), visits, stack)?;
            }
        }
        stack.pop();
        visits.insert(name, Visit::Done);
        Ok(())
    }
}

/// Narrows a resolution level: types already reached at a shallower depth are dropped, and
/// each remaining type keeps at most two paths, enough to tell a single declaration from an
/// ambiguous one.
fn prune<'r>(level: Vec<Step<'r>>, expanded: &mut HashSet<&'r str>) -> Vec<Step<'r>> {
    let mut counts: HashMap<&str, u8> = HashMap::new();
    let level: Vec<Step<'r>> = level
        .into_iter()
        .filter(|(ty, _)| {
            if expanded.contains(ty.name()) {
                return false;
            }
            let count = counts.entry(ty.name()).or_default();
            *count += 1;
            *count <= 2
        })
        .collect();
    expanded.extend(level.iter().map(|(ty, _)| ty.name()));
    level
}
