//! The scope tree and its lookup rules.

use crate::definitions::{
    NamespaceDefinition, ParameterDefinition, UserFunctionDefinition, VariableDefinition,
};
use tle_core::NameMap;

/// An index into a [`ScopeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The document's top-level scope.
    pub const ROOT: ScopeId = ScopeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a scope sits in the document, which determines its lookup behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeContext {
    TopLevel,
    /// A parameter's default-value expression; references resolve against
    /// the scope that declared the parameter.
    ParameterDefaultValue,
    /// A user-defined function body: fully isolated, sees only its own
    /// declared parameters.
    UserFunction,
    /// A nested deployment's inline template with `"scope": "inner"`:
    /// semantically isolated from the parent even though physically nested.
    NestedDeploymentInner,
    /// A nested deployment's inline template with outer scoping (the
    /// default): its own definitions are inert, and references inside it
    /// resolve against the parent as if the boundary were transparent.
    NestedDeploymentOuter,
}

/// One scope: the definitions declared at one level of the document.
///
/// `None` for a definition list means that kind of definition is not legal
/// in this context (e.g. variables inside a user-function body), as distinct
/// from an empty list (legal but none exist).
#[derive(Debug)]
pub struct TemplateScope {
    pub context: ScopeContext,
    pub parent: Option<ScopeId>,
    pub parameters: Option<NameMap<ParameterDefinition>>,
    pub variables: Option<NameMap<VariableDefinition>>,
    pub namespaces: Option<NameMap<NamespaceDefinition>>,
}

impl TemplateScope {
    pub fn new(context: ScopeContext, parent: Option<ScopeId>) -> Self {
        let (parameters, variables, namespaces) = match context {
            ScopeContext::TopLevel
            | ScopeContext::NestedDeploymentInner
            | ScopeContext::NestedDeploymentOuter => {
                (Some(NameMap::new()), Some(NameMap::new()), Some(NameMap::new()))
            }
            // A function body declares only parameters.
            ScopeContext::UserFunction => (Some(NameMap::new()), None, None),
            // A default-value expression declares nothing of its own.
            ScopeContext::ParameterDefaultValue => (None, None, None),
        };
        Self {
            context,
            parent,
            parameters,
            variables,
            namespaces,
        }
    }

    /// Whether lookups skip this scope's own definitions and resolve against
    /// the parent instead.
    pub fn forwards_to_parent(&self) -> bool {
        matches!(
            self.context,
            ScopeContext::NestedDeploymentOuter | ScopeContext::ParameterDefaultValue
        )
    }
}

/// The scope tree, stored flat and addressed by [`ScopeId`]. Built once per
/// document snapshot and immutable afterwards.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<TemplateScope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, scope: TemplateScope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    #[inline]
    pub fn get(&self, id: ScopeId) -> &TemplateScope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut TemplateScope {
        &mut self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &TemplateScope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    /// The scope a lookup from `id` actually resolves against. Isolated
    /// scopes resolve against themselves; forwarding scopes walk to the
    /// parent. The walk stops immediately for isolated children.
    pub fn resolution_scope(&self, id: ScopeId) -> ScopeId {
        let mut current = id;
        loop {
            let scope = self.get(current);
            match scope.parent {
                Some(parent) if scope.forwards_to_parent() => current = parent,
                _ => return current,
            }
        }
    }

    pub fn parameter_definition(&self, id: ScopeId, name: &str) -> Option<&ParameterDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope.parameters.as_ref()?.get(name)
    }

    pub fn variable_definition(&self, id: ScopeId, name: &str) -> Option<&VariableDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope.variables.as_ref()?.get(name)
    }

    pub fn namespace_definition(&self, id: ScopeId, name: &str) -> Option<&NamespaceDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope.namespaces.as_ref()?.get(name)
    }

    pub fn user_function_definition(
        &self,
        id: ScopeId,
        namespace: &str,
        name: &str,
    ) -> Option<&UserFunctionDefinition> {
        self.namespace_definition(id, namespace)?.members.get(name)
    }

    // ------------------------------------------------------------------
    // Prefix searches, feeding completion.
    // ------------------------------------------------------------------

    pub fn parameter_definitions_with_prefix(
        &self,
        id: ScopeId,
        prefix: &str,
    ) -> Vec<&ParameterDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope
            .parameters
            .as_ref()
            .map(|map| map.values_with_prefix(prefix))
            .unwrap_or_default()
    }

    pub fn variable_definitions_with_prefix(
        &self,
        id: ScopeId,
        prefix: &str,
    ) -> Vec<&VariableDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope
            .variables
            .as_ref()
            .map(|map| map.values_with_prefix(prefix))
            .unwrap_or_default()
    }

    pub fn namespace_definitions_with_prefix(
        &self,
        id: ScopeId,
        prefix: &str,
    ) -> Vec<&NamespaceDefinition> {
        let scope = self.get(self.resolution_scope(id));
        scope
            .namespaces
            .as_ref()
            .map(|map| map.values_with_prefix(prefix))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::ParameterDefinition;
    use tle_core::text::Span;

    fn parameter(name: &str, start: u32) -> ParameterDefinition {
        ParameterDefinition {
            name: name.to_string(),
            name_span: Span::new(start, name.len() as u32),
            full_span: Span::new(start, name.len() as u32 + 10),
            declared_type: None,
            default_value: None,
        }
    }

    fn insert_parameter(arena: &mut ScopeArena, id: ScopeId, name: &str, start: u32) {
        let def = parameter(name, start);
        arena
            .get_mut(id)
            .parameters
            .as_mut()
            .unwrap()
            .insert(name.to_string(), def);
    }

    #[test]
    fn test_last_definition_wins() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        insert_parameter(&mut arena, top, "p1", 10);
        insert_parameter(&mut arena, top, "P1", 50);
        let hit = arena.parameter_definition(top, "p1").unwrap();
        assert_eq!(hit.name_span.start, 50);
    }

    #[test]
    fn test_lookup_ignores_quotes_and_case() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        insert_parameter(&mut arena, top, "storageName", 5);
        assert!(arena.parameter_definition(top, "'STORAGEname'").is_some());
    }

    #[test]
    fn test_inner_scope_is_isolated() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        let inner = arena.alloc(TemplateScope::new(
            ScopeContext::NestedDeploymentInner,
            Some(top),
        ));
        insert_parameter(&mut arena, top, "outerParam", 5);
        insert_parameter(&mut arena, inner, "innerParam", 100);

        // Parent lookup never crosses into the child, and vice versa.
        assert!(arena.parameter_definition(top, "innerParam").is_none());
        assert!(arena.parameter_definition(inner, "outerParam").is_none());
        assert!(arena.parameter_definition(inner, "innerParam").is_some());
    }

    #[test]
    fn test_outer_scope_forwards_and_own_definitions_are_inert() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        let outer = arena.alloc(TemplateScope::new(
            ScopeContext::NestedDeploymentOuter,
            Some(top),
        ));
        insert_parameter(&mut arena, top, "outerParam", 5);
        insert_parameter(&mut arena, outer, "shadowed", 100);

        assert!(arena.parameter_definition(outer, "outerParam").is_some());
        // The child's own definitions can never be reached.
        assert!(arena.parameter_definition(outer, "shadowed").is_none());
    }

    #[test]
    fn test_user_function_scope_never_sees_top_level() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        let body = arena.alloc(TemplateScope::new(ScopeContext::UserFunction, Some(top)));
        insert_parameter(&mut arena, top, "topParam", 5);
        insert_parameter(&mut arena, body, "fnParam", 100);

        assert!(arena.parameter_definition(body, "topParam").is_none());
        assert!(arena.parameter_definition(body, "fnParam").is_some());
        // Variables are not legal in a function body at all.
        assert!(arena.get(body).variables.is_none());
        assert!(arena.variable_definition(body, "anything").is_none());
    }

    #[test]
    fn test_prefix_search() {
        let mut arena = ScopeArena::new();
        let top = arena.alloc(TemplateScope::new(ScopeContext::TopLevel, None));
        insert_parameter(&mut arena, top, "storageName", 5);
        insert_parameter(&mut arena, top, "storageKind", 40);
        insert_parameter(&mut arena, top, "location", 80);
        let hits = arena.parameter_definitions_with_prefix(top, "STOR");
        assert_eq!(hits.len(), 2);
    }
}
