//! Building the scope tree from a document's JSON tree.
//!
//! The builder walks the template object once, creating definitions and
//! child scopes, and records which document region each scope governs so the
//! query engine can map any string back to the scope in effect there.

use crate::definitions::{
    NamespaceDefinition, ParameterDefinition, UserFunctionDefinition, UserFunctionParameter,
    VariableDefinition,
};
use crate::scope::{ScopeArena, ScopeContext, ScopeId, TemplateScope};
use tle_core::text::Span;
use tle_core::NameMap;
use tle_json::{ObjectValue, Value};

/// The resource type that introduces a nested/linked deployment.
const DEPLOYMENT_RESOURCE_TYPE: &str = "Microsoft.Resources/deployments";

/// Maps a document region to the scope governing expressions inside it.
#[derive(Debug, Clone, Copy)]
pub struct ScopeAttachment {
    pub span: Span,
    pub scope: ScopeId,
}

/// The built scope tree plus its region attachments.
#[derive(Debug)]
pub struct ScopeBundle {
    pub arena: ScopeArena,
    pub attachments: Vec<ScopeAttachment>,
}

impl ScopeBundle {
    /// The scope in effect at a document position: the attachment with the
    /// smallest containing region, or the top-level scope.
    pub fn scope_at(&self, pos: u32) -> ScopeId {
        self.attachments
            .iter()
            .filter(|a| a.span.contains(pos))
            .min_by_key(|a| a.span.length)
            .map(|a| a.scope)
            .unwrap_or(ScopeId::ROOT)
    }
}

/// Build the scope tree for a document. The root scope is always created,
/// even when the document failed to parse to an object.
pub fn build(root: Option<&Value>) -> ScopeBundle {
    let mut builder = Builder {
        arena: ScopeArena::new(),
        attachments: Vec::new(),
    };
    let top = builder
        .arena
        .alloc(TemplateScope::new(ScopeContext::TopLevel, None));
    debug_assert_eq!(top, ScopeId::ROOT);
    if let Some(template) = root.and_then(Value::as_object) {
        builder.populate(top, template);
    }
    ScopeBundle {
        arena: builder.arena,
        attachments: builder.attachments,
    }
}

struct Builder {
    arena: ScopeArena,
    attachments: Vec<ScopeAttachment>,
}

impl Builder {
    /// Fill a scope from a template object: parameters, variables, function
    /// namespaces, and any nested deployments among its resources.
    fn populate(&mut self, scope_id: ScopeId, template: &ObjectValue) {
        self.collect_parameters(scope_id, template);
        self.collect_variables(scope_id, template);
        self.collect_namespaces(scope_id, template);
        self.visit_resources(scope_id, template.property_value("resources"));
    }

    fn collect_parameters(&mut self, scope_id: ScopeId, template: &ObjectValue) {
        let Some(parameters) = template
            .property_value("parameters")
            .and_then(Value::as_object)
        else {
            return;
        };
        let mut default_scope = None;
        for property in &parameters.properties {
            let body = property.value.as_ref().and_then(Value::as_object);
            let definition = ParameterDefinition {
                name: property.name.value.clone(),
                name_span: property.name.unquoted_span(),
                full_span: property.span,
                declared_type: body.and_then(declared_type),
                default_value: body
                    .and_then(|b| b.property_value("defaultValue"))
                    .cloned(),
            };
            // Expressions inside a default value resolve against the scope
            // declaring the parameter, through a forwarding child scope.
            if let Some(default) = body.and_then(|b| b.property_value("defaultValue")) {
                let scope = *default_scope.get_or_insert_with(|| {
                    self.arena.alloc(TemplateScope::new(
                        ScopeContext::ParameterDefaultValue,
                        Some(scope_id),
                    ))
                });
                self.attachments.push(ScopeAttachment {
                    span: default.span(),
                    scope,
                });
            }
            if let Some(map) = self.arena.get_mut(scope_id).parameters.as_mut() {
                map.insert(definition.name.clone(), definition);
            }
        }
    }

    fn collect_variables(&mut self, scope_id: ScopeId, template: &ObjectValue) {
        let Some(variables) = template
            .property_value("variables")
            .and_then(Value::as_object)
        else {
            return;
        };
        for property in &variables.properties {
            let definition = VariableDefinition {
                name: property.name.value.clone(),
                name_span: property.name.unquoted_span(),
                full_span: property.span,
                value: property.value.clone(),
            };
            if let Some(map) = self.arena.get_mut(scope_id).variables.as_mut() {
                map.insert(definition.name.clone(), definition);
            }
        }
    }

    /// The `functions` section is an array of namespace objects, each with a
    /// `members` object of user function definitions.
    fn collect_namespaces(&mut self, scope_id: ScopeId, template: &ObjectValue) {
        let Some(namespaces) = template
            .property_value("functions")
            .and_then(Value::as_array)
        else {
            return;
        };
        for element in &namespaces.elements {
            let Some(ns_object) = element.as_object() else {
                continue;
            };
            let Some(ns_name) = ns_object
                .property_value("namespace")
                .and_then(Value::as_string)
            else {
                continue;
            };
            let mut members = NameMap::new();
            if let Some(member_obj) = ns_object.property_value("members").and_then(Value::as_object)
            {
                for member in &member_obj.properties {
                    let definition = self.build_user_function(
                        scope_id,
                        &ns_name.value,
                        member,
                    );
                    members.insert(definition.name.clone(), definition);
                }
            }
            let definition = NamespaceDefinition {
                name: ns_name.value.clone(),
                name_span: ns_name.unquoted_span(),
                full_span: ns_object.span,
                members,
            };
            if let Some(map) = self.arena.get_mut(scope_id).namespaces.as_mut() {
                map.insert(definition.name.clone(), definition);
            }
        }
    }

    fn build_user_function(
        &mut self,
        parent: ScopeId,
        namespace: &str,
        member: &tle_json::Property,
    ) -> UserFunctionDefinition {
        let body = member.value.as_ref().and_then(Value::as_object);

        let mut parameters = Vec::new();
        if let Some(list) = body
            .and_then(|b| b.property_value("parameters"))
            .and_then(Value::as_array)
        {
            for element in &list.elements {
                let Some(obj) = element.as_object() else {
                    continue;
                };
                let Some(name) = obj.property_value("name").and_then(Value::as_string) else {
                    continue;
                };
                parameters.push(UserFunctionParameter {
                    name: name.value.clone(),
                    name_span: name.unquoted_span(),
                    declared_type: declared_type(obj),
                });
            }
        }

        let output_type = body
            .and_then(|b| b.property_value("output"))
            .and_then(Value::as_object)
            .and_then(declared_type);

        // The function body is an isolated scope containing only the
        // declared parameters.
        let scope = self
            .arena
            .alloc(TemplateScope::new(ScopeContext::UserFunction, Some(parent)));
        for parameter in &parameters {
            let definition = ParameterDefinition {
                name: parameter.name.clone(),
                name_span: parameter.name_span,
                full_span: parameter.name_span,
                declared_type: parameter.declared_type.clone(),
                default_value: None,
            };
            if let Some(map) = self.arena.get_mut(scope).parameters.as_mut() {
                map.insert(definition.name.clone(), definition);
            }
        }
        self.attachments.push(ScopeAttachment {
            span: member.span,
            scope,
        });

        UserFunctionDefinition {
            name: member.name.value.clone(),
            name_span: member.name.unquoted_span(),
            full_span: member.span,
            namespace: namespace.to_string(),
            parameters,
            output_type,
            scope,
        }
    }

    /// Walk a `resources` array, descending into nested deployments and into
    /// resources nested under other resources.
    fn visit_resources(&mut self, scope_id: ScopeId, resources: Option<&Value>) {
        let Some(resources) = resources.and_then(Value::as_array) else {
            return;
        };
        for element in &resources.elements {
            let Some(resource) = element.as_object() else {
                continue;
            };
            if is_deployment_resource(resource) {
                self.visit_deployment(scope_id, resource);
            }
            self.visit_resources(scope_id, resource.property_value("resources"));
        }
    }

    fn visit_deployment(&mut self, parent: ScopeId, resource: &ObjectValue) {
        let Some(properties) = resource
            .property_value("properties")
            .and_then(Value::as_object)
        else {
            return;
        };
        let Some(template) = properties
            .property_value("template")
            .and_then(Value::as_object)
        else {
            return;
        };
        let context = evaluation_scope_context(properties);
        let child = self
            .arena
            .alloc(TemplateScope::new(context, Some(parent)));
        self.attachments.push(ScopeAttachment {
            span: template.span,
            scope: child,
        });
        // The child's own definitions are built either way: an inner scope
        // resolves against them; an outer scope's are inert for lookup but
        // still accounted for by the unused-definition check.
        self.populate(child, template);
    }
}

fn declared_type(object: &ObjectValue) -> Option<String> {
    object
        .property_value("type")
        .and_then(Value::as_string)
        .map(|s| s.value.clone())
}

fn is_deployment_resource(resource: &ObjectValue) -> bool {
    resource
        .property_value("type")
        .and_then(Value::as_string)
        .is_some_and(|s| s.value.eq_ignore_ascii_case(DEPLOYMENT_RESOURCE_TYPE))
}

/// The nested deployment scoping state machine: selected once, when the
/// scope is constructed, from `expressionEvaluationOptions.scope`. The match
/// is case-insensitive; a missing or unrecognized value falls back to outer.
fn evaluation_scope_context(properties: &ObjectValue) -> ScopeContext {
    let declared = properties
        .property_value("expressionEvaluationOptions")
        .and_then(Value::as_object)
        .and_then(|options| options.property_value("scope"))
        .and_then(Value::as_string);
    match declared {
        Some(s) if s.value.eq_ignore_ascii_case("inner") => ScopeContext::NestedDeploymentInner,
        _ => ScopeContext::NestedDeploymentOuter,
    }
}
