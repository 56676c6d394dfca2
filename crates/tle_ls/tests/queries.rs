//! End-to-end queries over whole documents.

use tle_core::Span;
use tle_ls::DeploymentTemplate;
use tle_scopes::DefinitionKind;

fn offset_of(text: &str, pattern: &str) -> u32 {
    text.find(pattern).unwrap() as u32
}

#[test]
fn test_undefined_variable_reference_in_document() {
    let text = r#"{
        "parameters": { "p1": { "type": "string" } },
        "resources": [ { "name": "[variables('p1')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let diagnostics = template.diagnostics();

    let undefined: Vec<_> = diagnostics.iter().filter(|i| i.code == 2001).collect();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].message, "Undefined variable reference: 'p1'");
    // Anchored on the argument token, in document coordinates.
    let arg = offset_of(text, "('p1')") + 1;
    assert_eq!(undefined[0].span, Span::new(arg, 4));
}

#[test]
fn test_diagnostics_are_sorted_by_position() {
    let text = r#"{
        "resources": [
            { "name": "[concat(]" },
            { "name": "[bogus()]" }
        ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let diagnostics = template.diagnostics();
    assert!(!diagnostics.is_empty());
    let starts: Vec<_> = diagnostics.iter().map(|i| i.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

#[test]
fn test_escaped_bracket_string_is_clean() {
    let text = r#"{ "resources": [ { "name": "[[not an expression" } ] }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    assert!(template.diagnostics().is_empty());
}

#[test]
fn test_outer_is_the_default_and_the_fallback() {
    for options in [
        "",
        r#""expressionEvaluationOptions": { "scope": "sideways" },"#,
        r#""expressionEvaluationOptions": { "scope": "OUTER" },"#,
    ] {
        let text = format!(
            r#"{{
                "parameters": {{ "topParam": {{ "type": "string" }} }},
                "resources": [{{
                    "type": "Microsoft.Resources/deployments",
                    "name": "nested",
                    "properties": {{
                        {options}
                        "template": {{
                            "resources": [ {{ "name": "[parameters('topParam')]" }} ]
                        }}
                    }}
                }}]
            }}"#
        );
        let template = DeploymentTemplate::parse(&text).unwrap();
        let diagnostics = template.diagnostics();
        // The parent's parameter is visible through the nested boundary.
        assert!(
            !diagnostics.iter().any(|i| i.code == 2000),
            "options {options:?}: {diagnostics:?}"
        );
        assert!(!diagnostics
            .iter()
            .any(|i| i.message == "The parameter 'topParam' is never used."));
    }
}

#[test]
fn test_inner_scope_isolates_both_directions() {
    let text = r#"{
        "parameters": { "topParam": { "type": "string" } },
        "resources": [{
            "type": "Microsoft.Resources/deployments",
            "name": "nested",
            "properties": {
                "expressionEvaluationOptions": { "scope": "inner" },
                "template": {
                    "parameters": { "innerParam": { "type": "string" } },
                    "resources": [
                        { "name": "[parameters('innerParam')]" },
                        { "name": "[parameters('topParam')]" }
                    ]
                }
            }
        }]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let diagnostics = template.diagnostics();

    let undefined: Vec<_> = diagnostics.iter().filter(|i| i.code == 2000).collect();
    assert_eq!(undefined.len(), 1);
    assert_eq!(
        undefined[0].message,
        "Undefined parameter reference: 'topParam'"
    );
    // The inner parameter resolved; the top-level one is never used.
    assert!(diagnostics
        .iter()
        .any(|i| i.message == "The parameter 'topParam' is never used."));
    assert!(!diagnostics
        .iter()
        .any(|i| i.message == "The parameter 'innerParam' is never used."));
}

#[test]
fn test_find_references_from_the_definition() {
    // One use appears before the definition in the text, one after.
    let text = r#"{
        "variables": { "early": "[parameters('storageName')]" },
        "parameters": { "storageName": { "type": "string" } },
        "resources": [ { "name": "[parameters('storageName')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();

    let definition = offset_of(text, "\"storageName\"") + 1;
    let context = template.context_at(definition + 2).unwrap();
    let references = context.references().unwrap();

    assert_eq!(references.kind, DefinitionKind::Parameter);
    assert_eq!(references.spans.len(), 3);
    let starts: Vec<_> = references.spans.iter().map(|s| s.start).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);

    // The definition's own name is one of the three.
    assert!(references.spans.contains(&Span::new(definition, 11)));
    // Use sites are reported without their quotes.
    let first_use = offset_of(text, "parameters('storageName')") + 12;
    assert!(references.spans.contains(&Span::new(first_use, 11)));
}

#[test]
fn test_find_references_from_a_use() {
    let text = r#"{
        "parameters": { "storageName": { "type": "string" } },
        "resources": [ { "name": "[parameters('storageName')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();

    let use_site = offset_of(text, "('storageName')") + 2;
    let context = template.context_at(use_site).unwrap();
    let references = context.references().unwrap();
    assert_eq!(references.spans.len(), 2);

    let info = context.reference_site_info().unwrap();
    assert_eq!(info.kind, DefinitionKind::Parameter);
    assert!(!info.is_definition);
    let definition = offset_of(text, "\"storageName\"") + 1;
    assert_eq!(info.definition_span, Span::new(definition, 11));

    let at_definition = template.context_at(definition + 1).unwrap();
    assert!(at_definition.reference_site_info().unwrap().is_definition);
}

#[test]
fn test_hover_over_parameter_reference() {
    let text = r#"{
        "parameters": { "storageName": { "type": "string" } },
        "resources": [ { "name": "[parameters('storageName')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let use_site = offset_of(text, "('storageName')") + 2;
    let context = template.context_at(use_site).unwrap();
    assert_eq!(
        context.hover_info().unwrap(),
        "(parameter) storageName: string"
    );
}

#[test]
fn test_hover_over_builtin_function() {
    let text = r#"{ "resources": [ { "name": "[concat('a', 'b')]" } ] }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let name = offset_of(text, "concat") + 2;
    let context = template.context_at(name).unwrap();
    let hover = context.hover_info().unwrap();
    assert!(hover.starts_with("concat(arg1, arg2, arg3, ...)"));
    // Built-ins have no definition in the document.
    assert!(context.references().is_none());
    assert!(context.reference_site_info().is_none());
}

#[test]
fn test_hover_over_user_function() {
    let text = r#"{
        "functions": [{
            "namespace": "contoso",
            "members": {
                "pick": { "parameters": [ { "name": "a" }, { "name": "b" } ] }
            }
        }],
        "resources": [ { "name": "[contoso.pick('x', 'y')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();

    let name = offset_of(text, "contoso.pick") + 9;
    let context = template.context_at(name).unwrap();
    assert_eq!(
        context.hover_info().unwrap(),
        "(user-defined function) contoso.pick(a, b)"
    );
    let info = context.reference_site_info().unwrap();
    assert_eq!(info.kind, DefinitionKind::UserFunction);

    let namespace = offset_of(text, "contoso.pick") + 2;
    let context = template.context_at(namespace).unwrap();
    assert_eq!(
        context.hover_info().unwrap(),
        "(user-defined namespace) contoso"
    );
}

#[test]
fn test_completion_anchor_inside_reference_argument() {
    let text = r#"{
        "parameters": { "storageName": { "type": "string" } },
        "resources": [ { "name": "[parameters('storageName')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let name_start = offset_of(text, "('storageName')") + 2;
    let context = template.context_at(name_start + 3).unwrap();
    // The anchor covers the name without its quotes.
    assert_eq!(context.completion_anchor(), Span::new(name_start, 11));
}

#[test]
fn test_completion_anchor_on_function_name() {
    let text = r#"{ "resources": [ { "name": "[concat('a')]" } ] }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let name = offset_of(text, "concat");
    let context = template.context_at(name + 3).unwrap();
    assert_eq!(context.completion_anchor(), Span::new(name, 6));
}

#[test]
fn test_context_outside_any_string() {
    let text = r#"{ "resources": [ ] }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    assert!(template.context_at(0).is_none());
}

#[test]
fn test_parameter_default_value_resolves_in_declaring_scope() {
    let text = r#"{
        "parameters": {
            "first": { "type": "string" },
            "second": { "type": "string", "defaultValue": "[parameters('first')]" }
        },
        "resources": [ { "name": "[parameters('second')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let diagnostics = template.diagnostics();
    assert!(!diagnostics.iter().any(|i| i.code == 2000), "{diagnostics:?}");
    assert!(!diagnostics
        .iter()
        .any(|i| i.message == "The parameter 'first' is never used."));
}

#[test]
fn test_user_function_body_cannot_see_top_level_definitions() {
    let text = r#"{
        "parameters": { "topParam": { "type": "string" } },
        "functions": [{
            "namespace": "contoso",
            "members": {
                "bad": {
                    "parameters": [ { "name": "own" } ],
                    "output": {
                        "type": "string",
                        "value": "[concat(parameters('own'), parameters('topParam'))]"
                    }
                }
            }
        }],
        "resources": [ { "name": "[contoso.bad('x')]" } ]
    }"#;
    let template = DeploymentTemplate::parse(text).unwrap();
    let diagnostics = template.diagnostics();
    let undefined: Vec<_> = diagnostics.iter().filter(|i| i.code == 2000).collect();
    assert_eq!(undefined.len(), 1);
    assert_eq!(
        undefined[0].message,
        "Undefined parameter reference: 'topParam'"
    );
    assert!(!diagnostics
        .iter()
        .any(|i| i.message == "The parameter 'own' of function 'contoso.bad' is never used."));
}
