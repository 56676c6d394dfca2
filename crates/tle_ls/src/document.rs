//! The per-document semantic model.
//!
//! A [`DeploymentTemplate`] is built once from the full document text and is
//! immutable afterwards; an edit means building a new one. Every string value
//! in the JSON tree is parsed up front against the scope in effect at its
//! position, so queries never re-derive scope information.

use tle_checker::{unused_definition_issues, UsageAccounting};
use tle_core::{Span, TextPos};
use tle_diagnostics::{Issue, IssueCollection};
use tle_functions::{CatalogError, FunctionCatalog};
use tle_json::Value;
use tle_parser::ParseResult;
use tle_scopes::ScopeBundle;

use crate::context::PositionContext;

/// One parsed string value: where it sits in the document, and its parse
/// outcome with string-relative spans.
#[derive(Debug)]
pub(crate) struct ParsedString {
    /// The document span of the quoted string, including quotes.
    pub span: Span,
    pub result: ParseResult,
}

impl ParsedString {
    /// Lift a string-relative span into document coordinates.
    pub fn to_document(&self, span: Span) -> Span {
        span.translate(self.span.start as i64)
    }
}

/// The immutable semantic model of one document snapshot.
pub struct DeploymentTemplate {
    text: String,
    root: Option<Value>,
    json_issues: Vec<Issue>,
    scopes: ScopeBundle,
    catalog: FunctionCatalog,
    strings: Vec<ParsedString>,
}

impl DeploymentTemplate {
    /// Build the model from the full document text: parse the JSON tree,
    /// build the scope tree, then parse every string value against the scope
    /// at its position.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let catalog = FunctionCatalog::builtin()?;
        let document = tle_json::parse(text);
        let scopes = tle_scopes::build(document.value.as_ref());

        let mut strings = Vec::new();
        if let Some(root) = &document.value {
            root.walk(&mut |value| {
                if let Value::String(string) = value {
                    let start = string.span.start as usize;
                    let end = start + string.span.length as usize;
                    let quoted = &text[start..end];
                    let scope = scopes.scope_at(string.span.start);
                    strings.push(ParsedString {
                        span: string.span,
                        result: tle_parser::parse(quoted, scope),
                    });
                }
            });
        }

        Ok(Self {
            text: text.to_string(),
            root: document.value,
            json_issues: document.issues,
            scopes,
            catalog,
            strings,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    pub fn scopes(&self) -> &ScopeBundle {
        &self.scopes
    }

    pub fn catalog(&self) -> &FunctionCatalog {
        &self.catalog
    }

    pub(crate) fn strings(&self) -> &[ParsedString] {
        &self.strings
    }

    /// Every diagnostic for the whole document, in document coordinates,
    /// sorted by position: JSON issues, expression parse issues, semantic
    /// issues, and unused-definition warnings.
    pub fn diagnostics(&self) -> Vec<Issue> {
        let mut collection = IssueCollection::new();
        collection.extend_from_slice(&self.json_issues);

        let mut usage = UsageAccounting::new();
        for string in &self.strings {
            for issue in &string.result.issues {
                collection.add(issue.translate(string.span.start as i64));
            }
            for issue in tle_checker::check(&string.result, &self.scopes.arena, &self.catalog) {
                collection.add(issue.translate(string.span.start as i64));
            }
            usage.record(&string.result, &self.scopes.arena);
        }

        // Unused warnings anchor on definition names in the JSON tree, which
        // are already document coordinates.
        for issue in unused_definition_issues(&self.scopes.arena, &usage) {
            collection.add(issue);
        }

        collection.sort();
        collection.into_issues()
    }

    /// The semantic context at a document offset, or `None` when the offset
    /// is not inside any string value or definition name.
    pub fn context_at(&self, offset: TextPos) -> Option<PositionContext<'_>> {
        PositionContext::at(self, offset)
    }

    /// The smallest parsed string whose span contains the offset. The end
    /// position counts as inside, so a caret on the closing quote still hits.
    pub(crate) fn string_at(&self, offset: TextPos) -> Option<usize> {
        self.strings
            .iter()
            .enumerate()
            .filter(|(_, s)| s.span.contains_inclusive(offset))
            .min_by_key(|(_, s)| s.span.length)
            .map(|(index, _)| index)
    }
}
