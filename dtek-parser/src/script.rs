//! Inline-script assignment locator.
//!
//! Finds statements of the form `Object.property = <literal>` inside inline
//! script blocks and evaluates the literal right-hand side. Scripts are
//! parsed with a full JavaScript grammar because the assignments are mixed
//! with unrelated code; nothing is executed.

use oxc_allocator::Allocator;
use oxc_ast::ast::{AssignmentExpression, AssignmentTarget, Expression};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use serde_json::Value;
use tracing::{debug, trace};

use dtek_core::{DtekError, ParseKind};

use crate::literal;

// ============================================================================
// Assignment Target
// ============================================================================

/// A global property assignment to look for, such as `DisconSchedule.fact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    /// Global object name.
    pub object: &'a str,
    /// Property name.
    pub property: &'a str,
}

impl<'a> Assignment<'a> {
    /// Creates a new assignment target.
    pub const fn new(object: &'a str, property: &'a str) -> Self {
        Self { object, property }
    }

    /// The dotted source text, used to pre-filter script blocks.
    pub fn needle(&self) -> String {
        format!("{}.{}", self.object, self.property)
    }

    fn matches(&self, target: &AssignmentTarget<'_>) -> bool {
        let AssignmentTarget::StaticMemberExpression(member) = target else {
            return false;
        };
        if member.property.name.as_str() != self.property {
            return false;
        }
        // Accept both `Obj.prop` and `window.Obj.prop`.
        match &member.object {
            Expression::Identifier(id) => id.name.as_str() == self.object,
            Expression::StaticMemberExpression(outer) => {
                outer.property.name.as_str() == self.object
            }
            _ => false,
        }
    }
}

// ============================================================================
// Locator
// ============================================================================

/// Walks a program looking for the first matching assignment.
struct Finder<'t> {
    target: Assignment<'t>,
    found: Option<Result<Value, DtekError>>,
}

impl<'a> Visit<'a> for Finder<'_> {
    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        if self.found.is_some() {
            return;
        }
        if self.target.matches(&it.left) {
            self.found = Some(literal::evaluate(&it.right));
            return;
        }
        walk::walk_assignment_expression(self, it);
    }
}

/// Searches one script block.
///
/// Returns `Ok(None)` when the block has no matching assignment.
pub fn find_in_script(source: &str, target: Assignment<'_>) -> Result<Option<Value>, DtekError> {
    let allocator = Allocator::default();
    let options = ParseOptions {
        preserve_parens: false,
        ..ParseOptions::default()
    };
    let ret = Parser::new(&allocator, source, SourceType::cjs())
        .with_options(options)
        .parse();

    let syntax_error = || {
        DtekError::parse(
            ParseKind::Script,
            format!("parseable script containing {}", target.needle()),
            ret.errors.first().map(ToString::to_string),
        )
    };
    if ret.panicked {
        return Err(syntax_error());
    }

    let mut finder = Finder {
        target,
        found: None,
    };
    finder.visit_program(&ret.program);

    if finder.found.is_none() && !ret.errors.is_empty() {
        return Err(syntax_error());
    }
    if !ret.errors.is_empty() {
        trace!(errors = ret.errors.len(), "Script parsed with recoverable errors");
    }
    finder.found.transpose()
}

/// Searches a list of script blocks for an assignment.
///
/// Blocks that do not mention the dotted name are skipped without parsing.
/// A block that mentions it but cannot be parsed is remembered; if no other
/// block yields the assignment, that failure is returned.
pub fn find_assignment<S: AsRef<str>>(
    scripts: &[S],
    target: Assignment<'_>,
) -> Result<Option<Value>, DtekError> {
    let needle = target.needle();
    let mut last_error = None;

    for (index, script) in scripts.iter().enumerate() {
        let source = script.as_ref();
        if !source.contains(&needle) {
            continue;
        }
        debug!(index, bytes = source.len(), target = %needle, "Parsing candidate script");
        match find_in_script(source, target) {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(e @ DtekError::Parse { kind: ParseKind::Script, .. }) => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(None),
    }
}

// ============================================================================
// Tests
// ============================================================================
