//! Diagnostics: problems in the woven program reported to the user.
//!
//! Linking never aborts on these; it reports through a [`DiagnosticSink`]
//! and keeps going, so one run surfaces every offending declaration.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::base::{NodeId, SymbolId, TextRange};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A diagnostic attached to a declaration and, when known, a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Diagnostic code (see [`codes`]).
    pub code: &'static str,
    /// The diagnostic message.
    pub message: Arc<str>,
    /// Declaration the problem belongs to.
    pub symbol: Option<SymbolId>,
    /// Offending node.
    pub node: Option<NodeId>,
    /// Source range of the offending node, when it came from source.
    pub span: Option<TextRange>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            symbol: None,
            node: None,
            span: None,
        }
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_span(mut self, span: Option<TextRange>) -> Self {
        self.span = span;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes reported by the linker.
pub mod codes {
    /// A base call must go through `this` but the reference uses another receiver.
    pub const BASE_RECEIVER_NOT_THIS: &str = "LINK0001";
    /// A declaration must be inlined but nothing inlined it.
    pub const MUST_BE_INLINED: &str = "LINK0002";
}

/// LINK0001: invoking `member` through `base` requires a `this` receiver.
pub fn base_receiver_not_this(member: &str, receiver: &str) -> Diagnostic {
    Diagnostic::error(
        codes::BASE_RECEIVER_NOT_THIS,
        format!(
            "cannot invoke '{member}' because the base call target must be 'this', found '{receiver}'"
        ),
    )
}

/// LINK0002: `member` has no code generation path unless it is inlined.
pub fn must_be_inlined(member: &str) -> Diagnostic {
    Diagnostic::error(
        codes::MUST_BE_INLINED,
        format!(
            "'{member}' must be inlined, but it is referenced in a way that prevents inlining"
        ),
    )
}

// ============================================================================
// SINKS
// ============================================================================

/// Receives diagnostics; shared by parallel stages.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Collects diagnostics during linking.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.lock().iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// Take the diagnostics, in reporting order.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(code = diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_keeps_order() {
        let collector = DiagnosticCollector::new();
        collector.report(must_be_inlined("C.C()").with_symbol(SymbolId(1)));
        collector.report(base_receiver_not_this("M", "other"));

        assert!(collector.has_errors());
        let diagnostics = collector.finish();
        assert_eq!(diagnostics[0].code, codes::MUST_BE_INLINED);
        assert_eq!(diagnostics[0].symbol, Some(SymbolId(1)));
        assert_eq!(diagnostics[1].code, codes::BASE_RECEIVER_NOT_THIS);
    }

    #[test]
    fn test_display() {
        let diagnostic = must_be_inlined("C.M");
        assert_eq!(
            diagnostic.to_string(),
            "error[LINK0002]: 'C.M' must be inlined, but it is referenced in a way that prevents inlining"
        );
    }
}
