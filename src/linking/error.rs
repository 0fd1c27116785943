//! Error types for linking.
//!
//! These are internal faults: the intermediate compilation or the registry
//! violates an assumption of the linker. Problems in user code are reported
//! as diagnostics instead and never abort the run.

use thiserror::Error;

use crate::base::{NodeId, SymbolId};

#[derive(Debug, Error)]
pub enum LinkerError {
    /// A symbol of a kind the current stage cannot handle.
    #[error("unexpected {kind} symbol {symbol} during {stage}")]
    UnexpectedSymbol {
        symbol: SymbolId,
        kind: &'static str,
        stage: &'static str,
    },

    /// A node that does not have the shape the current stage relies on.
    #[error("unexpected syntax at node {node}: expected {expected}, found {found}")]
    UnexpectedSyntax {
        node: NodeId,
        expected: &'static str,
        found: String,
    },

    /// Inlineable references form a cycle.
    #[error("inlining cycle: {0}")]
    InliningCycle(String),

    /// A later stage asked for a result an earlier stage did not produce.
    #[error("missing {what} for {subject}")]
    MissingAnalysis { what: &'static str, subject: String },

    #[error("linking was cancelled")]
    Cancelled,
}

impl LinkerError {
    pub fn unexpected_symbol(symbol: SymbolId, kind: &'static str, stage: &'static str) -> Self {
        Self::UnexpectedSymbol {
            symbol,
            kind,
            stage,
        }
    }

    pub fn unexpected_syntax(
        node: NodeId,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedSyntax {
            node,
            expected,
            found: found.into(),
        }
    }

    pub fn missing(what: &'static str, subject: impl ToString) -> Self {
        Self::MissingAnalysis {
            what,
            subject: subject.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = LinkerError::unexpected_symbol(SymbolId(4), "type", "reachability");
        assert_eq!(
            error.to_string(),
            "unexpected type symbol sym4 during reachability"
        );
        let error = LinkerError::unexpected_syntax(NodeId(7), "statement", "lambda");
        assert_eq!(
            error.to_string(),
            "unexpected syntax at node #7: expected statement, found lambda"
        );
        assert_eq!(LinkerError::Cancelled.to_string(), "linking was cancelled");
    }
}
