//! Aspect linker: composes the overrides every aspect contributed into one
//! program.
//!
//! ## Pipeline
//!
//! ```text
//! LinkerInput (compilation + introduction registry)
//!   ↓
//! analysis   → synthetic bodies, references, reachability, inlining plan, substitutions
//!   ↓
//! rewriting  → Final bodies, _Source / _Empty stubs, kept overrides, cleanup
//!   ↓
//! LinkerOutput (linked types + diagnostics)
//! ```
//!
//! Both steps parallelize per method or per type on the rayon pool. Output
//! and diagnostics are in declaration order whatever the scheduling.

pub mod analysis;
mod context;
pub mod diagnostics;
mod error;
pub mod inliners;
mod introductions;
pub mod naming;
mod options;
pub mod rewriting;
pub mod semantic;
mod topo;

pub use analysis::{LinkerAnalysisRegistry, LinkerAnalysisStep};
pub use context::LinkerContext;
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink, Severity};
pub use error::LinkerError;
pub use introductions::IntroductionIndex;
pub use options::LinkerOptions;
pub use rewriting::LinkerLinkingStep;
pub use semantic::{
    AspectReferenceTarget, InliningContextIdentifier, MethodSemantic, SemanticSet, SymbolSemantic,
    SymbolSemanticKind,
};
pub use topo::{Cycle, topological_sort};

use tokio_util::sync::CancellationToken;

use crate::model::{Compilation, IntroductionRegistry};
use crate::syntax::{TypeDecl, print_type};

/// What the injection phase hands to the linker.
pub struct LinkerInput<'a> {
    pub compilation: &'a Compilation,
    pub registry: &'a dyn IntroductionRegistry,
    /// Semantics the host needs kept even when nothing references them.
    pub additional_non_discardable: Vec<SymbolSemantic>,
}

impl<'a> LinkerInput<'a> {
    pub fn new(compilation: &'a Compilation, registry: &'a dyn IntroductionRegistry) -> Self {
        Self {
            compilation,
            registry,
            additional_non_discardable: Vec::new(),
        }
    }

    /// Keep `semantic` alive.
    ///
    /// Linking panics when the semantic names a version that cannot exist,
    /// such as the `Final` version of a member nothing overrides.
    pub fn with_non_discardable(mut self, semantic: SymbolSemantic) -> Self {
        self.additional_non_discardable.push(semantic);
        self
    }
}

#[derive(Debug)]
pub struct LinkerOutput {
    /// Linked types, in the declaration order of the input.
    pub types: Vec<TypeDecl>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LinkerOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|ty| ty.name == name)
    }

    /// Text of every linked type.
    pub fn print(&self, options: &LinkerOptions) -> String {
        self.types
            .iter()
            .map(|ty| print_type(ty, &options.print))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Default)]
pub struct AspectLinker {
    options: LinkerOptions,
}

impl AspectLinker {
    pub fn new(options: LinkerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LinkerOptions {
        &self.options
    }

    /// Link `input`. Diagnostics never abort the run; internal faults and
    /// cancellation do, and then no output is produced.
    pub fn link(
        &self,
        input: &LinkerInput<'_>,
        cancel: &CancellationToken,
    ) -> Result<LinkerOutput, LinkerError> {
        let _span = tracing::info_span!("link", compilation = input.compilation.id().0).entered();
        let collector = DiagnosticCollector::new();
        let types = {
            let ctx = LinkerContext::new(
                input.compilation,
                input.registry,
                &self.options,
                cancel,
                &collector,
            );
            ctx.check_cancelled()?;
            let registry = LinkerAnalysisStep::run(&ctx, &input.additional_non_discardable)?;
            ctx.check_cancelled()?;
            LinkerLinkingStep::run(&ctx, &registry)?
        };

        let diagnostics = collector.finish();
        tracing::info!(
            types = types.len(),
            diagnostics = diagnostics.len(),
            "linking complete"
        );
        Ok(LinkerOutput { types, diagnostics })
    }
}
