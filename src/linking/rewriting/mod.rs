//! Linking step: materialize the linked program from the analysis results.
//!
//! - [`substituting`] - rewrite one body in one inlining context
//! - [`members`] - decide which declarations every member turns into
//! - [`cleanup`] - remove the scaffolding inlining leaves behind

pub mod cleanup;
pub mod members;
pub mod substituting;

pub use cleanup::cleanup_body;
pub use members::{LinkedType, MemberLinker};
pub use substituting::SubstitutingRewriter;

use crate::syntax::TypeDecl;

use super::analysis::LinkerAnalysisRegistry;
use super::context::LinkerContext;
use super::error::LinkerError;

pub struct LinkerLinkingStep;

impl LinkerLinkingStep {
    /// Link every type of the compilation, in declaration order.
    ///
    /// Types are linked in parallel; diagnostics are reported afterwards in
    /// type order so that the output does not depend on scheduling.
    pub fn run(
        ctx: &LinkerContext<'_>,
        registry: &LinkerAnalysisRegistry,
    ) -> Result<Vec<TypeDecl>, LinkerError> {
        let _span = tracing::debug_span!("linker_linking").entered();
        let linker = MemberLinker::new(ctx, registry);
        let types = ctx.compilation().types();

        let linked = ctx.map_items(types, |decl| linker.link_type(decl))?;
        ctx.check_cancelled()?;

        let mut output = Vec::with_capacity(linked.len());
        for ty in linked {
            for diagnostic in ty.diagnostics {
                ctx.diagnostics.report(diagnostic);
            }
            output.push(ty.decl);
        }

        tracing::debug!(
            types = output.len(),
            members = output.iter().map(|ty| ty.members.len()).sum::<usize>(),
            "linking finished"
        );
        Ok(output)
    }
}
