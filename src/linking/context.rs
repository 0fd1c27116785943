//! State shared by every stage of one linker run.

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::model::{Compilation, IntroductionRegistry, SymbolComparer};
use crate::syntax::SyntaxFactory;

use super::diagnostics::DiagnosticSink;
use super::error::LinkerError;
use super::introductions::IntroductionIndex;
use super::options::LinkerOptions;

pub struct LinkerContext<'a> {
    pub index: IntroductionIndex<'a>,
    pub options: &'a LinkerOptions,
    /// Allocates ids after every node of the input compilation.
    pub factory: SyntaxFactory,
    pub diagnostics: &'a dyn DiagnosticSink,
    cancel: &'a CancellationToken,
}

impl<'a> LinkerContext<'a> {
    pub fn new(
        compilation: &'a Compilation,
        registry: &'a dyn IntroductionRegistry,
        options: &'a LinkerOptions,
        cancel: &'a CancellationToken,
        diagnostics: &'a dyn DiagnosticSink,
    ) -> Self {
        Self {
            index: IntroductionIndex::new(compilation, registry),
            options,
            factory: compilation.syntax_factory(),
            diagnostics,
            cancel,
        }
    }

    pub fn compilation(&self) -> &'a Compilation {
        self.index.compilation()
    }

    pub fn comparer(&self) -> &SymbolComparer {
        self.index.comparer()
    }

    pub fn check_cancelled(&self) -> Result<(), LinkerError> {
        if self.cancel.is_cancelled() {
            Err(LinkerError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Map `items` with `f`, on the rayon pool unless the run is sequential.
    ///
    /// Results keep the order of `items`. Cancellation is checked before
    /// each item.
    pub fn map_items<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>, LinkerError>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> Result<R, LinkerError> + Sync + Send,
    {
        let run = |item: &T| {
            self.check_cancelled()?;
            f(item)
        };

        if self.options.parallel {
            items.par_iter().map(run).collect()
        } else {
            items.iter().map(run).collect()
        }
    }
}
