//! Structural symbol comparison.
//!
//! Symbols handed out by the model are not canonical: a constructed generic
//! member and its definition are different handles for the same declaration.
//! Every set or map the linker keys by symbol goes through a
//! [`SymbolComparer`] created for one compilation, so equality never mixes
//! symbols of different compilations and never depends on which handle the
//! binder happened to return.

use std::sync::Arc;

use crate::base::{CompilationId, SymbolId};

use super::Compilation;

#[derive(Clone, Debug)]
pub struct SymbolComparer {
    compilation: CompilationId,
    canonical: Arc<[SymbolId]>,
}

impl SymbolComparer {
    pub fn for_compilation(compilation: &Compilation) -> Self {
        let canonical = compilation
            .symbols()
            .iter()
            .map(|symbol| {
                let mut current = symbol;
                // Definitions of definitions are followed to the root; the
                // step bound keeps a malformed cycle from spinning.
                for _ in 0..compilation.symbols().len() {
                    match current
                        .original_definition
                        .and_then(|original| compilation.get_symbol(original))
                    {
                        Some(next) if next.id != current.id => current = next,
                        _ => break,
                    }
                }
                current.id
            })
            .collect::<Vec<_>>();

        Self {
            compilation: compilation.id(),
            canonical: canonical.into(),
        }
    }

    pub fn compilation(&self) -> CompilationId {
        self.compilation
    }

    /// The declaration a handle stands for.
    pub fn canonical(&self, symbol: SymbolId) -> SymbolId {
        self.canonical.get(symbol.index()).copied().unwrap_or(symbol)
    }

    pub fn equals(&self, a: SymbolId, b: SymbolId) -> bool {
        self.canonical(a) == self.canonical(b)
    }
}
