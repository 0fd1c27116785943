//! Linker options

use crate::syntax::PrintOptions;

/// Options controlling a linker run.
#[derive(Debug, Clone)]
pub struct LinkerOptions {
    /// Run per-method and per-type stages on the rayon pool
    pub parallel: bool,
    /// Run the cleanup pass over rewritten bodies
    pub cleanup: bool,
    /// Suffix of the member holding the original source body
    pub source_suffix: String,
    /// Suffix of the member holding the empty base implementation
    pub empty_suffix: String,
    /// Prefix of labels allocated for returns out of inlined bodies
    pub return_label_prefix: String,
    /// Layout of the printed output
    pub print: PrintOptions,
}

impl Default for LinkerOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            cleanup: true,
            source_suffix: "_Source".to_string(),
            empty_suffix: "_Empty".to_string(),
            return_label_prefix: "__aspect_return".to_string(),
            print: PrintOptions::default(),
        }
    }
}

impl LinkerOptions {
    /// Options for a sequential run, useful when debugging.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}
