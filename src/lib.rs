//! Generates QuickJS binding glue from parsed interface declarations.
//!
//! Pipeline: [`model::Module`] → [`assemble::assemble`] (validation, call-body
//! and accessor synthesis, table folding) → [`ir::Unit`] →
//! [`codegen::Codegen`] → C++ text.
pub mod accessor;
pub mod assemble;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod eval;
pub mod ir;
pub mod lower;
pub mod model;
pub mod names;
pub mod path_de;
pub mod types;

use std::path::Path;

use crate::codegen::Codegen;
use crate::config::Options;
use crate::error::DeclarationError;
use crate::model::Module;

/// The emitted file pair for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub stem: String,
    pub source: String,
    pub header: Option<String>,
}

/// Generate one module. Pure: the same module and options always produce
/// the same text, and modules never affect each other.
pub fn generate(module: &Module, opts: &Options) -> Result<Generated, DeclarationError> {
    let unit = assemble::assemble(module)?;

    let mut source = Codegen::new(opts);
    source.emit_source(&unit);

    let header = (!opts.no_header).then(|| {
        let mut header = Codegen::new(opts);
        header.emit_header(&unit);
        header.into_string()
    });

    Ok(Generated {
        stem: names::file_stem(&module.id),
        source: source.into_string(),
        header,
    })
}

/// Load an analyzer document and generate every module in it.
pub fn generate_file(
    path: &Path,
    pointer: Option<&str>,
    opts: &Options,
) -> error::Result<Vec<Generated>> {
    let modules = path_de::load_modules(path, pointer)?;
    let mut generated = Vec::with_capacity(modules.len());
    for module in &modules {
        generated.push(generate(module, opts)?);
    }
    Ok(generated)
}
