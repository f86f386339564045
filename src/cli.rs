//! CLI: declarations → (C++ binding sources | dispatch explanation)
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::config::Options;
use crate::ir::{CallBody, CallMode};
use crate::model::Module;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate QuickJS binding glue from analyzed interface declarations
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// emit the `.cc` binding source (and header) for every module
    Source(SourceOut),
    /// print the arity dispatch chain of every callback
    Explain(ExplainOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the module (or module array) in each document (e.g. /bindings)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more declaration files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// report every module on stderr
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(clap::Parser, Debug)]
struct SourceOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    options: Options,

    /// JSON file with generation options (replaces the option flags)
    #[arg(long)]
    config: Option<PathBuf>,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct ExplainOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_modules(&self) -> anyhow::Result<Vec<Module>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut modules = Vec::new();
        for source_path in source_paths {
            let loaded = crate::path_de::load_modules(&source_path, self.json_pointer.as_deref())?;
            if self.verbose {
                status("loaded", &format!("{} ({} modules)", source_path.display(), loaded.len()));
            }
            modules.extend(loaded);
        }
        Ok(modules)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Source(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let opts = match &target.config {
                    Some(path) => Options::load(path)
                        .with_context(|| format!("failed to load config {}", path.display()))?,
                    None => target.options.clone(),
                };
                let modules = target.input_settings.load_modules()?;
                check_unique_ids(&modules)?;

                // modules are independent: generate in parallel, emit in input order
                let generated = modules
                    .par_iter()
                    .map(|module| {
                        crate::generate(module, &opts)
                            .with_context(|| format!("invalid declarations in module '{}'", module.id))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()?;

                for out in &generated {
                    match target.out_dir.as_ref() {
                        Some(dir) => {
                            std::fs::create_dir_all(dir)
                                .with_context(|| format!("failed to create {}", dir.display()))?;
                            write_file(&dir.join(format!("{}.cc", out.stem)), &out.source)?;
                            if let Some(header) = &out.header {
                                write_file(&dir.join(format!("{}.h", out.stem)), header)?;
                            }
                            if target.input_settings.verbose {
                                status("generated", &out.stem);
                            }
                        }
                        None => {
                            print!("{}", out.source);
                            if let Some(header) = &out.header {
                                print!("\n{header}");
                            }
                        }
                    }
                }
                Ok(())
            }
            Command::Explain(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let modules = target.input_settings.load_modules()?;
                for module in &modules {
                    let unit = crate::assemble::assemble(module)
                        .with_context(|| format!("invalid declarations in module '{}'", module.id))?;
                    let callbacks = unit
                        .functions
                        .iter()
                        .chain(unit.constructor.iter())
                        .chain(unit.methods.iter());
                    for callback in callbacks {
                        print!("{}", explain(&unit.id, &callback.body));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Print an error chain the way every command reports failures.
pub fn report_error(error: &anyhow::Error) {
    eprintln!("{} {error:#}", "error:".red().bold());
}

/// Human-readable dispatch chain for one call body.
pub fn explain(module_id: &str, body: &CallBody) -> String {
    let mode = match body.mode {
        CallMode::Free => "function",
        CallMode::Method => "method",
        CallMode::Constructor => "constructor",
    };
    let required = body.required_count();
    let mut out = format!(
        "{}::{} ({mode}, {required} required, {} declared)\n",
        module_id, body.name, body.declared_argc
    )
    .bold()
    .to_string();

    if required > 0 {
        out.push_str(&format!("  argc < {required:<3} → TypeError (arity)\n"));
    }
    for (argc, invocation) in crate::eval::dispatch_table(body) {
        let label = if argc > body.declared_argc {
            format!("{argc}+")
        } else {
            argc.to_string()
        };
        let note = if argc > body.declared_argc { "  (surplus ignored)" } else { "" };
        out.push_str(&format!(
            "  argc {label:<5} → {}({})  converts {:?}{note}\n",
            body.native,
            invocation.arguments.join(", "),
            invocation.converted_slots,
        ));
    }
    out
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn status(verb: &str, subject: &str) {
    eprintln!("{:>10} {subject}", verb.green().bold());
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn check_unique_ids(modules: &[Module]) -> anyhow::Result<()> {
    let mut seen = BTreeSet::new();
    for module in modules {
        if !seen.insert(crate::names::file_stem(&module.id)) {
            bail!("two modules would both be written as '{}'", crate::names::file_stem(&module.id));
        }
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
