//! Golden-file runner: regenerates every `fixtures/*.json` and compares the
//! output with the checked-in `fixtures/<stem>.cc` / `.h`.
//!
//! usage: dev-test-runner [FIXTURE_DIR] [--bless]
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use idl_bindgen::config::Options;
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

fn normalize(text: &str) -> String {
    TRAILING_WS.replace_all(&text.replace("\r\n", "\n"), "").into_owned()
}

/// regenerate every fixture and diff it against its golden output
#[derive(Parser, Debug)]
struct Args {
    /// directory holding `*.json` fixtures and their goldens
    #[arg(default_value = "fixtures")]
    dir: PathBuf,

    /// overwrite missing or differing goldens with the current output
    #[arg(long)]
    bless: bool,
}

enum Outcome {
    Same,
    Blessed,
    Missing,
    Differs,
}

fn check(path: &Path, actual: &str, bless: bool) -> Outcome {
    match std::fs::read_to_string(path) {
        Ok(expected) if normalize(&expected) == normalize(actual) => Outcome::Same,
        _ if bless => match std::fs::write(path, actual) {
            Ok(()) => Outcome::Blessed,
            Err(error) => {
                eprintln!("❌ cannot write {}: {error}", path.display());
                Outcome::Differs
            }
        },
        Ok(_) => Outcome::Differs,
        Err(_) => Outcome::Missing,
    }
}

fn main() {
    let Args { dir, bless } = Args::parse();

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(error) => {
            eprintln!("❌ cannot read {}: {error}", dir.display());
            std::process::exit(2);
        }
    };
    let mut fixtures: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    fixtures.sort();

    let opts = Options::default();
    let mut failures = 0usize;
    for fixture in &fixtures {
        let generated = match idl_bindgen::generate_file(fixture, None, &opts) {
            Ok(generated) => generated,
            Err(error) => {
                eprintln!("❌ {}: {error}", fixture.display());
                failures += 1;
                continue;
            }
        };
        for generated in generated {
            let mut outputs = vec![(dir.join(format!("{}.cc", generated.stem)), generated.source)];
            if let Some(header) = generated.header {
                outputs.push((dir.join(format!("{}.h", generated.stem)), header));
            }
            for (path, text) in outputs {
                let label = path.display().to_string();
                match check(&path, &text, bless) {
                    Outcome::Same => eprintln!("✅ {label}"),
                    Outcome::Blessed => eprintln!("{} {label}", "blessed".yellow()),
                    Outcome::Missing => {
                        eprintln!("❌ {label}: no golden file (run with --bless)");
                        failures += 1;
                    }
                    Outcome::Differs => {
                        eprintln!("❌ {label}: output differs");
                        failures += 1;
                    }
                }
            }
        }
    }

    if failures > 0 {
        eprintln!("{}", format!("{failures} failure(s)").red().bold());
        std::process::exit(1);
    }
}
