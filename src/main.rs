use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use editline::cli::{Args, parse_args};
use editline::config::{self, default_rules_path};
use editline::error::suggestion_for;
use editline::{Editor, PrefixTrie, Writer, logger, parse_expressions};

fn main() -> ExitCode {
    let args = parse_args();

    let logging = args.logging();
    let _guard = match logger::init_logging(logging.verbosity, logging.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: {:#}", e);
            None
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_broken_pipe(&e) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(hint) = suggestion_for(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    match args {
        Args::Run {
            expressions,
            rules_files,
            default_rules,
            inputs,
            ..
        } => {
            let mut files = rules_files;
            if default_rules {
                if let Some(path) = default_rules_path().filter(|p| p.exists()) {
                    tracing::debug!(path = %path.display(), "using default rules file");
                    files.push(path);
                }
            }
            let editors = build_editors(&expressions, &files)?;
            edit_stream(editors, &inputs)
        }
        Args::Check {
            expressions,
            rules_files,
            ..
        } => {
            let trie = PrefixTrie::new(build_editors(&expressions, &rules_files)?);
            println!(
                "{} rule(s) OK, {} indexed by prefix, {} checked on every line",
                trie.len(),
                trie.len() - trie.unindexed(),
                trie.unindexed()
            );
            Ok(())
        }
        Args::Init { path, force, .. } => {
            let path = match path {
                Some(path) => path,
                None => default_rules_path()
                    .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
            };
            init_rules(&path, force)
        }
    }
}

/// Rules files first, then expressions, each in the order given
fn build_editors(expressions: &[String], rules_files: &[PathBuf]) -> Result<Vec<Editor>> {
    let mut editors = config::load_editors(rules_files)?;
    editors.extend(parse_expressions(expressions)?);
    Ok(editors)
}

fn edit_stream(editors: Vec<Editor>, inputs: &[PathBuf]) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = Writer::new(BufWriter::new(stdout.lock()), editors);

    if inputs.is_empty() {
        io::copy(&mut io::stdin().lock(), &mut writer).context("Failed to edit stdin")?;
    } else {
        for path in inputs {
            copy_file(path, &mut writer)?;
        }
    }

    writer.flush().context("Failed to write output")?;
    Ok(())
}

fn copy_file(path: &Path, writer: &mut impl Write) -> Result<()> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open input: {}", path.display()))?;
    io::copy(&mut file, writer).with_context(|| format!("Failed to edit {}", path.display()))?;
    Ok(())
}

fn init_rules(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Rules file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    config::save_example_rules(path)?;
    println!("Wrote example rules to {}", path.display());
    Ok(())
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<io::Error>())
        .any(|e| e.kind() == io::ErrorKind::BrokenPipe)
}
