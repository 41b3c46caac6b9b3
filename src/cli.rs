use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "editline")]
#[command(version)]
#[command(about = "Rewrite, redact or drop lines as they stream through a pipe")]
#[command(long_about = "editline reads a byte stream, splits it into lines and runs every line
through an ordered list of rules before writing it out. Lines are never
buffered beyond the one currently being read, so it works on endless streams
such as `tail -f` or a service's log output.

Line endings are kept as they are: CRLF lines stay CRLF, and a final line
without a newline is written without one.

RULE EXPRESSIONS:
  s/PAT/REP/        Substitute every match of PAT (sed-style \\1 and &)
  d                 Remove every line
  c/TEXT/           Replace every line with TEXT
  /RE/d             Remove lines matching RE
  /RE/c/TEXT/       Replace lines matching RE with TEXT
  /RE/s/PAT/REP/    Substitute only on lines matching RE

Rules from files (-f) run first, then -e expressions, each in the order given.
Without -f, ~/.editline/rules.toml is used if it exists.

EXAMPLES:
  app | editline -e '/^DEBUG /d'                   Drop debug lines
  app | editline -e 's/(token=)\\S+/\\1***/'        Redact tokens
  editline -f redact.toml server.log              Edit a file to stdout
  editline check -f redact.toml                   Validate a rules file
  editline init                                   Write an example rules file")]
struct Cli {
    /// Rule expression (repeatable)
    #[arg(short = 'e', long = "expression", value_name = "EXPR")]
    expressions: Vec<String>,

    /// Rules file (repeatable)
    #[arg(short = 'f', long = "rules", value_name = "FILE")]
    rules_files: Vec<PathBuf>,

    /// Do not load ~/.editline/rules.toml
    #[arg(long = "no-default-rules")]
    no_default_rules: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to FILE instead of stderr
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Input files, read in order (default: stdin)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile rules and report problems without reading any input
    #[command(long_about = "Compile rules and report problems without reading any input.

EXAMPLES:
  editline check -f redact.toml
  editline check -e 's/a/b/' -e '/x/d'")]
    Check {
        /// Rule expression (repeatable)
        #[arg(short = 'e', long = "expression", value_name = "EXPR")]
        expressions: Vec<String>,

        /// Rules file (repeatable)
        #[arg(short = 'f', long = "rules", value_name = "FILE")]
        rules_files: Vec<PathBuf>,
    },

    /// Write a commented example rules file
    #[command(long_about = "Write a commented example rules file.

Defaults to ~/.editline/rules.toml. An existing file is left alone unless
--force is given.")]
    Init {
        /// Where to write the file
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Args {
    Run {
        expressions: Vec<String>,
        rules_files: Vec<PathBuf>,
        default_rules: bool,
        inputs: Vec<PathBuf>,
        logging: Logging,
    },
    Check {
        expressions: Vec<String>,
        rules_files: Vec<PathBuf>,
        logging: Logging,
    },
    Init {
        path: Option<PathBuf>,
        force: bool,
        logging: Logging,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logging {
    pub verbosity: u8,
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn logging(&self) -> &Logging {
        match self {
            Args::Run { logging, .. } | Args::Check { logging, .. } | Args::Init { logging, .. } => {
                logging
            }
        }
    }
}

pub fn parse_args() -> Args {
    into_args(Cli::parse())
}

pub fn parse_args_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(into_args(Cli::try_parse_from(args)?))
}

fn into_args(cli: Cli) -> Args {
    let logging = Logging {
        verbosity: cli.verbose,
        log_file: cli.log_file,
    };

    match cli.command {
        Some(Commands::Check {
            expressions,
            rules_files,
        }) => Args::Check {
            expressions,
            rules_files,
            logging,
        },
        Some(Commands::Init { path, force }) => Args::Init {
            path,
            force,
            logging,
        },
        None => Args::Run {
            // An explicit rules file replaces the default one
            default_rules: !cli.no_default_rules && cli.rules_files.is_empty(),
            expressions: cli.expressions,
            rules_files: cli.rules_files,
            inputs: cli.inputs,
            logging,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args() {
        let args = parse_args_from(["editline", "-e", "d", "-e", "s/a/b/", "in.log"]).unwrap();
        assert_eq!(
            args,
            Args::Run {
                expressions: vec!["d".to_string(), "s/a/b/".to_string()],
                rules_files: vec![],
                default_rules: true,
                inputs: vec![PathBuf::from("in.log")],
                logging: Logging {
                    verbosity: 0,
                    log_file: None,
                },
            }
        );
    }

    #[test]
    fn test_rules_file_disables_default_rules() {
        let args = parse_args_from(["editline", "-f", "r.toml"]).unwrap();
        assert!(matches!(args, Args::Run { default_rules: false, .. }));

        let args = parse_args_from(["editline", "--no-default-rules"]).unwrap();
        assert!(matches!(args, Args::Run { default_rules: false, .. }));
    }

    #[test]
    fn test_verbosity_and_log_file() {
        let args = parse_args_from(["editline", "-vv", "--log-file", "x.log"]).unwrap();
        assert_eq!(args.logging().verbosity, 2);
        assert_eq!(args.logging().log_file, Some(PathBuf::from("x.log")));
    }

    #[test]
    fn test_check_subcommand() {
        let args = parse_args_from(["editline", "check", "-f", "a.toml", "-e", "d"]).unwrap();
        assert_eq!(
            args,
            Args::Check {
                expressions: vec!["d".to_string()],
                rules_files: vec![PathBuf::from("a.toml")],
                logging: Logging {
                    verbosity: 0,
                    log_file: None,
                },
            }
        );
    }

    #[test]
    fn test_init_subcommand() {
        let args = parse_args_from(["editline", "init", "--force"]).unwrap();
        assert!(matches!(args, Args::Init { path: None, force: true, .. }));
    }
}
