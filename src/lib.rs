//! editline: streaming line editor
//!
//! Wrap any `io::Write` in a [`Writer`] and every line written through it is
//! run through an ordered list of [`Editor`]s before it reaches the sink.
//! Editors can rewrite a line, drop it, or leave it alone; guards restrict
//! them to lines with a given literal prefix or matching a regex.
//!
//! ```
//! use std::io::Write;
//! use editline::{Editor, Writer};
//!
//! let editors = [
//!     Editor::regexp_str("^DEBUG ", Editor::remove()).unwrap(),
//!     Editor::replace_regexp_str(r"token=\S+", "token=***").unwrap(),
//! ];
//! let mut writer = Writer::new(Vec::new(), editors);
//! writer.write_all(b"DEBUG starting\r\nlogin token=abc\r\ndone").unwrap();
//! writer.flush().unwrap();
//! assert_eq!(writer.into_inner(), b"login token=***\r\ndone");
//! ```
//!
//! The binary at src/main.rs builds editors from rule expressions and TOML
//! rules files and edits stdin to stdout.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod logger;
pub mod prefix;
pub mod rules;
pub mod trie;
pub mod writer;

// Re-export commonly used types for convenience
pub use editor::{Action, Editor, edit_sequence};
pub use error::{PatternError, RuleError};
pub use prefix::regex_prefix;
pub use rules::{parse_expression, parse_expressions};
pub use trie::PrefixTrie;
pub use writer::Writer;
