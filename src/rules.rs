//! Rule expressions
//!
//! A sed-flavoured shorthand for editors:
//!
//! ```text
//! s/PAT/REP/        substitute every match of PAT on every line
//! d                 remove every line
//! c/TEXT/           replace every line with TEXT
//! /RE/d             remove lines matching RE
//! /RE/c/TEXT/       replace lines matching RE with TEXT
//! /RE/s/PAT/REP/    substitute PAT only on lines matching RE
//! ```
//!
//! The delimiter of `s` and `c` is whatever character follows the command;
//! the address is always delimited by `/`. A backslash escapes the delimiter.
//! In REP, `\1`..`\9` and `&` refer to capture groups as in sed, and `$` is
//! literal.

use crate::editor::Editor;
use crate::error::RuleError;

/// Parses one rule expression into an editor.
pub fn parse_expression(expr: &str) -> Result<Editor, RuleError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(RuleError::syntax(expr, "empty expression"));
    }

    match trimmed.strip_prefix('/') {
        Some(rest) => {
            let (mut fields, command) = split_delimited(rest, '/', 1)
                .ok_or_else(|| RuleError::syntax(expr, "unterminated address, expected /RE/"))?;
            let address = fields.remove(0);
            if address.is_empty() {
                return Err(RuleError::syntax(expr, "empty address"));
            }
            let inner = parse_command(expr, command)?;
            Ok(Editor::regexp_str(&address, inner)?)
        }
        None => parse_command(expr, trimmed),
    }
}

/// Parses a list of expressions, keeping their order.
pub fn parse_expressions<S: AsRef<str>>(exprs: &[S]) -> Result<Vec<Editor>, RuleError> {
    exprs.iter().map(|e| parse_expression(e.as_ref())).collect()
}

fn parse_command(expr: &str, command: &str) -> Result<Editor, RuleError> {
    let command = command.trim_start();
    let mut chars = command.chars();

    match chars.next() {
        Some('d') => {
            expect_end(expr, chars.as_str())?;
            Ok(Editor::remove())
        }
        Some('c') => {
            let (fields, rest) = delimited_args(expr, chars.as_str(), 1)?;
            expect_end(expr, rest)?;
            Ok(Editor::replace_literal(fields[0].as_str()))
        }
        Some('s') => {
            let (fields, rest) = delimited_args(expr, chars.as_str(), 2)?;
            expect_end(expr, rest)?;
            if fields[0].is_empty() {
                return Err(RuleError::syntax(expr, "empty substitution pattern"));
            }
            let template = convert_sed_replacement(&fields[1]);
            Ok(Editor::replace_regexp_str(&fields[0], template)?)
        }
        Some(other) => Err(RuleError::syntax(expr, format!("unknown command '{other}'"))),
        None => Err(RuleError::syntax(expr, "missing command after address")),
    }
}

fn delimited_args<'a>(
    expr: &str,
    input: &'a str,
    count: usize,
) -> Result<(Vec<String>, &'a str), RuleError> {
    let delimiter = input
        .chars()
        .next()
        .ok_or_else(|| RuleError::syntax(expr, "missing delimiter"))?;
    if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '\\' {
        return Err(RuleError::syntax(expr, format!("invalid delimiter '{delimiter}'")));
    }

    split_delimited(&input[delimiter.len_utf8()..], delimiter, count).ok_or_else(|| {
        RuleError::syntax(expr, format!("expected {count} field(s) closed by '{delimiter}'"))
    })
}

fn expect_end(expr: &str, rest: &str) -> Result<(), RuleError> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(RuleError::syntax(expr, format!("unexpected trailing input \"{rest}\"")))
    }
}

/// Reads `count` fields each terminated by `delimiter`, returning them and
/// whatever follows the last one. `\<delimiter>` stands for the delimiter
/// itself; every other escape is kept verbatim.
fn split_delimited(input: &str, delimiter: char, count: usize) -> Option<(Vec<String>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut field = String::new();
    let mut chars = input.char_indices();

    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, next)) if next == delimiter => field.push(next),
                Some((_, next)) => {
                    field.push('\\');
                    field.push(next);
                }
                None => field.push('\\'),
            }
        } else if c == delimiter {
            fields.push(std::mem::take(&mut field));
            if fields.len() == count {
                return Some((fields, &input[i + c.len_utf8()..]));
            }
        } else {
            field.push(c);
        }
    }

    None
}

/// Converts a sed replacement into a `regex` replacement template.
fn convert_sed_replacement(replacement: &str) -> String {
    let mut result = String::with_capacity(replacement.len());
    let mut chars = replacement.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(d @ '0'..='9') => {
                    result.push_str("${");
                    result.push(d);
                    result.push('}');
                }
                Some('&') => result.push('&'),
                Some('\\') => result.push('\\'),
                Some('$') => result.push_str("$$"),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            '&' => result.push_str("${0}"),
            '$' => result.push_str("$$"),
            _ => result.push(c),
        }
    }

    result
}
