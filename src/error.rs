//! Error types
//!
//! Editors fail only at construction time, when a pattern does not compile.
//! Rule expressions and rules files add their own syntax errors on top.
//! Sink failures are plain `std::io::Error`s and are never wrapped.

use thiserror::Error;

/// A regular expression that failed to compile while building an editor.
#[derive(Debug, Error)]
#[error("invalid pattern \"{pattern}\": {kind}")]
pub struct PatternError {
    pattern: String,
    kind: PatternErrorKind,
    #[source]
    source: regex::Error,
}

/// Coarse classification of a pattern failure, used to offer a hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternErrorKind {
    /// `(`, `[` or `{` opened and never closed
    UnclosedDelimiter(char),
    /// a repetition operator with nothing to repeat, or a bad `{n,m}`
    InvalidQuantifier,
    /// an escape sequence the regex engine does not know
    InvalidEscape,
    /// look-around and back-references are not supported by the engine
    Unsupported,
    /// the compiled program would be too large
    TooBig,
    Syntax,
}

impl std::fmt::Display for PatternErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternErrorKind::UnclosedDelimiter(c) => write!(f, "unclosed '{c}'"),
            PatternErrorKind::InvalidQuantifier => f.write_str("invalid repetition"),
            PatternErrorKind::InvalidEscape => f.write_str("invalid escape sequence"),
            PatternErrorKind::Unsupported => f.write_str("unsupported regex feature"),
            PatternErrorKind::TooBig => f.write_str("compiled pattern is too big"),
            PatternErrorKind::Syntax => f.write_str("syntax error"),
        }
    }
}

impl PatternError {
    pub fn new(pattern: &str, source: regex::Error) -> Self {
        let kind = classify(pattern, &source);
        Self {
            pattern: pattern.to_string(),
            kind,
            source,
        }
    }

    /// The pattern text as it was supplied.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn kind(&self) -> &PatternErrorKind {
        &self.kind
    }

    /// A short suggestion for fixing the pattern, if one applies.
    pub fn suggestion(&self) -> Option<String> {
        match &self.kind {
            PatternErrorKind::UnclosedDelimiter(open) => {
                let close = match open {
                    '(' => ')',
                    '[' => ']',
                    _ => '}',
                };
                Some(format!("add a closing '{close}' to match the opening '{open}'"))
            }
            PatternErrorKind::InvalidQuantifier => Some(
                "a quantifier (*, +, ?, {n}) must follow something to repeat; \
                 escape it with '\\' to match it literally"
                    .to_string(),
            ),
            PatternErrorKind::InvalidEscape => {
                Some("escape only regex metacharacters, e.g. \\. \\* \\( \\[".to_string())
            }
            PatternErrorKind::Unsupported => Some(
                "look-around and back-references are not available; \
                 guard with a second rule instead"
                    .to_string(),
            ),
            PatternErrorKind::TooBig | PatternErrorKind::Syntax => None,
        }
    }
}

fn classify(pattern: &str, err: &regex::Error) -> PatternErrorKind {
    if matches!(err, regex::Error::CompiledTooBig(_)) {
        return PatternErrorKind::TooBig;
    }

    let message = err.to_string().to_lowercase();

    if message.contains("unclosed") {
        for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
            if unbalanced(pattern, open, close) {
                return PatternErrorKind::UnclosedDelimiter(open);
            }
        }
    }
    if message.contains("look-around") || message.contains("backreference") {
        return PatternErrorKind::Unsupported;
    }
    if message.contains("repetition") || message.contains("quantifier") {
        return PatternErrorKind::InvalidQuantifier;
    }
    if message.contains("escape") {
        return PatternErrorKind::InvalidEscape;
    }

    PatternErrorKind::Syntax
}

fn unbalanced(pattern: &str, open: char, close: char) -> bool {
    let mut depth = 0i32;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
        }
    }
    depth > 0
}

/// Failure to turn a textual rule into an editor.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid expression \"{expression}\": {reason}")]
    Syntax { expression: String, reason: String },

    #[error("invalid rule: {0}")]
    Invalid(String),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl RuleError {
    pub(crate) fn syntax(expression: &str, reason: impl Into<String>) -> Self {
        RuleError::Syntax {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// A hint for fixing the rule, when it failed on its pattern.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            RuleError::Pattern(err) => err.suggestion(),
            _ => None,
        }
    }
}

/// Looks through an error chain for a pattern failure and returns its hint.
pub fn suggestion_for(err: &anyhow::Error) -> Option<String> {
    err.chain().find_map(|cause| {
        if let Some(rule) = cause.downcast_ref::<RuleError>() {
            rule.suggestion()
        } else {
            cause
                .downcast_ref::<PatternError>()
                .and_then(PatternError::suggestion)
        }
    })
}
