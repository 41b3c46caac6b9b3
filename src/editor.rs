//! Line editors
//!
//! An [`Editor`] is an immutable rewrite rule for a single line. Given a line
//! it produces the line to emit and an [`Action`]: keep it (possibly changed)
//! or drop it. Editors are built from a small closed set of variants:
//!
//! - terminal: [`Editor::remove`], [`Editor::replace_literal`],
//!   [`Editor::replace_regexp`]
//! - guards: [`Editor::prefix`], [`Editor::regexp`]
//! - composite: [`Editor::sequence`]
//!
//! Lines are raw bytes. Nothing here requires UTF-8.

use std::borrow::Cow;

use regex::bytes::Regex;

use crate::error::PatternError;
use crate::prefix::regex_prefix;

/// What to do with an edited line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit the returned line in place of the input.
    Replace,
    /// Drop the line from the output.
    Remove,
}

/// A line rewrite rule.
#[derive(Debug, Clone)]
pub struct Editor {
    kind: EditorKind,
}

#[derive(Debug, Clone)]
enum EditorKind {
    Remove,
    ReplaceLiteral(Vec<u8>),
    ReplaceRegexp {
        regex: Regex,
        template: Vec<u8>,
    },
    Prefix {
        prefix: Vec<u8>,
        inner: Box<Editor>,
    },
    Regexp {
        regex: Regex,
        prefix: Vec<u8>,
        inner: Box<Editor>,
    },
    Sequence(Vec<Editor>),
}

impl Editor {
    fn new(kind: EditorKind) -> Self {
        Self { kind }
    }

    /// Drops every line it sees.
    pub fn remove() -> Self {
        Self::new(EditorKind::Remove)
    }

    /// Replaces every line it sees with `text`.
    pub fn replace_literal(text: impl Into<Vec<u8>>) -> Self {
        Self::new(EditorKind::ReplaceLiteral(text.into()))
    }

    /// Replaces every match of `regex` using `template`.
    ///
    /// The template may refer to capture groups as `$1` or `${name}`; see
    /// [`regex::bytes::Regex::replace_all`].
    pub fn replace_regexp(regex: Regex, template: impl Into<Vec<u8>>) -> Self {
        Self::new(EditorKind::ReplaceRegexp {
            regex,
            template: template.into(),
        })
    }

    /// Like [`Editor::replace_regexp`], compiling `pattern` first.
    pub fn replace_regexp_str(
        pattern: &str,
        template: impl Into<Vec<u8>>,
    ) -> Result<Self, PatternError> {
        Ok(Self::replace_regexp(compile(pattern)?, template))
    }

    /// Runs `inner` only on lines starting with `prefix`.
    pub fn prefix(prefix: impl Into<Vec<u8>>, inner: Editor) -> Self {
        Self::new(EditorKind::Prefix {
            prefix: prefix.into(),
            inner: Box::new(inner),
        })
    }

    /// Runs `inner` only on lines where `regex` matches somewhere.
    ///
    /// A precompiled regex may carry builder options (case folding, CRLF
    /// anchors, ...) that its pattern text does not show, so no literal
    /// prefix is derived for it and it is checked against every line. Use
    /// [`Editor::regexp_str`] to get prefix indexing.
    pub fn regexp(regex: Regex, inner: Editor) -> Self {
        Self::new(EditorKind::Regexp {
            regex,
            prefix: Vec::new(),
            inner: Box::new(inner),
        })
    }

    /// Like [`Editor::regexp`], compiling `pattern` first.
    ///
    /// Patterns of the form `^literal...` are indexed by `literal`.
    pub fn regexp_str(pattern: &str, inner: Editor) -> Result<Self, PatternError> {
        let regex = compile(pattern)?;
        Ok(Self::new(EditorKind::Regexp {
            regex,
            prefix: regex_prefix(pattern),
            inner: Box::new(inner),
        }))
    }

    /// Runs `editors` one after another.
    ///
    /// Each editor sees the line produced by the previous one. The first
    /// editor to remove the line ends the sequence.
    pub fn sequence(editors: impl IntoIterator<Item = Editor>) -> Self {
        Self::new(EditorKind::Sequence(editors.into_iter().collect()))
    }

    /// Edits a single line, without its line ending.
    pub fn edit<'a>(&'a self, line: &'a [u8]) -> (Cow<'a, [u8]>, Action) {
        match &self.kind {
            EditorKind::Remove => (Cow::Borrowed(line), Action::Remove),
            EditorKind::ReplaceLiteral(text) => (Cow::Borrowed(text.as_slice()), Action::Replace),
            EditorKind::ReplaceRegexp { regex, template } => {
                (regex.replace_all(line, template.as_slice()), Action::Replace)
            }
            EditorKind::Prefix { prefix, inner } => {
                if line.starts_with(prefix) {
                    inner.edit(line)
                } else {
                    (Cow::Borrowed(line), Action::Replace)
                }
            }
            EditorKind::Regexp { regex, inner, .. } => {
                if regex.is_match(line) {
                    inner.edit(line)
                } else {
                    (Cow::Borrowed(line), Action::Replace)
                }
            }
            EditorKind::Sequence(editors) => edit_sequence(editors, line),
        }
    }

    /// The literal this editor requires at the start of a line to do
    /// anything at all.
    ///
    /// On any line not starting with it the editor passes the line through
    /// unchanged. `None` means the editor must see every line.
    pub fn required_prefix(&self) -> Option<&[u8]> {
        let prefix = match &self.kind {
            EditorKind::Prefix { prefix, .. } | EditorKind::Regexp { prefix, .. } => prefix,
            _ => return None,
        };
        if prefix.is_empty() { None } else { Some(prefix.as_slice()) }
    }
}

/// Folds `line` through `editors` in order, stopping at the first removal.
pub fn edit_sequence<'a, I>(editors: I, line: &'a [u8]) -> (Cow<'a, [u8]>, Action)
where
    I: IntoIterator<Item = &'a Editor>,
{
    let mut current = Cow::Borrowed(line);

    for editor in editors {
        if step(editor, &mut current) == Step::Removed {
            return (current, Action::Remove);
        }
    }

    (current, Action::Replace)
}

/// Outcome of running one editor as part of a fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Unchanged,
    Changed,
    Removed,
}

/// Runs `editor` on `current`, storing its result back into `current`.
///
/// Every fold over editors goes through here, so this is the one place
/// where actions are interpreted.
pub(crate) fn step(editor: &Editor, current: &mut Cow<'_, [u8]>) -> Step {
    let (edited, action) = editor.edit(&**current);
    let changed = match edited {
        Cow::Borrowed(bytes) if std::ptr::eq(bytes, &**current) => None,
        other => Some(other.into_owned()),
    };

    let outcome = match changed {
        Some(bytes) => {
            *current = Cow::Owned(bytes);
            Step::Changed
        }
        None => Step::Unchanged,
    };

    match action {
        Action::Remove => Step::Removed,
        Action::Replace => outcome,
    }
}

fn compile(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|err| PatternError::new(pattern, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(editor: &Editor, line: &str) -> (String, Action) {
        let (out, action) = editor.edit(line.as_bytes());
        (String::from_utf8(out.into_owned()).unwrap(), action)
    }

    fn replaced(line: &str) -> (String, Action) {
        (line.to_string(), Action::Replace)
    }

    #[test]
    fn test_remove() {
        assert_eq!(edit(&Editor::remove(), "one").1, Action::Remove);
        assert_eq!(edit(&Editor::remove(), "").1, Action::Remove);
    }

    #[test]
    fn test_replace_literal_ignores_input() {
        let editor = Editor::replace_literal("yes");
        assert_eq!(edit(&editor, "anything"), replaced("yes"));
        assert_eq!(edit(&editor, ""), replaced("yes"));
    }

    #[test]
    fn test_replace_regexp_is_global() {
        let editor = Editor::replace_regexp_str("o", "0").unwrap();
        assert_eq!(edit(&editor, "foo boo"), replaced("f00 b00"));
    }

    #[test]
    fn test_replace_regexp_without_match_is_noop() {
        let editor = Editor::replace_regexp_str("z", "0").unwrap();
        assert_eq!(edit(&editor, "foo"), replaced("foo"));
        assert!(matches!(editor.edit(b"foo").0, Cow::Borrowed(_)));
    }

    #[test]
    fn test_replace_regexp_capture_groups() {
        let editor = Editor::replace_regexp_str(r"(?P<key>\w+)=(\w+)", "$key=<${2}>").unwrap();
        assert_eq!(edit(&editor, "user=bob id=7"), replaced("user=<bob> id=<7>"));
    }

    #[test]
    fn test_replace_regexp_invalid_pattern() {
        let err = Editor::replace_regexp_str("(oops", "").unwrap_err();
        assert_eq!(err.pattern(), "(oops");
    }

    #[test]
    fn test_regexp_guard() {
        let cases = [
            (".*funny.*", "life is funny", "YAY!"),
            (".*funny.*", "life is funn", "life is funn"),
            ("(?m)^life", "life is funny", "YAY!"),
            ("funny", "life is funny", "YAY!"),
        ];

        for (pattern, input, output) in cases {
            let editor = Editor::regexp_str(pattern, Editor::replace_literal("YAY!")).unwrap();
            assert_eq!(edit(&editor, input).0, output, "pattern {pattern}");
        }
    }

    #[test]
    fn test_regexp_prefix() {
        let cases = [
            (".*funny.*", None),
            ("life", None),
            ("^life", Some(&b"life"[..])),
            ("(?m)^life", Some(&b"life"[..])),
            ("(?i)^life", None),
            ("^(?:li)fe", Some(&b"life"[..])),
        ];

        for (pattern, prefix) in cases {
            let editor = Editor::regexp_str(pattern, Editor::remove()).unwrap();
            assert_eq!(editor.required_prefix(), prefix, "pattern {pattern}");
        }
    }

    #[test]
    fn test_precompiled_regexp_has_no_prefix() {
        let regex = regex::bytes::RegexBuilder::new("^life")
            .case_insensitive(true)
            .build()
            .unwrap();
        let editor = Editor::regexp(regex, Editor::remove());
        assert_eq!(editor.required_prefix(), None);
        assert_eq!(edit(&editor, "LIFE").1, Action::Remove);
    }

    #[test]
    fn test_regexp_invalid_pattern() {
        assert!(Editor::regexp_str("[", Editor::remove()).is_err());
    }

    #[test]
    fn test_prefix_guard() {
        let editor = Editor::prefix("DEBUG ", Editor::remove());
        assert_eq!(editor.required_prefix(), Some(&b"DEBUG "[..]));
        assert_eq!(edit(&editor, "DEBUG hello").1, Action::Remove);
        assert_eq!(edit(&editor, "INFO hello"), replaced("INFO hello"));
        assert_eq!(edit(&editor, "DEBUG"), replaced("DEBUG"));
        assert_eq!(edit(&editor, "debug hello"), replaced("debug hello"));
    }

    #[test]
    fn test_empty_prefix_guard_matches_everything() {
        let editor = Editor::prefix("", Editor::replace_literal("x"));
        assert_eq!(editor.required_prefix(), None);
        assert_eq!(edit(&editor, "abc"), replaced("x"));
    }

    #[test]
    fn test_sequence_threads_line() {
        let editor = Editor::sequence([
            Editor::replace_regexp_str("o", "ee").unwrap(),
            Editor::replace_regexp_str("ee", "oo").unwrap(),
        ]);
        assert_eq!(edit(&editor, "one"), replaced("oone"));
    }

    #[test]
    fn test_sequence_last_replace_wins() {
        let editor = Editor::sequence([Editor::replace_literal("yes"), Editor::replace_literal("no")]);
        assert_eq!(edit(&editor, "x"), replaced("no"));
    }

    #[test]
    fn test_sequence_short_circuits_on_remove() {
        let editor = Editor::sequence([
            Editor::replace_literal("secret"),
            Editor::regexp_str("^secret", Editor::remove()).unwrap(),
            Editor::replace_literal("unreachable"),
        ]);
        let (line, action) = edit(&editor, "x");
        assert_eq!(action, Action::Remove);
        assert_eq!(line, "secret");
    }

    #[test]
    fn test_empty_sequence_is_noop() {
        let editor = Editor::sequence([]);
        assert_eq!(edit(&editor, "keep"), replaced("keep"));
        assert!(matches!(editor.edit(b"keep").0, Cow::Borrowed(_)));
    }

    #[test]
    fn test_nested_sequences() {
        let editor = Editor::sequence([
            Editor::sequence([Editor::replace_regexp_str("a", "b").unwrap()]),
            Editor::prefix("b", Editor::replace_regexp_str("b", "c").unwrap()),
        ]);
        assert_eq!(edit(&editor, "aa"), replaced("cc"));
        assert_eq!(edit(&editor, "xa"), replaced("xb"));
    }

    #[test]
    fn test_non_utf8_line() {
        let editor = Editor::replace_regexp_str("(?-u)\\xFF", "?").unwrap();
        let (out, action) = editor.edit(&[b'a', 0xFF, b'b']);
        assert_eq!(&*out, b"a?b");
        assert_eq!(action, Action::Replace);
    }
}
