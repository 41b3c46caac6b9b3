//! Rules files
//!
//! Rules are kept in TOML, one `[[rules]]` table per editor, applied in file
//! order. When no file is named on the command line, editline looks for
//! ~/.editline/rules.toml

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::editor::Editor;
use crate::error::RuleError;
use crate::rules::parse_expression;

const EXAMPLE_RULES: &str = r#"# editline rules
#
# Rules run in the order they appear. Each rule either holds a single
# `expression` (same syntax as `editline -e`) or is built from fields:
#
#   prefix   = "..."   only lines starting with this literal
#   regexp   = "..."   only lines matching this regex
#   action   = "remove" | "replace" | "substitute"
#   text     = "..."   line to emit, for "replace"
#   pattern  = "..."   regex to substitute, for "substitute"
#   template = "..."   replacement, $1 / ${name} refer to groups

# Drop debug output
[[rules]]
expression = "/^DEBUG /d"

# Hide bearer tokens
[[rules]]
regexp = "Authorization:"
action = "substitute"
pattern = "Bearer \\S+"
template = "Bearer ***"

# Blank out private key lines
#[[rules]]
#prefix = "-----BEGIN"
#action = "replace"
#text = "<key removed>"
"#;

/// A parsed rules file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One rule, either an expression or a guarded action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Rule expression, exclusive with every other field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Literal the line must start with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Regex the line must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,

    /// Replacement line for `replace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Pattern for `substitute`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Template for `substitute`, empty when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Remove,
    Replace,
    Substitute,
}

impl Rule {
    /// Builds the editor this rule describes.
    ///
    /// With both guards, the prefix guard wraps the regexp guard so the rule
    /// is still indexed by its prefix.
    pub fn to_editor(&self) -> Result<Editor, RuleError> {
        if let Some(expression) = &self.expression {
            let only_expression = Rule {
                expression: None,
                ..self.clone()
            } == Rule::default();
            if !only_expression {
                return Err(invalid("`expression` cannot be combined with other fields"));
            }
            return parse_expression(expression);
        }

        let action = self
            .action
            .ok_or_else(|| invalid("missing `action` or `expression`"))?;

        let mut editor = match action {
            RuleAction::Remove => {
                self.reject_fields(&["text", "pattern", "template"])?;
                Editor::remove()
            }
            RuleAction::Replace => {
                self.reject_fields(&["pattern", "template"])?;
                let text = self
                    .text
                    .as_deref()
                    .ok_or_else(|| invalid("`replace` needs `text`"))?;
                Editor::replace_literal(text)
            }
            RuleAction::Substitute => {
                self.reject_fields(&["text"])?;
                let pattern = self
                    .pattern
                    .as_deref()
                    .ok_or_else(|| invalid("`substitute` needs `pattern`"))?;
                Editor::replace_regexp_str(pattern, self.template.as_deref().unwrap_or_default())?
            }
        };

        if let Some(regexp) = &self.regexp {
            editor = Editor::regexp_str(regexp, editor)?;
        }
        if let Some(prefix) = &self.prefix {
            editor = Editor::prefix(prefix.as_str(), editor);
        }

        Ok(editor)
    }

    fn reject_fields(&self, names: &[&str]) -> Result<(), RuleError> {
        for name in names {
            let set = match *name {
                "text" => self.text.is_some(),
                "pattern" => self.pattern.is_some(),
                "template" => self.template.is_some(),
                _ => false,
            };
            if set {
                let action = self.action.map(|a| format!("{a:?}").to_lowercase());
                return Err(invalid(format!(
                    "`{name}` is not used by action `{}`",
                    action.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}

impl RulesFile {
    /// Compiles every rule, in file order.
    pub fn editors(&self) -> Result<Vec<Editor>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                rule.to_editor()
                    .with_context(|| format!("Rule #{} is invalid", i + 1))
            })
            .collect()
    }
}

fn invalid(reason: impl Into<String>) -> RuleError {
    RuleError::Invalid(reason.into())
}

/// Path of the rules file used when none is given
pub fn default_rules_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".editline").join("rules.toml"))
}

/// Parse rules from TOML text
pub fn parse_rules(text: &str) -> Result<RulesFile> {
    toml::from_str(text).context("Failed to parse rules")
}

/// Load a rules file
pub fn load_rules(path: &Path) -> Result<RulesFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file: {}", path.display()))?;

    toml::from_str(&text)
        .with_context(|| format!("Failed to parse rules file: {}", path.display()))
}

/// Load and compile several rules files, concatenating their editors
pub fn load_editors(paths: &[PathBuf]) -> Result<Vec<Editor>> {
    let mut editors = Vec::new();
    for path in paths {
        let rules = load_rules(path)?;
        let compiled = rules
            .editors()
            .with_context(|| format!("In rules file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), rules = compiled.len(), "loaded rules file");
        editors.extend(compiled);
    }
    Ok(editors)
}

/// Write the commented example rules file, creating parent directories
pub fn save_example_rules(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create rules directory: {}", parent.display()))?;
    }

    fs::write(path, EXAMPLE_RULES)
        .with_context(|| format!("Failed to write rules file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{Action, edit_sequence};

    fn run(editors: &[Editor], line: &str) -> (String, Action) {
        let (out, action) = edit_sequence(editors, line.as_bytes());
        (String::from_utf8(out.into_owned()).unwrap(), action)
    }

    #[test]
    fn test_example_rules_parse() {
        let rules = parse_rules(EXAMPLE_RULES).unwrap();
        assert_eq!(rules.rules.len(), 2);

        let editors = rules.editors().unwrap();
        assert_eq!(run(&editors, "DEBUG hi").1, Action::Remove);
        assert_eq!(
            run(&editors, "Authorization: Bearer abc.def").0,
            "Authorization: Bearer ***"
        );
        assert_eq!(run(&editors, "Bearer abc").0, "Bearer abc");
    }

    #[test]
    fn test_structured_rules() {
        let rules = parse_rules(
            r##"
            [[rules]]
            prefix = "token="
            action = "replace"
            text = "token=<redacted>"

            [[rules]]
            action = "remove"
            prefix = "#"

            [[rules]]
            regexp = "password"
            action = "substitute"
            pattern = "password=\\S+"
            template = "password=***"
            "##,
        )
        .unwrap();

        let editors = rules.editors().unwrap();
        assert_eq!(editors[0].required_prefix(), Some(&b"token="[..]));
        assert_eq!(editors[1].required_prefix(), Some(&b"#"[..]));
        assert_eq!(editors[2].required_prefix(), None);

        assert_eq!(run(&editors, "token=abc").0, "token=<redacted>");
        assert_eq!(run(&editors, "# comment").1, Action::Remove);
        assert_eq!(run(&editors, "user password=hunter2 x").0, "user password=*** x");
        assert_eq!(run(&editors, "plain").0, "plain");
    }

    #[test]
    fn test_prefix_wraps_regexp() {
        let rule = Rule {
            prefix: Some("GET ".to_string()),
            regexp: Some("/admin".to_string()),
            action: Some(RuleAction::Remove),
            ..Rule::default()
        };
        let editor = rule.to_editor().unwrap();
        assert_eq!(editor.required_prefix(), Some(&b"GET "[..]));
        assert_eq!(editor.edit(b"GET /admin").1, Action::Remove);
        assert_eq!(editor.edit(b"POST /admin").1, Action::Replace);
        assert_eq!(editor.edit(b"GET /home").1, Action::Replace);
    }

    #[test]
    fn test_substitute_without_template_deletes_matches() {
        let rule = Rule {
            action: Some(RuleAction::Substitute),
            pattern: Some("\\d".to_string()),
            ..Rule::default()
        };
        assert_eq!(&*rule.to_editor().unwrap().edit(b"a1b2").0, b"ab");
    }

    #[test]
    fn test_invalid_rules() {
        let cases = [
            Rule::default(),
            Rule {
                expression: Some("d".to_string()),
                action: Some(RuleAction::Remove),
                ..Rule::default()
            },
            Rule {
                action: Some(RuleAction::Replace),
                ..Rule::default()
            },
            Rule {
                action: Some(RuleAction::Substitute),
                ..Rule::default()
            },
            Rule {
                action: Some(RuleAction::Remove),
                text: Some("x".to_string()),
                ..Rule::default()
            },
        ];

        for rule in cases {
            assert!(
                matches!(rule.to_editor(), Err(RuleError::Invalid(_))),
                "{rule:?}"
            );
        }
    }

    #[test]
    fn test_bad_pattern_names_rule() {
        let rules = parse_rules(
            r#"
            [[rules]]
            expression = "d"

            [[rules]]
            regexp = "("
            action = "remove"
            "#,
        )
        .unwrap();

        let err = rules.editors().unwrap_err();
        assert!(err.to_string().contains("Rule #2"), "{err:#}");
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(parse_rules("[[rules]]\nacton = \"remove\"\n").is_err());
        assert!(parse_rules("[[rules]]\naction = \"delete\"\n").is_err());
    }

    #[test]
    fn test_empty_file() {
        assert_eq!(parse_rules("").unwrap(), RulesFile::default());
    }

    #[test]
    fn test_rules_to_toml() {
        let rules = RulesFile {
            rules: vec![Rule {
                prefix: Some("x".to_string()),
                action: Some(RuleAction::Remove),
                ..Rule::default()
            }],
        };
        let text = toml::to_string_pretty(&rules).unwrap();
        assert!(text.contains("[[rules]]"));
        assert!(text.contains("action = \"remove\""));
        assert_eq!(parse_rules(&text).unwrap(), rules);
    }

    #[test]
    fn test_default_rules_path() {
        if let Some(path) = default_rules_path() {
            assert!(path.ends_with(".editline/rules.toml"));
        }
    }
}
