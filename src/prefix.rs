//! Literal prefix extraction
//!
//! A regex guard can only ever fire on a line that starts with a fixed
//! literal when its pattern is anchored at the start and immediately
//! followed by case-sensitive literal text, e.g. `^token=`. That literal is
//! what the writer indexes the guard under.
//!
//! The pattern is inspected as `regex-syntax` HIR. HIR is simplified as it
//! is built: nested concatenations are flattened, non-capturing groups
//! disappear and adjacent literals merge, so `^(?:li)fe` and `^li(?:fe)`
//! both yield `life`. Capturing groups survive simplification and are not
//! looked into, so `^(life)` yields nothing. Case-insensitive literals are
//! turned into classes, which is why `(?i)^life` yields nothing.

use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Hir, HirKind, Look};

/// Returns the literal every match of `pattern` must start the line with.
///
/// An empty result means no such literal could be proven. That is always
/// safe: the editor is then evaluated against every line.
pub fn regex_prefix(pattern: &str) -> Vec<u8> {
    // utf8(false) matches how `regex::bytes` parses patterns.
    let mut parser = ParserBuilder::new().utf8(false).build();
    match parser.parse(pattern) {
        Ok(hir) => hir_prefix(&hir).map(<[u8]>::to_vec).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

fn hir_prefix(hir: &Hir) -> Option<&[u8]> {
    let HirKind::Concat(subs) = hir.kind() else {
        return None;
    };
    let [anchor, literal, ..] = subs.as_slice() else {
        return None;
    };

    // `(?mR)^` also matches after a lone '\r', which can sit inside a line.
    if !matches!(anchor.kind(), HirKind::Look(Look::Start | Look::StartLF)) {
        return None;
    }

    match literal.kind() {
        HirKind::Literal(lit) => Some(&*lit.0),
        _ => None,
    }
}
