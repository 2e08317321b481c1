//! Path patterns.
//!
//! A pattern is matched on its own, against one path at a time: the router
//! asks each route in turn, so overlapping patterns are legal and the first
//! registration wins. Each pattern compiles to a single-entry [`matchit`]
//! tree, which does the actual segment matching and parameter capture.
//!
//! Accepted syntax:
//!
//! | Segment | Meaning |
//! |---|---|
//! | `users` | literal |
//! | `:id` or `{id}` | one segment, captured as `id` |
//! | `*rest` or `{*rest}` | the remainder of the path (last segment only) |
//!
//! Captured values are percent-decoded; invalid UTF-8 is replaced lossily.

use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::request::Params;

pub(crate) struct Pattern {
    source: String,
    tree: MatchitRouter<()>,
}

impl Pattern {
    pub(crate) fn parse(source: &str) -> Result<Self, matchit::InsertError> {
        let mut tree = MatchitRouter::new();
        tree.insert(to_matchit(source), ())?;
        Ok(Self { source: source.to_owned(), tree })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.source
    }

    /// Captured parameters if `path` satisfies the pattern.
    pub(crate) fn capture(&self, path: &str) -> Option<Params> {
        let matched = self.tree.at(path).ok()?;
        Some(
            matched
                .params
                .iter()
                .map(|(name, raw)| (name, percent_decode_str(raw).decode_utf8_lossy()))
                .collect(),
        )
    }
}

/// Rewrites `:name` and `*name` segments into matchit's `{name}` / `{*name}`.
fn to_matchit(source: &str) -> String {
    source
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
