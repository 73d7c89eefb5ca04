// Word/space segmentation
// Text splits into maximal runs of non-whitespace (words) and whitespace (spaces).

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::{Dom, NodeId};

static RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+|\s+").expect("run pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Word,
    Space,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub kind: RunKind,
    pub text: String,
}

impl Run {
    pub fn is_word(&self) -> bool {
        self.kind == RunKind::Word
    }
}

pub fn split_runs(text: &str) -> Vec<Run> {
    RUN_RE
        .find_iter(text)
        .map(|m| {
            let kind = if m.as_str().chars().all(char::is_whitespace) {
                RunKind::Space
            } else {
                RunKind::Word
            };
            Run {
                kind,
                text: m.as_str().to_string(),
            }
        })
        .collect()
}

/// Runs of every text node below `root`, depth first, each paired with the
/// text node it came from
pub fn text_runs(dom: &Dom, root: NodeId) -> Vec<(NodeId, Run)> {
    dom.text_nodes(root)
        .into_iter()
        .flat_map(|node| {
            split_runs(dom.text(node).unwrap_or_default())
                .into_iter()
                .map(move |run| (node, run))
        })
        .collect()
}

/// Concatenated text of `runs`
pub fn join_runs<'a>(runs: impl IntoIterator<Item = &'a Run>) -> String {
    runs.into_iter().map(|r| r.text.as_str()).collect()
}
