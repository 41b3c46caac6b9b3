//! Prefix trie over editors
//!
//! Each editor is stored at the node spelled by its required prefix; editors
//! without one live at the root. Looking a line up walks the trie along the
//! line's leading bytes and collects every editor passed on the way, so an
//! editor is only skipped when the line provably does not start with its
//! prefix.
//!
//! An earlier editor can rewrite a line into one that a later editor's
//! prefix does match. [`PrefixTrie::edit`] looks candidates up again after
//! every rewrite, so such an editor still runs.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::editor::{Action, Editor, Step, step};

#[derive(Debug, Default)]
struct Node {
    /// Indices into `PrefixTrie::editors`, ascending.
    items: Vec<usize>,
    children: HashMap<u8, Node>,
}

impl Node {
    fn insert(&mut self, prefix: &[u8], index: usize) {
        let mut node = self;
        for byte in prefix {
            node = node.children.entry(*byte).or_default();
        }
        node.items.push(index);
    }
}

/// An immutable index answering "which editors could change this line".
#[derive(Debug, Default)]
pub struct PrefixTrie {
    editors: Vec<Editor>,
    root: Node,
}

impl PrefixTrie {
    pub fn new(editors: impl IntoIterator<Item = Editor>) -> Self {
        let editors: Vec<Editor> = editors.into_iter().collect();
        let mut root = Node::default();
        for (index, editor) in editors.iter().enumerate() {
            root.insert(editor.required_prefix().unwrap_or_default(), index);
        }
        Self { editors, root }
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Number of editors that are checked against every line.
    pub fn unindexed(&self) -> usize {
        self.root.items.len()
    }

    /// Writes the registration indices of the editors that may change `line`
    /// into `out`, ascending. `out` is cleared first.
    pub fn candidates(&self, line: &[u8], out: &mut Vec<usize>) {
        out.clear();

        let mut node = &self.root;
        out.extend_from_slice(&node.items);
        for byte in line {
            match node.children.get(byte) {
                Some(child) => {
                    node = child;
                    out.extend_from_slice(&node.items);
                }
                None => break,
            }
        }

        // Deeper nodes can hold earlier editors.
        out.sort_unstable();
    }

    /// Runs the editors that may change `line`, in registration order,
    /// stopping at the first removal.
    ///
    /// The result is the same as folding `line` through every editor.
    /// `scratch` holds candidate indices between calls.
    pub fn edit<'a>(&'a self, line: &'a [u8], scratch: &mut Vec<usize>) -> (Cow<'a, [u8]>, Action) {
        let mut current = Cow::Borrowed(line);
        self.candidates(&current, scratch);

        let mut pos = 0;
        while let Some(&index) = scratch.get(pos) {
            match step(&self.editors[index], &mut current) {
                Step::Removed => return (current, Action::Remove),
                Step::Unchanged => pos += 1,
                Step::Changed => {
                    self.candidates(&current, scratch);
                    pos = scratch.partition_point(|&i| i <= index);
                }
            }
        }

        (current, Action::Replace)
    }
}
