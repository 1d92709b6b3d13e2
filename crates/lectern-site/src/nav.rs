//! Navigation tree mirroring the input directory hierarchy.
//!
//! Nodes live in an arena owned by [`NavTree`] and refer to each other by
//! [`NodeId`]. The tree always has a synthetic root titled `Root`; the node
//! for the input directory itself is its only child (see [`NavTree::site_root`]).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Index of a node in its [`NavTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    title: String,
    path: String,
}

impl Entry {
    /// Create an entry. A single leading `/` is stripped from `path`.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        let mut path = path.into();
        if path.starts_with('/') {
            path.remove(0);
        }

        Self {
            title: title.into(),
            path,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Location of the rendered page, relative to the output root.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// One input directory.
#[derive(Debug, Clone)]
pub struct Node {
    title: String,
    dir: PathBuf,
    children: Vec<NodeId>,
    entries: Vec<Entry>,
}

impl Node {
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Directory path relative to the input root (empty for the input root).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

/// Arena-backed navigation tree.
#[derive(Debug, Clone)]
pub struct NavTree {
    nodes: Vec<Node>,
    by_dir: HashMap<PathBuf, NodeId>,
}

impl Default for NavTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NavTree {
    /// Title of the synthetic root node.
    pub const ROOT_TITLE: &'static str = "Root";

    /// Create a tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                title: Self::ROOT_TITLE.to_string(),
                dir: PathBuf::new(),
                children: Vec::new(),
                entries: Vec::new(),
            }],
            by_dir: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node of the input directory, once it has been added.
    pub fn site_root(&self) -> Option<NodeId> {
        self.nodes[0].children.first().copied()
    }

    /// Look up a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Find the node for a directory, given relative to the input root.
    pub fn find(&self, dir: impl AsRef<Path>) -> Option<NodeId> {
        self.by_dir.get(dir.as_ref()).copied()
    }

    /// Number of nodes, including the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.site_root().is_none()
    }

    /// Total number of entries in the tree.
    pub fn entry_count(&self) -> usize {
        self.nodes.iter().map(|n| n.entries.len()).sum()
    }

    /// Add a directory node as the last child of `parent`.
    pub fn add_directory(
        &mut self,
        parent: NodeId,
        title: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let dir = dir.into();

        self.by_dir.insert(dir.clone(), id);
        self.nodes.push(Node {
            title: title.into(),
            dir,
            children: Vec::new(),
            entries: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);

        id
    }

    /// Append an entry to a node.
    pub fn push_entry(&mut self, node: NodeId, entry: Entry) {
        self.nodes[node.0].entries.push(entry);
    }

    /// Nodes below and including `start`, children before their parent.
    pub fn postorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(start, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, false));
            }
        }

        order
    }

    /// Nodes below and including `start` with their depth, parents first.
    pub fn preorder(&self, start: NodeId) -> Vec<(usize, NodeId)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(0, start)];

        while let Some((depth, id)) = stack.pop() {
            order.push((depth, id));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> NavTree {
        let mut tree = NavTree::new();
        let docs = tree.add_directory(tree.root(), "docs", "");
        let api = tree.add_directory(docs, "api", "api");
        tree.add_directory(api, "v1", "api/v1");
        let guide = tree.add_directory(docs, "guide", "guide");
        tree.push_entry(guide, Entry::new("Setup", "guide/setup.html"));
        tree.push_entry(docs, Entry::new("Home", "index.html"));
        tree
    }

    #[test]
    fn entry_strips_one_leading_separator() {
        assert_eq!(Entry::new("T", "/a/b").path(), "a/b");
        assert_eq!(Entry::new("T", "a/b").path(), "a/b");
        assert_eq!(Entry::new("T", "//a").path(), "/a");
        assert_eq!(Entry::new("T", "").path(), "");
    }

    #[test]
    fn new_tree_has_only_synthetic_root() {
        let tree = NavTree::new();

        assert_eq!(tree.node(tree.root()).title(), "Root");
        assert_eq!(tree.site_root(), None);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn keeps_insertion_order() {
        let tree = sample();
        let docs = tree.site_root().unwrap();

        let titles: Vec<&str> = tree
            .node(docs)
            .children()
            .iter()
            .map(|&id| tree.node(id).title())
            .collect();

        assert_eq!(titles, vec!["api", "guide"]);
        assert_eq!(tree.node(docs).entries(), &[Entry::new("Home", "index.html")]);
        assert_eq!(tree.entry_count(), 2);
    }

    #[test]
    fn finds_nodes_by_directory() {
        let tree = sample();

        let v1 = tree.find("api/v1").unwrap();
        assert_eq!(tree.node(v1).title(), "v1");
        assert_eq!(tree.node(v1).dir(), Path::new("api/v1"));
        assert_eq!(tree.find(""), tree.site_root());
        assert_eq!(tree.find("missing"), None);
    }

    #[test]
    fn postorder_visits_children_first() {
        let tree = sample();

        let titles: Vec<&str> = tree
            .postorder(tree.root())
            .into_iter()
            .map(|id| tree.node(id).title())
            .collect();

        assert_eq!(titles, vec!["v1", "api", "guide", "docs", "Root"]);
    }

    #[test]
    fn preorder_tracks_depth() {
        let tree = sample();

        let visited: Vec<(usize, &str)> = tree
            .preorder(tree.site_root().unwrap())
            .into_iter()
            .map(|(depth, id)| (depth, tree.node(id).title()))
            .collect();

        assert_eq!(
            visited,
            vec![(0, "docs"), (1, "api"), (2, "v1"), (1, "guide")]
        );
    }
}
