//! The document tree and its structural invariants.
//!
//! [`Document`] offers lookups and low-level, checked tree surgery. It does
//! not validate geometry or record history; the [`Scene`](crate::scene::Scene)
//! builds its mutation API on top of it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use layoutkit_core::{Error, Result, StructureError};
use serde::{Deserialize, Serialize};

use super::node::{ElementType, Node, NodeKind, NodePath};

/// Document-level metadata carried through load and save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub creator: String,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
            creator: String::new(),
        }
    }
}

/// The open document: a `Document` root node owning its pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Node,
    pub metadata: DocumentMetadata,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Node::new("doc", NodeKind::Document),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Adopts an already realized tree after checking its invariants.
    pub fn from_root(root: Node) -> std::result::Result<Self, StructureError> {
        if root.element_type() != ElementType::Document {
            return Err(StructureError::InvalidParent {
                child: root.element_type().to_string(),
                parent: "root".to_string(),
            });
        }
        check_tree(&root)?;
        Ok(Self {
            root,
            metadata: DocumentMetadata::default(),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn pages(&self) -> impl Iterator<Item = &Node> {
        self.root
            .children
            .iter()
            .filter(|n| n.element_type() == ElementType::Page)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.root.iter()
    }

    pub fn len(&self) -> usize {
        self.root.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.root.find(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.root.find_mut(id)
    }

    /// Like [`Document::node`] but reports a missing id as an error.
    pub fn get(&self, id: &str) -> Result<&Node> {
        self.node(id).ok_or_else(|| Error::not_found(id))
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut Node> {
        self.root.find_mut(id).ok_or_else(|| Error::not_found(id))
    }

    pub fn path_of(&self, id: &str) -> Option<NodePath> {
        self.root.path_of(id)
    }

    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        self.root.at_path(path)
    }

    /// Ancestors of `id`, nearest first. Empty for the root or an unknown id.
    pub fn ancestors(&self, id: &str) -> Vec<&Node> {
        let Some(path) = self.path_of(id) else {
            return Vec::new();
        };
        let mut chain = Vec::with_capacity(path.depth());
        let mut node = &self.root;
        for &i in &path.0 {
            chain.push(node);
            node = &node.children[i];
        }
        chain.reverse();
        chain
    }

    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.ancestors(id).into_iter().next()
    }

    /// The page a node lives on, or the node itself when it is a page.
    pub fn page_of(&self, id: &str) -> Option<&Node> {
        let node = self.node(id)?;
        if node.element_type() == ElementType::Page {
            return Some(node);
        }
        self.ancestors(id)
            .into_iter()
            .find(|n| n.element_type() == ElementType::Page)
    }

    /// Page image size of the page holding `id`.
    pub fn page_size_of(&self, id: &str) -> Option<(f64, f64)> {
        match self.page_of(id).map(|p| &p.kind) {
            Some(NodeKind::Page { width, height, .. }) => Some((*width, *height)),
            _ => None,
        }
    }

    /// A node is read-only when it or any ancestor is protected.
    pub fn is_read_only(&self, id: &str) -> Result<bool> {
        let node = self.get(id)?;
        Ok(node.protected || self.ancestors(id).iter().any(|a| a.protected))
    }

    pub fn ids(&self) -> HashSet<String> {
        self.root.iter().map(|n| n.id.clone()).collect()
    }

    /// First free id of the form `<prefix><n>`, probing `n` from 1.
    pub fn unique_id(&self, prefix: &str) -> String {
        let ids = self.ids();
        next_free_id(prefix, &ids)
    }

    /// Id prefix for a new child of `parent_id`.
    ///
    /// Children of pages start a fresh namespace (`r`, `t`, `grp`); deeper
    /// elements are named after their parent (`r1_l`, `r1_l1_w`).
    pub fn child_prefix(&self, parent_id: &str, kind: ElementType) -> Result<String> {
        let parent = self.get(parent_id)?;
        Ok(match parent.element_type() {
            ElementType::Document | ElementType::Page => kind.id_prefix().to_string(),
            _ => format!("{}_{}", parent.id, kind.id_prefix()),
        })
    }

    /// Inserts `node` under `parent_id` at `index` (appends when `None`).
    pub(crate) fn insert(&mut self, parent_id: &str, node: Node, index: Option<usize>) -> Result<()> {
        let parent_type = self.get(parent_id)?.element_type();
        if !parent_type.can_contain(node.element_type()) {
            return Err(StructureError::InvalidParent {
                child: node.element_type().to_string(),
                parent: parent_type.to_string(),
            }
            .into());
        }
        let ids = self.ids();
        if let Some(dup) = node.iter().find(|n| ids.contains(&n.id)) {
            return Err(StructureError::DuplicateId { id: dup.id.clone() }.into());
        }
        let parent = self.get_mut(parent_id)?;
        let at = index
            .unwrap_or(parent.children.len())
            .min(parent.children.len());
        parent.children.insert(at, node);
        Ok(())
    }

    /// Detaches the subtree rooted at `id`.
    pub(crate) fn remove(&mut self, id: &str) -> Result<Node> {
        let path = self.path_of(id).ok_or_else(|| Error::not_found(id))?;
        let Some((&last, parent_path)) = path.0.split_last() else {
            return Err(StructureError::UnsupportedOperation {
                reason: "the document root cannot be removed".to_string(),
            }
            .into());
        };
        let mut parent = &mut self.root;
        for &i in parent_path {
            parent = &mut parent.children[i];
        }
        Ok(parent.children.remove(last))
    }

    /// Rewrites every id reference (group members and word-break partners).
    pub(crate) fn rewrite_references(&mut self, renamed: &[(String, String)]) {
        if renamed.is_empty() {
            return;
        }
        fn walk(node: &mut Node, renamed: &[(String, String)]) {
            for member in &mut node.members {
                if let Some((_, new)) = renamed.iter().find(|(old, _)| *old == member.id) {
                    member.id = new.clone();
                }
            }
            if let Some(pair) = &node.break_pair {
                if let Some((_, new)) = renamed.iter().find(|(old, _)| old == pair) {
                    node.break_pair = Some(new.clone());
                }
            }
            for child in &mut node.children {
                walk(child, renamed);
            }
        }
        walk(&mut self.root, renamed);
    }
}

pub(crate) fn next_free_id(prefix: &str, ids: &HashSet<String>) -> String {
    (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !ids.contains(candidate))
        .unwrap_or_else(|| prefix.to_string())
}

fn check_tree(root: &Node) -> std::result::Result<(), StructureError> {
    let mut seen = HashSet::new();
    for node in root.iter() {
        if !seen.insert(node.id.as_str()) {
            return Err(StructureError::DuplicateId {
                id: node.id.clone(),
            });
        }
        let parent_type = node.element_type();
        for child in &node.children {
            if !parent_type.can_contain(child.element_type()) {
                return Err(StructureError::InvalidParent {
                    child: child.element_type().to_string(),
                    parent: parent_type.to_string(),
                });
            }
        }
        if let NodeKind::TableRegion { rows, cols } = node.kind {
            let cells = node.children.len();
            if cells != rows * cols {
                return Err(StructureError::CellCountMismatch {
                    table: node.id.clone(),
                    cells,
                    rows,
                    cols,
                });
            }
        }
    }
    Ok(())
}
