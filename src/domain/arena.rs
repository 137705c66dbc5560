//! Arena-backed site hierarchy.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::site::Site;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct SiteNode {
    /// Site attributes for this node
    pub site: Site,
    /// Index of parent node in the arena, None only for the timing source
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// Site hierarchy rooted at a synthetic timing source.
///
/// Children are owned top-down through the arena; `parent` is a plain index
/// used for ancestor walks. The timing source never shows up in iteration,
/// lookup or ancestor walks.
#[derive(Debug, Clone)]
pub struct SiteTree {
    arena: Arena<SiteNode>,
    root: Index,
}

impl SiteTree {
    /// Create a tree holding only the timing source named `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(SiteNode {
            site: Site::new(root_name),
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    #[instrument(level = "trace", skip(self, site), fields(site = %site.name))]
    pub fn insert_site(&mut self, site: Site, parent: Index) -> DomainResult<Index> {
        if !self.arena.contains(parent) {
            return Err(DomainError::UnknownParent(site.name));
        }
        let node_idx = self.arena.insert(SiteNode {
            site,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        Ok(node_idx)
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_name(&self) -> &str {
        &self.arena[self.root].site.name
    }

    pub fn is_root(&self, idx: Index) -> bool {
        idx == self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&SiteNode> {
        self.arena.get(idx)
    }

    pub fn site(&self, idx: Index) -> Option<&Site> {
        self.arena.get(idx).map(|n| &n.site)
    }

    /// Mutable access to a site's attributes. The timing source is not editable.
    pub fn site_mut(&mut self, idx: Index) -> Option<&mut Site> {
        if idx == self.root {
            return None;
        }
        self.arena.get_mut(idx).map(|n| &mut n.site)
    }

    /// Parent of `idx`, or None when the parent is the timing source.
    pub fn parent(&self, idx: Index) -> Option<Index> {
        self.arena
            .get(idx)
            .and_then(|n| n.parent)
            .filter(|&p| p != self.root)
    }

    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of sites, not counting the timing source.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-order walk over every site below the timing source.
    pub fn iter(&self) -> Descendants<'_> {
        self.descendants(self.root)
    }

    /// Pre-order walk over the subtree below `idx`, excluding `idx` itself.
    pub fn descendants(&self, idx: Index) -> Descendants<'_> {
        Descendants::new(self, idx)
    }

    /// Walk from `idx` towards the timing source, nearest first.
    ///
    /// Yields `idx` itself first. The timing source is never yielded.
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(idx).filter(|&i| i != self.root && self.arena.contains(i)),
        }
    }

    /// First site in pre-order whose name equals `name`.
    #[instrument(level = "trace", skip(self))]
    pub fn find_by_name(&self, name: &str) -> Option<Index> {
        self.iter()
            .find(|(_, node)| node.site.name == name)
            .map(|(idx, _)| idx)
    }

    /// Number of site levels below the timing source.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.children(self.root)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        1 + self
            .children(node_idx)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Names of sites without children, in pre-order.
    pub fn leaf_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.site.name.clone())
            .collect()
    }
}

pub struct Descendants<'a> {
    tree: &'a SiteTree,
    stack: Vec<Index>,
}

impl<'a> Descendants<'a> {
    fn new(tree: &'a SiteTree, start: Index) -> Self {
        // Push children in reverse order for left-to-right traversal
        let stack = tree.children(start).iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (Index, &'a SiteNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct Ancestors<'a> {
    tree: &'a SiteTree,
    next: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (Index, &'a SiteNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.next?;
        let node = self.tree.get_node(current_idx)?;
        self.next = self.tree.parent(current_idx);
        Some((current_idx, node))
    }
}
