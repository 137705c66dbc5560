//! Site classification: a status tag per site for the active view.
//!
//! Classification only ever looks at a site and its ancestors, never at
//! siblings or descendants, and is recomputed from scratch on every pass.

use std::collections::HashMap;
use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::SiteTree;
use crate::domain::site::Site;

/// Which status breakdown to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// In sync / blocked / blocked by parent / ready.
    #[default]
    BlockTypes,
    /// SOW issuance and tech data delivery; all blocking collapses to one bucket.
    SowAndTech,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::BlockTypes => "Block Types",
            ViewMode::SowAndTech => "SOW Issuance & Tech Data",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Predicate deciding whether an ancestor holds back the sites below it.
///
/// Two revisions of the rollout tooling disagreed here; `Doability` is the
/// canonical one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockingRule {
    /// Ancestor blocks while it is not locally doable.
    #[default]
    Doability,
    /// Ancestor blocks while its IP/MPLS sync is not done.
    SyncCompletion,
}

impl BlockingRule {
    fn holds_back(&self, ancestor: &Site) -> bool {
        match self {
            BlockingRule::Doability => !ancestor.local_site_doability,
            BlockingRule::SyncCompletion => !ancestor.ipmpls_sync_done,
        }
    }
}

/// Status tag assigned to a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Classification {
    Blocked,
    InSync,
    BlockedByParent,
    Ready,
    SowAndTechComplete,
    SowIssuedNoTechData,
    PendingSowIssuance,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Blocked => "Blocked",
            Classification::InSync => "In Sync",
            Classification::BlockedByParent => "Blocked by Parent",
            Classification::Ready => "Ready",
            Classification::SowAndTechComplete => "SOW Issued & Tech Data Provided",
            Classification::SowIssuedNoTechData => "SOW Issued, Tech Data Not Provided",
            Classification::PendingSowIssuance => "Pending SOW Issuance",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// True when some ancestor holds `idx` back over a trunk-type link.
///
/// Walks `(current, parent)` pairs upward starting at `idx`. A pair blocks
/// when the parent is IPMPLS, fails `rule`, and either side of the pair uses
/// a trunk-type sync solution. The timing source never blocks.
pub fn is_blocked_by_parent(tree: &SiteTree, idx: Index, rule: BlockingRule) -> bool {
    let mut lineage = tree.ancestors(idx).peekable();
    while let Some((_, current)) = lineage.next() {
        let Some((_, parent)) = lineage.peek() else {
            break;
        };
        let parent = &parent.site;
        if rule.holds_back(parent)
            && parent.is_ipmpls()
            && (current.site.has_trunk_link() || parent.has_trunk_link())
        {
            return true;
        }
    }
    false
}

/// Classifies sites of one tree for a fixed view and blocking rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classifier {
    pub view: ViewMode,
    pub rule: BlockingRule,
}

impl Classifier {
    pub fn new(view: ViewMode) -> Self {
        Self {
            view,
            rule: BlockingRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: BlockingRule) -> Self {
        self.rule = rule;
        self
    }

    /// Tag for a single site. None only for indices outside the tree or the timing source.
    pub fn classify(&self, tree: &SiteTree, idx: Index) -> Option<Classification> {
        if tree.is_root(idx) {
            return None;
        }
        let site = tree.site(idx)?;
        let blocked_by_parent = || is_blocked_by_parent(tree, idx, self.rule);

        let tag = match self.view {
            ViewMode::BlockTypes => {
                if !site.local_site_doability {
                    Classification::Blocked
                } else if site.ipmpls_sync_done {
                    // completed work wins over a structural blockage
                    Classification::InSync
                } else if blocked_by_parent() {
                    Classification::BlockedByParent
                } else {
                    Classification::Ready
                }
            }
            ViewMode::SowAndTech => {
                if !site.local_site_doability || blocked_by_parent() {
                    Classification::Blocked
                } else if site.scope_of_work && site.tech_data_provided {
                    Classification::SowAndTechComplete
                } else if site.scope_of_work {
                    Classification::SowIssuedNoTechData
                } else {
                    Classification::PendingSowIssuance
                }
            }
        };
        Some(tag)
    }

    /// Tag every site of the tree, in pre-order.
    #[instrument(level = "debug", skip(self, tree), fields(view = ?self.view, rule = ?self.rule))]
    pub fn classify_tree(&self, tree: &SiteTree) -> Classifications {
        let mut classifications = Classifications::default();
        for (idx, _) in tree.iter() {
            if let Some(tag) = self.classify(tree, idx) {
                classifications.insert(idx, tag);
            }
        }
        debug!("classified {} sites", classifications.len());
        classifications
    }
}

/// Side map from site index to its tag. Iteration follows tree pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classifications {
    order: Vec<(Index, Classification)>,
    positions: HashMap<Index, usize>,
}

impl Classifications {
    fn insert(&mut self, idx: Index, tag: Classification) {
        self.positions.insert(idx, self.order.len());
        self.order.push((idx, tag));
    }

    pub fn get(&self, idx: Index) -> Option<Classification> {
        self.positions.get(&idx).map(|&pos| self.order[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Index, Classification)> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of sites carrying `tag`.
    pub fn count(&self, tag: Classification) -> usize {
        self.order.iter().filter(|(_, t)| *t == tag).count()
    }
}
