//! Evaluation service
//!
//! Owns the site tree and publishes every evaluation as an immutable
//! snapshot. Updates work on a copy of the tree and swap the published
//! snapshot once the copy is fully re-evaluated.

use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, info, instrument};

use crate::application::report::{Report, ReportKind};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    aggregate, AggregateCounts, BlockingRule, Classification, Classifications, Classifier,
    DomainError, DuplicateNamePolicy, LegendEntry, Site, SitePatch, SiteTree, ViewMode,
};

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: SiteTree,
    pub view: ViewMode,
    pub rule: BlockingRule,
    pub classifications: Classifications,
    pub counts: AggregateCounts,
}

impl Snapshot {
    /// Classify and aggregate `tree` for `view`.
    pub fn evaluate(tree: SiteTree, view: ViewMode, rule: BlockingRule) -> Self {
        let classifications = Classifier::new(view).with_rule(rule).classify_tree(&tree);
        let counts = aggregate(&tree, rule);
        Self {
            tree,
            view,
            rule,
            classifications,
            counts,
        }
    }

    pub fn find(&self, name: &str) -> Option<Index> {
        self.tree.find_by_name(name)
    }

    pub fn site(&self, name: &str) -> Option<&Site> {
        self.find(name).and_then(|idx| self.tree.site(idx))
    }

    pub fn classification_of(&self, name: &str) -> Option<Classification> {
        self.find(name).and_then(|idx| self.classifications.get(idx))
    }

    /// Legend rows for the snapshot's view.
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.counts.legend(self.view)
    }
}

/// Service holding the current evaluation of a site tree.
pub struct EvaluationService {
    current: Arc<Snapshot>,
    policy: DuplicateNamePolicy,
}

impl EvaluationService {
    /// Create the service and run the initial evaluation.
    pub fn new(tree: SiteTree, view: ViewMode, rule: BlockingRule) -> Self {
        Self {
            current: Arc::new(Snapshot::evaluate(tree, view, rule)),
            policy: DuplicateNamePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateNamePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The published snapshot. Holders keep a consistent view across later updates.
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// Re-evaluate the current tree for `view`.
    #[instrument(level = "debug", skip(self))]
    pub fn evaluate(&mut self, view: ViewMode) -> Arc<Snapshot> {
        let tree = self.current.tree.clone();
        self.publish(Snapshot::evaluate(tree, view, self.current.rule))
    }

    pub fn find(&self, name: &str) -> Option<Index> {
        self.current.find(name)
    }

    /// Apply `patch` to the site named `name` and re-evaluate the whole tree.
    #[instrument(level = "debug", skip(self, patch))]
    pub fn update_site(&mut self, name: &str, patch: &SitePatch) -> ApplicationResult<Arc<Snapshot>> {
        let idx = self
            .find(name)
            .ok_or_else(|| ApplicationError::SiteNotFound(name.to_string()))?;

        if let Some(new_name) = patch.name.as_deref().filter(|n| *n != name) {
            self.check_rename(idx, new_name)?;
        }

        let mut tree = self.current.tree.clone();
        let site = tree
            .site_mut(idx)
            .ok_or_else(|| ApplicationError::SiteNotFound(name.to_string()))?;
        patch.apply(site);
        info!("updated site {}", name);

        let (view, rule) = (self.current.view, self.current.rule);
        Ok(self.publish(Snapshot::evaluate(tree, view, rule)))
    }

    fn check_rename(&self, idx: Index, new_name: &str) -> ApplicationResult<()> {
        let tree = &self.current.tree;
        if new_name.trim().is_empty() {
            let parent_idx = tree.get_node(idx).and_then(|n| n.parent);
            let parent = parent_idx
                .and_then(|p| tree.site(p))
                .map(|s| s.name.clone())
                .unwrap_or_default();
            let position = parent_idx
                .and_then(|p| tree.children(p).iter().position(|&c| c == idx))
                .unwrap_or_default();
            return Err(DomainError::EmptyName { parent, position }.into());
        }
        if self.policy == DuplicateNamePolicy::Reject && tree.find_by_name(new_name).is_some() {
            return Err(DomainError::DuplicateName(new_name.to_string()).into());
        }
        Ok(())
    }

    pub fn report(&self, kind: ReportKind) -> Report {
        Report::build(kind, &self.current)
    }

    fn publish(&mut self, snapshot: Snapshot) -> Arc<Snapshot> {
        debug!(
            "publishing snapshot: view={:?} sites={}",
            snapshot.view,
            snapshot.tree.len()
        );
        self.current = Arc::new(snapshot);
        self.current()
    }
}
