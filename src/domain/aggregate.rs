//! Tree-wide rollup counts.
//!
//! One pass over every site. Both views' buckets are filled in the same
//! pass so either report can be produced from one record.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::SiteTree;
use crate::domain::classify::{is_blocked_by_parent, BlockingRule, Classification, ViewMode};

/// Rollup counts for one evaluation of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCounts {
    /// Sites whose IP/MPLS sync is done, any domain.
    pub in_sync_count: usize,
    /// Sites with at least one child on a trunk-type link.
    pub all_root_sites_count: usize,
    pub all_root_sites_names: Vec<String>,
    /// Locally blocked IPMPLS root sites.
    pub blocked_root_sites_count: usize,
    pub blocked_root_sites_names: Vec<String>,
    /// Locally blocked IPMPLS sites that are not root sites.
    pub blocked_leaves: usize,
    pub blocked_issued_sow: usize,
    pub total_blocked_locally: usize,
    pub total_blocked_sites: usize,
    pub total_affected_by_parent: usize,
    pub ready_by_design: usize,
    /// Ready-by-design sites that are already in sync.
    pub ready_in_sync: usize,
    pub total_sow_and_tech_data: usize,
    pub total_sow_no_tech_data: usize,
    pub total_doable_no_sow: usize,
}

/// One legend/chart row for a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub label: String,
    pub count: usize,
    pub classification: Classification,
}

impl LegendEntry {
    fn new(label: impl Into<String>, count: usize, classification: Classification) -> Self {
        Self {
            label: label.into(),
            count,
            classification,
        }
    }
}

impl AggregateCounts {
    /// Ready sites still waiting for implementation.
    pub fn ready_pending(&self) -> usize {
        self.ready_by_design - self.ready_in_sync
    }

    /// Counts formatted for the given view, in display order.
    ///
    /// The block-types rows are rollup counts, not a partition of the
    /// classifier's tags: "IPMPLS In Sync" counts every synced site of any
    /// domain, and a synced IPMPLS site held back by an ancestor shows up in
    /// both "IPMPLS In Sync" and "Blocked by Parent" although it is tagged
    /// `InSync`.
    pub fn legend(&self, view: ViewMode) -> Vec<LegendEntry> {
        match view {
            ViewMode::BlockTypes => vec![
                LegendEntry::new("IPMPLS In Sync", self.in_sync_count, Classification::InSync),
                LegendEntry::new(
                    "IPMPLS Blocked",
                    self.total_blocked_locally,
                    Classification::Blocked,
                ),
                LegendEntry::new("IPMPLS Ready", self.ready_pending(), Classification::Ready),
                LegendEntry::new(
                    "Blocked by Parent",
                    self.total_affected_by_parent,
                    Classification::BlockedByParent,
                ),
            ],
            ViewMode::SowAndTech => vec![
                LegendEntry::new(
                    "Blocked Sites",
                    self.total_blocked_sites,
                    Classification::Blocked,
                ),
                LegendEntry::new(
                    "SOW Issued, Tech Data Not Provided",
                    self.total_sow_no_tech_data,
                    Classification::SowIssuedNoTechData,
                ),
                LegendEntry::new(
                    "SOW Issued & Tech Data Provided",
                    self.total_sow_and_tech_data,
                    Classification::SowAndTechComplete,
                ),
                LegendEntry::new(
                    "Pending SOW Issuance",
                    self.total_doable_no_sow,
                    Classification::PendingSowIssuance,
                ),
            ],
        }
    }
}

/// Compute the rollup record for the whole tree.
#[instrument(level = "debug", skip(tree), fields(sites = tree.len()))]
pub fn aggregate(tree: &SiteTree, rule: BlockingRule) -> AggregateCounts {
    let mut counts = AggregateCounts::default();

    for (idx, node) in tree.iter() {
        let site = &node.site;

        if site.ipmpls_sync_done {
            counts.in_sync_count += 1;
        }

        let is_root_site = node
            .children
            .iter()
            .filter_map(|&c| tree.site(c))
            .any(|child| child.has_trunk_link());
        if is_root_site {
            counts.all_root_sites_count += 1;
            counts.all_root_sites_names.push(site.name.clone());
        }

        if !site.is_ipmpls() {
            continue;
        }

        if !site.local_site_doability {
            counts.total_blocked_locally += 1;
            counts.total_blocked_sites += 1;
            if is_root_site {
                counts.blocked_root_sites_count += 1;
                counts.blocked_root_sites_names.push(site.name.clone());
            } else {
                counts.blocked_leaves += 1;
            }
            if site.scope_of_work {
                counts.blocked_issued_sow += 1;
            }
        } else if is_blocked_by_parent(tree, idx, rule) {
            counts.total_affected_by_parent += 1;
            counts.total_blocked_sites += 1;
            if site.scope_of_work {
                counts.blocked_issued_sow += 1;
            }
        } else {
            counts.ready_by_design += 1;
            if site.ipmpls_sync_done {
                counts.ready_in_sync += 1;
            }
            match (site.scope_of_work, site.tech_data_provided) {
                (true, true) => counts.total_sow_and_tech_data += 1,
                (true, false) => counts.total_sow_no_tech_data += 1,
                (false, _) => counts.total_doable_no_sow += 1,
            }
        }
    }

    debug!(
        "aggregated: blocked={} affected={} ready={}",
        counts.total_blocked_locally, counts.total_affected_by_parent, counts.ready_by_design
    );
    counts
}
