//! Tabular reports over an evaluated tree.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::application::services::Snapshot;
use crate::domain::classify::{is_blocked_by_parent, ViewMode};
use crate::domain::dependency::{
    dependencies_of, grand_master_of, has_in_band_lineage, sites_without_sow_above,
    upper_source_of,
};

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    /// Every IPMPLS site with the DWDM and IPMPLS work it waits on
    #[value(name = "blockedByParent")]
    BlockedByParent,
    /// Region, sync solution, upstream source and grand master per IPMPLS site
    #[value(name = "masterSheet")]
    MasterSheet,
    /// Sites blocked by a parent although their SOW is issued
    #[value(name = "sowIssuedBlockedParent")]
    SowIssuedBlockedParent,
    /// Ready sites with no in-band link anywhere in their lineage
    #[value(name = "noBlockageNoInBand")]
    NoBlockageNoInBand,
    /// Legend counts of both views
    #[value(name = "summary")]
    Summary,
}

impl ReportKind {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ReportKind::BlockedByParent => &["Site", "DWDM Dependency", "IPMPLS Dependency"],
            ReportKind::MasterSheet => &[
                "Region",
                "Site",
                "Sync Solution",
                "Upper Sync Source",
                "Grand Master",
            ],
            ReportKind::SowIssuedBlockedParent => &["Site", "Sync Solution", "No SOW Above"],
            ReportKind::NoBlockageNoInBand => &["Site", "Sync Solution", "Grand Master"],
            ReportKind::Summary => &["View", "Status", "Count"],
        }
    }

    /// File-friendly name, e.g. `blockedByParent_report`.
    pub fn file_stem(&self) -> String {
        format!("{self}_report")
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::BlockedByParent => "blockedByParent",
            ReportKind::MasterSheet => "masterSheet",
            ReportKind::SowIssuedBlockedParent => "sowIssuedBlockedParent",
            ReportKind::NoBlockageNoInBand => "noBlockageNoInBand",
            ReportKind::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// A rendered report: header row plus string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

impl Report {
    /// Build the report of `kind` from an evaluated snapshot. Rows follow tree pre-order.
    #[instrument(level = "debug", skip(snapshot))]
    pub fn build(kind: ReportKind, snapshot: &Snapshot) -> Self {
        let tree = &snapshot.tree;
        let rule = snapshot.rule;
        let ipmpls = || tree.iter().filter(|(_, n)| n.site.is_ipmpls());

        let rows: Vec<Vec<String>> = match kind {
            ReportKind::BlockedByParent => ipmpls()
                .filter_map(|(idx, _)| dependencies_of(tree, idx))
                .map(|deps| {
                    vec![
                        deps.site,
                        cell(deps.dwdm.as_deref()),
                        cell(deps.ipmpls.as_deref()),
                    ]
                })
                .collect(),
            ReportKind::MasterSheet => ipmpls()
                .map(|(idx, node)| {
                    vec![
                        cell(node.site.region.as_deref()),
                        node.site.name.clone(),
                        cell(node.site.sync_solution.as_ref().map(|s| s.as_str())),
                        cell(upper_source_of(tree, idx)),
                        cell(grand_master_of(tree, idx)),
                    ]
                })
                .collect(),
            ReportKind::SowIssuedBlockedParent => ipmpls()
                .filter(|(idx, node)| {
                    node.site.local_site_doability
                        && node.site.scope_of_work
                        && is_blocked_by_parent(tree, *idx, rule)
                })
                .map(|(idx, node)| {
                    vec![
                        node.site.name.clone(),
                        cell(node.site.sync_solution.as_ref().map(|s| s.as_str())),
                        sites_without_sow_above(tree, idx).join(", "),
                    ]
                })
                .collect(),
            ReportKind::NoBlockageNoInBand => ipmpls()
                .filter(|(idx, node)| {
                    node.site.local_site_doability
                        && !is_blocked_by_parent(tree, *idx, rule)
                        && !has_in_band_lineage(tree, *idx)
                })
                .map(|(idx, node)| {
                    vec![
                        node.site.name.clone(),
                        cell(node.site.sync_solution.as_ref().map(|s| s.as_str())),
                        cell(grand_master_of(tree, idx)),
                    ]
                })
                .collect(),
            ReportKind::Summary => [ViewMode::BlockTypes, ViewMode::SowAndTech]
                .into_iter()
                .flat_map(|view| {
                    snapshot.counts.legend(view).into_iter().map(move |entry| {
                        vec![view.to_string(), entry.label, entry.count.to_string()]
                    })
                })
                .collect(),
        };

        Self {
            kind,
            headers: kind.headers().iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
