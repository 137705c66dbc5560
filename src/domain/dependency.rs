//! Upstream dependency analysis: which sites a site waits on.

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::domain::arena::SiteTree;
use crate::domain::site::{Site, SiteDomain, SyncSolution};

/// Upstream work an IPMPLS site depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteDependencies {
    pub site: String,
    /// `<site>_DWDM` work item the site waits on, if any.
    pub dwdm: Option<String>,
    /// `<site>_IPMPLS` work item the site waits on, if any.
    pub ipmpls: Option<String>,
}

fn ipmpls_trunk(site: &Site) -> bool {
    site.is_ipmpls() && site.has_trunk_link()
}

/// True when the site or an ancestor sits on an IPMPLS trunk-type link.
pub fn has_dependency_on_parent(tree: &SiteTree, idx: Index) -> bool {
    tree.ancestors(idx).any(|(current_idx, current)| {
        ipmpls_trunk(&current.site)
            || tree
                .parent(current_idx)
                .and_then(|p| tree.site(p))
                .is_some_and(ipmpls_trunk)
    })
}

/// DWDM and IPMPLS work items an IPMPLS site waits on. None for other domains.
pub fn dependencies_of(tree: &SiteTree, idx: Index) -> Option<SiteDependencies> {
    let site = tree.site(idx)?;
    if !site.is_ipmpls() || tree.is_root(idx) {
        return None;
    }

    let mut deps = SiteDependencies {
        site: site.name.clone(),
        dwdm: None,
        ipmpls: None,
    };

    if !has_dependency_on_parent(tree, idx) {
        if site.has_local_link() {
            deps.dwdm = Some(format!("{}_DWDM", site.name));
        }
        return Some(deps);
    }

    let parent = tree.parent(idx).and_then(|p| tree.site(p));
    if site.has_local_link() {
        deps.dwdm = Some(format!("{}_DWDM", site.name));
    } else if site.solution_is(&SyncSolution::DedicatedDf) {
        if let Some(parent) = parent.filter(|p| p.local_site_domain == Some(SiteDomain::Dwdm)) {
            deps.dwdm = Some(format!("{}_DWDM", parent.name));
        }
    }

    let mut lineage = tree.ancestors(idx).peekable();
    while let Some((_, current)) = lineage.next() {
        let Some((_, parent)) = lineage.peek() else {
            break;
        };
        let parent = &parent.site;
        if parent.is_ipmpls() && (current.site.has_trunk_link() || parent.has_trunk_link()) {
            deps.ipmpls = Some(format!("{}_IPMPLS", parent.name));
            break;
        }
    }

    Some(deps)
}

/// Names of IPMPLS ancestors with no scope of work issued, nearest first.
pub fn sites_without_sow_above(tree: &SiteTree, idx: Index) -> Vec<String> {
    tree.ancestors(idx)
        .skip(1)
        .filter(|(_, n)| n.site.is_ipmpls() && !n.site.scope_of_work)
        .map(|(_, n)| n.site.name.clone())
        .collect()
}

/// True when the site or any ancestor takes timing in-band.
pub fn has_in_band_lineage(tree: &SiteTree, idx: Index) -> bool {
    tree.ancestors(idx)
        .any(|(_, n)| n.site.solution_is(&SyncSolution::InBand))
}

/// Topmost site above `idx` (the grand master site of its subtree).
pub fn grand_master_of(tree: &SiteTree, idx: Index) -> Option<&str> {
    tree.ancestors(idx).last().map(|(_, n)| n.site.name.as_str())
}

/// Name of the site `idx` takes timing from; the timing source for top-level sites.
pub fn upper_source_of(tree: &SiteTree, idx: Index) -> Option<&str> {
    let node = tree.get_node(idx)?;
    let parent = node.parent?;
    tree.site(parent).map(|s| s.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    // GPS
    // └── GM (IPMPLS, Local to GM, no SOW)
    //     └── Agg (IPMPLS, Dedicated DF, SOW)
    //         └── Access (IPMPLS, In-Band)
    // └── Optical (DWDM, Local to GM)
    //     └── Pe (IPMPLS, Dedicated DF)
    fn sample() -> SiteTree {
        let mut tree = SiteTree::new("GPS");
        let root = tree.root();
        let gm = tree
            .insert_site(
                Site::new("GM").with_domain("IPMPLS").with_solution("Local to GM"),
                root,
            )
            .unwrap();
        let agg = tree
            .insert_site(
                Site::new("Agg")
                    .with_domain("IPMPLS")
                    .with_solution("Dedicated DF")
                    .with_sow(true, false),
                gm,
            )
            .unwrap();
        tree.insert_site(
            Site::new("Access").with_domain("IPMPLS").with_solution("In-Band"),
            agg,
        )
        .unwrap();
        let optical = tree
            .insert_site(
                Site::new("Optical").with_domain("DWDM").with_solution("Local to GM"),
                root,
            )
            .unwrap();
        tree.insert_site(
            Site::new("Pe").with_domain("IPMPLS").with_solution("Dedicated DF"),
            optical,
        )
        .unwrap();
        tree
    }

    fn idx(tree: &SiteTree, name: &str) -> Index {
        tree.find_by_name(name).unwrap()
    }

    #[test]
    fn given_gm_site_when_listing_dependencies_then_only_own_dwdm() {
        let tree = sample();
        let deps = dependencies_of(&tree, idx(&tree, "GM")).unwrap();
        assert_eq!(deps.dwdm.as_deref(), Some("GM_DWDM"));
        assert_eq!(deps.ipmpls, None);
    }

    #[test]
    fn given_trunk_chain_when_listing_dependencies_then_nearest_ipmpls_parent() {
        let tree = sample();
        let access = dependencies_of(&tree, idx(&tree, "Access")).unwrap();
        assert_eq!(access.ipmpls.as_deref(), Some("Agg_IPMPLS"));
        assert_eq!(access.dwdm, None);

        let agg = dependencies_of(&tree, idx(&tree, "Agg")).unwrap();
        assert_eq!(agg.ipmpls.as_deref(), Some("GM_IPMPLS"));
    }

    #[test]
    fn given_df_off_dwdm_parent_when_listing_dependencies_then_parent_dwdm() {
        let tree = sample();
        let pe = dependencies_of(&tree, idx(&tree, "Pe")).unwrap();
        assert_eq!(pe.dwdm.as_deref(), Some("Optical_DWDM"));
        assert_eq!(pe.ipmpls, None);
    }

    #[test]
    fn given_dwdm_site_when_listing_dependencies_then_none() {
        let tree = sample();
        assert!(dependencies_of(&tree, idx(&tree, "Optical")).is_none());
    }

    #[test]
    fn given_lineage_when_querying_then_sow_gaps_and_in_band_found() {
        let tree = sample();
        let access = idx(&tree, "Access");
        assert_eq!(sites_without_sow_above(&tree, access), vec!["GM"]);
        assert!(has_in_band_lineage(&tree, access));
        assert!(!has_in_band_lineage(&tree, idx(&tree, "Agg")));
        assert_eq!(grand_master_of(&tree, access), Some("GM"));
        assert_eq!(upper_source_of(&tree, access), Some("Agg"));
        assert_eq!(upper_source_of(&tree, idx(&tree, "GM")), Some("GPS"));
    }
}
