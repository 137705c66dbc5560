//! Tree builder: turns nested or flat site documents into a `SiteTree`.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::SiteTree;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::site::Site;

/// Nested tree document: a site with its children inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDocument {
    #[serde(flatten)]
    pub site: Site,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SiteDocument>,
}

/// Flat row: one site plus the name of the site it takes timing from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(flatten)]
    pub site: Site,
    #[serde(
        default,
        alias = "upperSyncSourceSiteName",
        alias = "upper_sync_source_site_name"
    )]
    pub parent: Option<String>,
}

/// Either shape the data source may deliver.
///
/// A document with a top-level `sites` key is flat; anything else is nested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDocument {
    Flat { sites: Vec<SiteRecord> },
    Nested(SiteDocument),
}

impl<'de> Deserialize<'de> for TreeDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut value = serde_json::Value::deserialize(deserializer)?;
        match value.get_mut("sites").map(serde_json::Value::take) {
            Some(sites) => serde_json::from_value(sites)
                .map(|sites| TreeDocument::Flat { sites })
                .map_err(|e| de::Error::custom(format!("sites: {e}"))),
            None => serde_json::from_value(value)
                .map(TreeDocument::Nested)
                .map_err(de::Error::custom),
        }
    }
}

/// What to do when two sites share a name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuplicateNamePolicy {
    /// Refuse to build the tree.
    #[default]
    Reject,
    /// Keep every site; lookups resolve to the first in pre-order.
    FirstMatch,
}

/// Constructs a `SiteTree` below a timing source named `root_name`.
pub struct TreeBuilder {
    root_name: String,
    policy: DuplicateNamePolicy,
    seen_names: HashSet<String>,
}

impl TreeBuilder {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            policy: DuplicateNamePolicy::default(),
            seen_names: HashSet::new(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateNamePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(&mut self, document: &TreeDocument) -> DomainResult<SiteTree> {
        match document {
            TreeDocument::Flat { sites } => self.build_from_records(sites),
            TreeDocument::Nested(doc) => self.build_from_document(doc),
        }
    }

    /// Build from a nested document.
    ///
    /// A top-level document named like the timing source is the timing
    /// source; its children become the top-level sites. Any other top-level
    /// document is itself placed below a synthetic timing source.
    #[instrument(level = "debug", skip(self, document), fields(root = %document.site.name))]
    pub fn build_from_document(&mut self, document: &SiteDocument) -> DomainResult<SiteTree> {
        self.seen_names.clear();
        let mut tree = SiteTree::new(self.root_name.clone());

        let top_level: Vec<&SiteDocument> = if document.site.name == self.root_name {
            document.children.iter().collect()
        } else {
            debug!(
                "top-level document {:?} is not the timing source, attaching it below {:?}",
                document.site.name, self.root_name
            );
            vec![document]
        };

        let mut stack: Vec<(&SiteDocument, Index, usize)> = top_level
            .into_iter()
            .enumerate()
            .rev()
            .map(|(pos, doc)| (doc, tree.root(), pos))
            .collect();

        while let Some((current, parent_idx, position)) = stack.pop() {
            if current.site.name.trim().is_empty() {
                let parent = tree
                    .get_node(parent_idx)
                    .map(|n| n.site.name.clone())
                    .unwrap_or_default();
                return Err(DomainError::EmptyName { parent, position });
            }
            self.register_name(&current.site.name)?;

            let current_idx = tree.insert_site(current.site.clone(), parent_idx)?;

            for (pos, child) in current.children.iter().enumerate().rev() {
                stack.push((child, current_idx, pos));
            }
        }

        debug!("built tree with {} sites", tree.len());
        Ok(tree)
    }

    /// Build from flat records linked by parent name.
    ///
    /// Records without a parent, or whose parent is the timing source, hang
    /// directly below the timing source.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build_from_records(&mut self, records: &[SiteRecord]) -> DomainResult<SiteTree> {
        self.seen_names.clear();

        let mut relationship_cache: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut top_level = Vec::new();
        for (row, record) in records.iter().enumerate() {
            if record.site.name.trim().is_empty() {
                return Err(DomainError::EmptyName {
                    parent: record
                        .parent
                        .clone()
                        .unwrap_or_else(|| self.root_name.clone()),
                    position: row,
                });
            }
            self.register_name(&record.site.name)?;

            match record.parent.as_deref().map(str::trim) {
                None | Some("") => top_level.push(row),
                Some(p) if p == self.root_name => top_level.push(row),
                Some(p) => relationship_cache.entry(p).or_default().push(row),
            }
        }

        for (&parent, rows) in &relationship_cache {
            if !self.seen_names.contains(parent) {
                return Err(DomainError::MissingParentSite {
                    site: records[rows[0]].site.name.clone(),
                    parent: parent.to_string(),
                });
            }
        }

        let mut tree = SiteTree::new(self.root_name.clone());
        let mut visited = vec![false; records.len()];
        let mut expanded: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(usize, Index)> =
            top_level.iter().rev().map(|&row| (row, tree.root())).collect();

        while let Some((row, parent_idx)) = stack.pop() {
            visited[row] = true;
            let record = &records[row];
            let current_idx = tree.insert_site(record.site.clone(), parent_idx)?;

            // duplicate names: only the first site of a name adopts its children
            if !expanded.insert(record.site.name.as_str()) {
                continue;
            }
            if let Some(children) = relationship_cache.get(record.site.name.as_str()) {
                for &child in children.iter().rev() {
                    if !visited[child] {
                        stack.push((child, current_idx));
                    }
                }
            }
        }

        // every parent exists, so unreachable rows can only sit on a cycle
        if let Some(row) = visited.iter().position(|v| !v) {
            return Err(DomainError::CycleDetected(records[row].site.name.clone()));
        }

        debug!("built tree with {} sites", tree.len());
        Ok(tree)
    }

    fn register_name(&mut self, name: &str) -> DomainResult<()> {
        if !self.seen_names.insert(name.to_string())
            && self.policy == DuplicateNamePolicy::Reject
        {
            return Err(DomainError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, children: Vec<SiteDocument>) -> SiteDocument {
        SiteDocument {
            site: Site::new(name),
            children,
        }
    }

    fn record(name: &str, parent: Option<&str>) -> SiteRecord {
        SiteRecord {
            site: Site::new(name),
            parent: parent.map(str::to_string),
        }
    }

    fn names(tree: &SiteTree) -> Vec<String> {
        tree.iter().map(|(_, n)| n.site.name.clone()).collect()
    }

    #[test]
    fn given_nested_document_when_building_then_preserves_child_order() {
        let document = doc(
            "GPS",
            vec![doc("A", vec![doc("A1", vec![]), doc("A2", vec![])]), doc("B", vec![])],
        );
        let tree = TreeBuilder::new("GPS").build_from_document(&document).unwrap();

        assert_eq!(names(&tree), vec!["A", "A1", "A2", "B"]);
        assert_eq!(tree.root_name(), "GPS");
    }

    #[test]
    fn given_document_without_timing_source_when_building_then_attaches_below_root() {
        let document = doc("A", vec![doc("A1", vec![])]);
        let tree = TreeBuilder::new("GPS").build_from_document(&document).unwrap();

        assert_eq!(names(&tree), vec!["A", "A1"]);
        assert_eq!(tree.children(tree.root()).len(), 1);
    }

    #[test]
    fn given_duplicate_names_when_rejecting_then_errors() {
        let document = doc("GPS", vec![doc("A", vec![doc("A", vec![])])]);
        let result = TreeBuilder::new("GPS").build_from_document(&document);
        assert_eq!(result.unwrap_err(), DomainError::DuplicateName("A".into()));
    }

    #[test]
    fn given_duplicate_names_when_first_match_then_keeps_both() {
        let document = doc("GPS", vec![doc("A", vec![]), doc("A", vec![])]);
        let tree = TreeBuilder::new("GPS")
            .with_duplicate_policy(DuplicateNamePolicy::FirstMatch)
            .build_from_document(&document)
            .unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn given_empty_name_when_building_then_errors() {
        let document = doc("GPS", vec![doc("A", vec![doc(" ", vec![])])]);
        let result = TreeBuilder::new("GPS").build_from_document(&document);
        assert!(matches!(result, Err(DomainError::EmptyName { parent, .. }) if parent == "A"));
    }

    #[test]
    fn given_flat_records_when_building_then_links_by_parent_name() {
        let records = vec![
            record("B1", Some("B")),
            record("A", None),
            record("B", Some("GPS")),
            record("A1", Some("A")),
        ];
        let tree = TreeBuilder::new("GPS").build_from_records(&records).unwrap();

        assert_eq!(names(&tree), vec!["A", "A1", "B", "B1"]);
        let b1 = tree.find_by_name("B1").unwrap();
        let b = tree.find_by_name("B").unwrap();
        assert_eq!(tree.parent(b1), Some(b));
    }

    #[test]
    fn given_missing_parent_when_building_records_then_errors() {
        let records = vec![record("A", Some("nowhere"))];
        let result = TreeBuilder::new("GPS").build_from_records(&records);
        assert_eq!(
            result.unwrap_err(),
            DomainError::MissingParentSite {
                site: "A".into(),
                parent: "nowhere".into()
            }
        );
    }

    #[test]
    fn given_cycle_when_building_records_then_errors() {
        let records = vec![
            record("top", None),
            record("a", Some("b")),
            record("b", Some("a")),
        ];
        let result = TreeBuilder::new("GPS").build_from_records(&records);
        assert!(matches!(result, Err(DomainError::CycleDetected(_))));
    }

    #[test]
    fn given_untagged_json_when_parsing_then_detects_shape() {
        let flat: TreeDocument =
            serde_json::from_str(r#"{"sites": [{"name": "A"}, {"name": "B", "parent": "A"}]}"#)
                .unwrap();
        assert!(matches!(flat, TreeDocument::Flat { ref sites } if sites.len() == 2));

        let nested: TreeDocument =
            serde_json::from_str(r#"{"name": "GPS", "children": [{"name": "A"}]}"#).unwrap();
        assert!(matches!(nested, TreeDocument::Nested(ref d) if d.children.len() == 1));
    }
}
