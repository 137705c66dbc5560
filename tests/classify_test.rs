//! Classification of the sample rollout under both views and both blocking rules

use std::path::Path;

use rstest::{fixture, rstest};
use syncmap::config::Settings;
use syncmap::domain::{
    is_blocked_by_parent, BlockingRule, Classification, Classifier, Site, SiteTree, ViewMode,
};
use syncmap::infrastructure::di::ServiceContainer;

use Classification::*;

#[ctor::ctor]
fn init() {
    syncmap::util::testing::init_test_setup();
}

#[fixture]
fn rollout() -> SiteTree {
    ServiceContainer::new(Settings::default())
        .load_tree(Path::new("tests/resources/rollout.json"))
        .expect("load rollout")
}

fn tag_of(tree: &SiteTree, classifier: &Classifier, name: &str) -> Classification {
    let idx = tree.find_by_name(name).expect("site exists");
    classifier.classify(tree, idx).expect("site classified")
}

// ============================================================
// Block types view
// ============================================================

#[rstest]
#[case("GM-North", InSync)]
#[case("Agg-N1", Blocked)]
#[case("Acc-N1a", BlockedByParent)]
#[case("Acc-N1b", BlockedByParent)]
#[case("Agg-N2", Ready)]
#[case("OLA-South", Ready)]
#[case("Pe-S1", Ready)]
fn given_rollout_when_block_types_then_expected_tag(
    rollout: SiteTree,
    #[case] site: &str,
    #[case] expected: Classification,
) {
    let classifier = Classifier::new(ViewMode::BlockTypes);
    assert_eq!(tag_of(&rollout, &classifier, site), expected);
}

#[rstest]
#[case("GM-North", SowAndTechComplete)]
#[case("Agg-N1", Blocked)]
#[case("Acc-N1a", Blocked)]
#[case("Acc-N1b", Blocked)]
#[case("Agg-N2", SowAndTechComplete)]
#[case("OLA-South", PendingSowIssuance)]
#[case("Pe-S1", PendingSowIssuance)]
fn given_rollout_when_sow_and_tech_then_expected_tag(
    rollout: SiteTree,
    #[case] site: &str,
    #[case] expected: Classification,
) {
    let classifier = Classifier::new(ViewMode::SowAndTech);
    assert_eq!(tag_of(&rollout, &classifier, site), expected);
}

// ============================================================
// Blocking rule
// ============================================================

#[rstest]
fn given_dwdm_parent_when_checking_blockage_then_never_blocks(rollout: SiteTree) {
    let pe = rollout.find_by_name("Pe-S1").unwrap();
    assert!(!is_blocked_by_parent(&rollout, pe, BlockingRule::Doability));
    assert!(!is_blocked_by_parent(&rollout, pe, BlockingRule::SyncCompletion));
}

#[test]
fn given_doable_but_unsynced_parent_when_rules_differ_then_only_sync_completion_blocks() {
    // GPS
    // └── Hub (IPMPLS, doable, not synced)
    //     └── Spoke (In-Band, doable)
    let mut tree = SiteTree::new("GPS");
    let hub = tree
        .insert_site(
            Site::new("Hub")
                .with_domain("IPMPLS")
                .with_solution("Local to GM")
                .doable(true),
            tree.root(),
        )
        .unwrap();
    let spoke = tree
        .insert_site(
            Site::new("Spoke")
                .with_domain("IPMPLS")
                .with_solution("In-Band")
                .doable(true),
            hub,
        )
        .unwrap();

    let doability = Classifier::new(ViewMode::BlockTypes);
    let sync = Classifier::new(ViewMode::BlockTypes).with_rule(BlockingRule::SyncCompletion);

    assert_eq!(doability.classify(&tree, spoke), Some(Ready));
    assert_eq!(sync.classify(&tree, spoke), Some(BlockedByParent));
    assert_eq!(sync.classify(&tree, hub), Some(Ready));
}

// ============================================================
// Properties
// ============================================================

#[rstest]
fn given_rollout_when_classifying_twice_then_identical(
    rollout: SiteTree,
    #[values(ViewMode::BlockTypes, ViewMode::SowAndTech)] view: ViewMode,
) {
    let classifier = Classifier::new(view);
    assert_eq!(classifier.classify_tree(&rollout), classifier.classify_tree(&rollout));
}

#[rstest]
fn given_rollout_when_classifying_then_every_site_tagged_and_root_not(
    rollout: SiteTree,
    #[values(ViewMode::BlockTypes, ViewMode::SowAndTech)] view: ViewMode,
) {
    let classifier = Classifier::new(view);
    let classifications = classifier.classify_tree(&rollout);

    assert_eq!(classifications.len(), rollout.len());
    for (idx, _) in rollout.iter() {
        assert!(classifications.get(idx).is_some());
    }
    assert_eq!(classifications.get(rollout.root()), None);
    assert_eq!(classifier.classify(&rollout, rollout.root()), None);
}

#[rstest]
fn given_sibling_and_child_changes_when_classifying_then_tag_unchanged(rollout: SiteTree) {
    let classifier = Classifier::new(ViewMode::BlockTypes);
    let before = tag_of(&rollout, &classifier, "Acc-N1a");

    let mut changed = rollout.clone();
    for name in ["Acc-N1b", "Agg-N2"] {
        let idx = changed.find_by_name(name).unwrap();
        let site = changed.site_mut(idx).unwrap();
        site.local_site_doability = false;
        site.ipmpls_sync_done = true;
    }

    assert_eq!(tag_of(&changed, &classifier, "Acc-N1a"), before);
}

#[rstest]
fn given_ancestor_becomes_doable_when_classifying_then_descendants_released(rollout: SiteTree) {
    let mut tree = rollout;
    let agg = tree.find_by_name("Agg-N1").unwrap();
    tree.site_mut(agg).unwrap().local_site_doability = true;

    let classifier = Classifier::new(ViewMode::BlockTypes);
    assert_eq!(tag_of(&tree, &classifier, "Agg-N1"), Ready);
    assert_eq!(tag_of(&tree, &classifier, "Acc-N1a"), Ready);
    assert_eq!(tag_of(&tree, &classifier, "Acc-N1b"), Ready);
}

#[rstest]
fn given_block_types_counts_when_summed_then_cover_every_site(rollout: SiteTree) {
    let classifications = Classifier::new(ViewMode::BlockTypes).classify_tree(&rollout);
    let total: usize = [InSync, Blocked, BlockedByParent, Ready]
        .into_iter()
        .map(|tag| classifications.count(tag))
        .sum();
    assert_eq!(total, rollout.len());
    assert_eq!(classifications.count(SowAndTechComplete), 0);
}
