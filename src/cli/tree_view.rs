//! termtree rendering of an evaluated site tree.

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::application::services::Snapshot;
use crate::cli::output::{marker, paint_classification, sync_link_color};

pub trait TreeNodeConvert {
    /// Render the subtree starting at `start` (inclusive).
    fn to_tree_string(&self, start: Index) -> Tree<String>;
}

impl TreeNodeConvert for Snapshot {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, start: Index) -> Tree<String> {
        let mut tree = Tree::new(node_label(self, start));

        fn build_tree(snapshot: &Snapshot, node_idx: Index, parent_tree: &mut Tree<String>) {
            for &child_idx in snapshot.tree.children(node_idx) {
                let mut child_tree = Tree::new(node_label(snapshot, child_idx));
                build_tree(snapshot, child_idx, &mut child_tree);
                parent_tree.push(child_tree);
            }
        }

        build_tree(self, start, &mut tree);
        tree
    }
}

fn node_label(snapshot: &Snapshot, idx: Index) -> String {
    let Some(site) = snapshot.tree.site(idx) else {
        return String::new();
    };
    if snapshot.tree.is_root(idx) {
        return site.name.bold().to_string();
    }

    let mut label = format!("{} {}", marker(site), site.name);
    if let Some(tag) = snapshot.classifications.get(idx) {
        label.push_str(&format!(" [{}]", paint_classification(tag)));
    }
    if let Some(solution) = &site.sync_solution {
        label.push_str(&format!(
            " {}",
            solution.as_str().color(sync_link_color(Some(solution)))
        ));
    }
    label
}
