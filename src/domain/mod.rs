//! Domain layer: site hierarchy and rollout status logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod aggregate;
pub mod arena;
pub mod builder;
pub mod classify;
pub mod dependency;
pub mod error;
pub mod site;

pub use aggregate::{aggregate, AggregateCounts, LegendEntry};
pub use arena::{SiteNode, SiteTree};
pub use builder::{DuplicateNamePolicy, SiteDocument, SiteRecord, TreeBuilder, TreeDocument};
pub use classify::{
    is_blocked_by_parent, BlockingRule, Classification, Classifications, Classifier, ViewMode,
};
pub use dependency::SiteDependencies;
pub use error::{DomainError, DomainResult};
pub use site::{Site, SiteDomain, SitePatch, SyncSolution};
