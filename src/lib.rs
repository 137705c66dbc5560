//! syncmap: rollout status of a hierarchical network-synchronization tree
//!
//! Sites hang below a timing source and inherit timing over sync links.
//! The crate classifies every site for a view, rolls the tree up into
//! counts and produces reports.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
