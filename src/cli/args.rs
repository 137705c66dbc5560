//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::ReportKind;
use crate::domain::{BlockingRule, ViewMode};

/// Rollout status of a hierarchical sync network: classification, rollups and reports
#[derive(Parser, Debug)]
#[command(name = "syncmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Site document (.json, .yaml, .toml); defaults to data_file from config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// View mode (default from config)
    #[arg(long, global = true, value_enum)]
    pub view: Option<ViewArg>,

    /// Blocked-by-parent rule (default from config)
    #[arg(long, global = true, value_enum)]
    pub rule: Option<RuleArg>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the classified site hierarchy
    Tree {
        /// Only show the subtree below this site
        #[arg(short, long)]
        site: Option<String>,
    },

    /// Show rollup counts and the legend for the view
    Stats,

    /// List every site with its classification
    Classify {
        /// Only list sites with this classification label (e.g. "Ready")
        #[arg(short = 't', long)]
        tag: Option<String>,
    },

    /// Look up a site by name
    Find {
        /// Site name
        name: String,
    },

    /// Produce a report table
    Report {
        /// Report type
        #[arg(value_enum)]
        kind: ReportKind,
        /// Write the report to this file instead of stdout
        #[arg(long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
    },

    /// Change a site's attributes and show the re-evaluated result (not persisted)
    Update {
        /// Site name
        name: String,
        /// Set local doability
        #[arg(long)]
        doable: Option<bool>,
        /// Set IP/MPLS sync done
        #[arg(long)]
        ipmpls_sync: Option<bool>,
        /// Set DWDM sync done
        #[arg(long)]
        dwdm_sync: Option<bool>,
        /// Set scope of work issued
        #[arg(long)]
        sow: Option<bool>,
        /// Set tech data provided
        #[arg(long)]
        tech_data: Option<bool>,
        /// Rename the site
        #[arg(long)]
        rename: Option<String>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    /// Comma-separated rows, no decoration
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    #[value(name = "blockTypes")]
    BlockTypes,
    #[value(name = "sowAndTech")]
    SowAndTech,
}

impl From<ViewArg> for ViewMode {
    fn from(arg: ViewArg) -> Self {
        match arg {
            ViewArg::BlockTypes => ViewMode::BlockTypes,
            ViewArg::SowAndTech => ViewMode::SowAndTech,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RuleArg {
    Doability,
    #[value(name = "syncCompletion")]
    SyncCompletion,
}

impl From<RuleArg> for BlockingRule {
    fn from(arg: RuleArg) -> Self {
        match arg {
            RuleArg::Doability => BlockingRule::Doability,
            RuleArg::SyncCompletion => BlockingRule::SyncCompletion,
        }
    }
}
