//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, instrument};

use crate::application::services::{EvaluationService, Snapshot};
use crate::application::{Report, ReportKind};
use crate::cli::args::{Cli, Commands, ConfigCommands, OutputFormat};
use crate::cli::output::{self, classification_color, paint_classification};
use crate::cli::tree_view::TreeNodeConvert;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::dependency::{
    dependencies_of, grand_master_of, sites_without_sow_above, upper_source_of,
};
use crate::domain::{
    AggregateCounts, Classification, LegendEntry, Site, SiteDependencies, SitePatch, ViewMode,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `syncmap --help`".into(),
        ));
    };

    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(command),
        _ => {
            let container = ServiceContainer::new(load_settings(cli)?);
            let path = container.resolve_data_file(cli.file.as_deref())?;
            let mut service = container.evaluation_service(&path)?;
            execute_evaluation(cli.output, command, &container, &mut service)
        }
    }
}

fn current_dir() -> CliResult<PathBuf> {
    std::env::current_dir()
        .map_err(|e| InfraError::io("determine working directory", e).into())
}

/// Layered settings with command line overrides on top.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let cwd = current_dir()?;
    let mut settings = Settings::load(Some(&cwd))?;
    if let Some(view) = cli.view {
        settings.view = view.into();
    }
    if let Some(rule) = cli.rule {
        settings.blocking_rule = rule.into();
    }
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

fn execute_evaluation(
    format: OutputFormat,
    command: &Commands,
    container: &ServiceContainer,
    service: &mut EvaluationService,
) -> CliResult<()> {
    match command {
        Commands::Tree { site } => cmd_tree(&service.current(), site.as_deref()),
        Commands::Stats => cmd_stats(format, &service.current()),
        Commands::Classify { tag } => cmd_classify(format, &service.current(), tag.as_deref()),
        Commands::Find { name } => cmd_find(format, &service.current(), name),
        Commands::Report { kind, out } => {
            cmd_report(format, service, container, *kind, out.as_deref())
        }
        Commands::Update {
            name,
            doable,
            ipmpls_sync,
            dwdm_sync,
            sow,
            tech_data,
            rename,
        } => {
            let patch = SitePatch {
                name: rename.clone(),
                local_site_doability: *doable,
                ipmpls_sync_done: *ipmpls_sync,
                dwdm_sync_done: *dwdm_sync,
                scope_of_work: *sow,
                tech_data_provided: *tech_data,
            };
            cmd_update(format, service, name, &patch)
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

#[instrument(skip(snapshot))]
fn cmd_tree(snapshot: &Snapshot, site: Option<&str>) -> CliResult<()> {
    let start = match site {
        Some(name) => snapshot
            .find(name)
            .ok_or_else(|| CliError::InvalidArgs(format!("site not found: {name}")))?,
        None => snapshot.tree.root(),
    };
    output::header(&format!("View: {}", snapshot.view));
    output::info(&snapshot.to_tree_string(start));
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput<'a> {
    view: ViewMode,
    legend: Vec<LegendEntry>,
    counts: &'a AggregateCounts,
}

#[derive(Tabled)]
struct LegendRow {
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Count")]
    count: usize,
}

fn cmd_stats(format: OutputFormat, snapshot: &Snapshot) -> CliResult<()> {
    let stats = StatsOutput {
        view: snapshot.view,
        legend: snapshot.legend(),
        counts: &snapshot.counts,
    };
    let rendered = match format {
        OutputFormat::Table => {
            let rows: Vec<LegendRow> = stats
                .legend
                .iter()
                .map(|e| LegendRow {
                    status: e
                        .label
                        .color(classification_color(e.classification))
                        .to_string(),
                    count: e.count,
                })
                .collect();
            let counts = &snapshot.counts;
            format!(
                "{}\n{}\nroot sites: {} (blocked: {})\nblocked leaves: {}\nblocked with SOW issued: {}",
                snapshot.view,
                tabled::Table::new(rows).with(tabled::settings::Style::rounded()),
                counts.all_root_sites_count,
                counts.blocked_root_sites_count,
                counts.blocked_leaves,
                counts.blocked_issued_sow,
            )
        }
        OutputFormat::Json => output::render_json(&stats)?,
        OutputFormat::Yaml => output::render_yaml(&stats)?,
        OutputFormat::Plain => stats
            .legend
            .iter()
            .map(|e| format!("{},{}", e.label, e.count))
            .join("\n"),
    };
    output::info(&rendered);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteStatus {
    name: String,
    domain: String,
    sync_solution: String,
    classification: Classification,
}

#[derive(Tabled)]
struct SiteStatusRow {
    #[tabled(rename = "Site")]
    name: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Sync Solution")]
    sync_solution: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn site_status(site: &Site, classification: Classification) -> SiteStatus {
    SiteStatus {
        name: site.name.clone(),
        domain: site
            .local_site_domain
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default(),
        sync_solution: site
            .sync_solution
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_default(),
        classification,
    }
}

fn cmd_classify(format: OutputFormat, snapshot: &Snapshot, tag: Option<&str>) -> CliResult<()> {
    let statuses: Vec<SiteStatus> = snapshot
        .classifications
        .iter()
        .filter(|(_, c)| tag.map_or(true, |t| c.label().eq_ignore_ascii_case(t)))
        .filter_map(|(idx, c)| snapshot.tree.site(idx).map(|site| site_status(site, c)))
        .collect();

    let rendered = output::render_list(
        format,
        &statuses,
        |s| SiteStatusRow {
            name: s.name.clone(),
            domain: s.domain.clone(),
            sync_solution: s.sync_solution.clone(),
            status: paint_classification(s.classification).to_string(),
        },
        |s| format!("{},{}", s.name, s.classification),
    )?;
    output::info(&rendered);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteDetail<'a> {
    site: &'a Site,
    classification: Option<Classification>,
    upper_source: Option<&'a str>,
    grand_master: Option<&'a str>,
    dependencies: Option<SiteDependencies>,
    sites_without_sow_above: Vec<String>,
}

fn cmd_find(format: OutputFormat, snapshot: &Snapshot, name: &str) -> CliResult<()> {
    let Some(idx) = snapshot.find(name) else {
        output::warning(&format!("site not found: {name}"));
        return Ok(());
    };
    let Some(site) = snapshot.tree.site(idx) else {
        return Ok(());
    };
    let detail = SiteDetail {
        site,
        classification: snapshot.classifications.get(idx),
        upper_source: upper_source_of(&snapshot.tree, idx),
        grand_master: grand_master_of(&snapshot.tree, idx),
        dependencies: dependencies_of(&snapshot.tree, idx),
        sites_without_sow_above: sites_without_sow_above(&snapshot.tree, idx),
    };

    let rendered = output::render_single(
        format,
        &detail,
        |d| {
            let flag = |b: bool| if b { "yes" } else { "no" };
            let mut lines = vec![
                format!("site:            {}", d.site.name),
                format!(
                    "status:          {}",
                    d.classification
                        .map(|c| paint_classification(c).to_string())
                        .unwrap_or_default()
                ),
                format!(
                    "domain:          {}",
                    d.site
                        .local_site_domain
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                ),
                format!(
                    "sync solution:   {}",
                    d.site
                        .sync_solution
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                ),
                format!("upper source:    {}", d.upper_source.unwrap_or_default()),
                format!("grand master:    {}", d.grand_master.unwrap_or_default()),
                format!("doable:          {}", flag(d.site.local_site_doability)),
                format!("IPMPLS in sync:  {}", flag(d.site.ipmpls_sync_done)),
                format!("DWDM in sync:    {}", flag(d.site.dwdm_sync_done)),
                format!("SOW issued:      {}", flag(d.site.scope_of_work)),
                format!("tech data:       {}", flag(d.site.tech_data_provided)),
            ];
            if let Some(deps) = &d.dependencies {
                lines.push(format!(
                    "DWDM dependency: {}",
                    deps.dwdm.as_deref().unwrap_or("-")
                ));
                lines.push(format!(
                    "IPMPLS dependency: {}",
                    deps.ipmpls.as_deref().unwrap_or("-")
                ));
            }
            if !d.sites_without_sow_above.is_empty() {
                lines.push(format!(
                    "no SOW above:    {}",
                    d.sites_without_sow_above.join(", ")
                ));
            }
            lines.join("\n")
        },
        |d| {
            format!(
                "{},{}",
                d.site.name,
                d.classification.map(|c| c.label()).unwrap_or_default()
            )
        },
    )?;
    output::info(&rendered);
    Ok(())
}

fn render_report(format: OutputFormat, report: &Report) -> CliResult<String> {
    match format {
        OutputFormat::Table => Ok(output::render_grid(&report.headers, &report.rows)),
        OutputFormat::Json => output::render_json(report),
        OutputFormat::Yaml => output::render_yaml(report),
        OutputFormat::Plain => Ok(output::render_csv(&report.headers, &report.rows)),
    }
}

#[instrument(skip(service, container))]
fn cmd_report(
    format: OutputFormat,
    service: &EvaluationService,
    container: &ServiceContainer,
    kind: ReportKind,
    out: Option<&Path>,
) -> CliResult<()> {
    let report = service.report(kind);
    debug!("report {} has {} rows", kind, report.rows.len());

    match out {
        Some(path) => {
            // files get machine-readable output even when a table is requested
            let format = match format {
                OutputFormat::Table => OutputFormat::Plain,
                other => other,
            };
            let content = render_report(format, &report)?;
            container
                .fs
                .write(path, &content)
                .map_err(|e| InfraError::io(format!("write report {}", path.display()), e))?;
            output::action("Wrote", &path.display());
        }
        None => {
            if report.is_empty() && format == OutputFormat::Table {
                output::warning(&format!("report {kind} has no rows"));
            }
            output::info(&render_report(format, &report)?);
        }
    }
    Ok(())
}

fn cmd_update(
    format: OutputFormat,
    service: &mut EvaluationService,
    name: &str,
    patch: &SitePatch,
) -> CliResult<()> {
    if patch.is_empty() {
        return Err(CliError::InvalidArgs(
            "nothing to update, pass at least one attribute flag".into(),
        ));
    }
    let snapshot = service.update_site(name, patch)?;
    let current_name = patch.name.as_deref().unwrap_or(name);

    if format == OutputFormat::Table {
        output::success(&format!("updated {current_name} (in memory only)"));
        if let Some(tag) = snapshot.classification_of(current_name) {
            output::detail(&format!("status: {}", paint_classification(tag)));
        }
    }
    cmd_stats(format, &snapshot)
}

fn execute_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&current_dir()?))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".into());
            output::header("Config files");
            output::detail(&format!("global: {global}"));
            output::detail(&format!(
                "local:  {}",
                local_config_path(&current_dir()?).display()
            ));
        }
    }
    Ok(())
}
