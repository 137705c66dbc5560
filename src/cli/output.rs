//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically. Structured
//! results render as a table (`tabled`), JSON, YAML or plain comma-separated rows.

use colored::{Color, ColoredString, Colorize};
use itertools::Itertools;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::args::OutputFormat;
use crate::cli::{CliError, CliResult};
use crate::domain::{Classification, Site, SiteDomain, SyncSolution};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

// palette

const RED: Color = Color::TrueColor { r: 255, g: 0, b: 0 };
const LIME_GREEN: Color = Color::TrueColor { r: 50, g: 205, b: 50 };
const ROYAL_BLUE: Color = Color::TrueColor { r: 65, g: 105, b: 225 };
const GREEN: Color = Color::TrueColor { r: 0, g: 128, b: 0 };
const LIGHT_GREEN: Color = Color::TrueColor { r: 144, g: 238, b: 144 };
const ORANGE: Color = Color::TrueColor { r: 255, g: 165, b: 0 };
const GRAY: Color = Color::TrueColor { r: 128, g: 128, b: 128 };

pub fn classification_color(tag: Classification) -> Color {
    match tag {
        Classification::Blocked => RED,
        Classification::InSync => LIME_GREEN,
        Classification::BlockedByParent | Classification::Ready => ROYAL_BLUE,
        Classification::SowAndTechComplete => GREEN,
        Classification::SowIssuedNoTechData => LIGHT_GREEN,
        Classification::PendingSowIssuance => ORANGE,
    }
}

/// Link color for the sync solution a site takes timing over.
pub fn sync_link_color(solution: Option<&SyncSolution>) -> Color {
    match solution {
        Some(SyncSolution::LocalToGm) => Color::TrueColor { r: 0, g: 0, b: 0 },
        Some(SyncSolution::DedicatedDf) => GRAY,
        Some(SyncSolution::InBand) => GREEN,
        Some(SyncSolution::LocalToDwdm) => ORANGE,
        _ => Color::TrueColor {
            r: 136,
            g: 136,
            b: 136,
        },
    }
}

/// Marker glyph: triangle for DWDM equipment, square for a grand master clock, dot otherwise.
pub fn marker(site: &Site) -> ColoredString {
    let glyph = match (&site.local_site_domain, &site.sync_solution) {
        (Some(SiteDomain::Dwdm), _) => "▲",
        (Some(SiteDomain::IpMpls), Some(SyncSolution::LocalToGm)) => "■",
        (Some(SiteDomain::IpMpls), Some(SyncSolution::LocalToDwdm)) => "▲",
        _ => return "●".normal(),
    };
    let fill = if site.dwdm_sync_done {
        LIME_GREEN
    } else {
        ROYAL_BLUE
    };
    glyph.color(fill)
}

pub fn paint_classification(tag: Classification) -> ColoredString {
    tag.label().color(classification_color(tag))
}

// render dispatchers

/// Render a list of serializable items in the chosen format.
///
/// `plain` emits one comma-separated line per item via `plain_fn`.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> CliResult<String>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(plain_fn).join("\n")),
    }
}

/// Render a single serializable item; `detail_fn` formats the table view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> CliResult<String>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Header row plus string cells, as produced by reports.
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Comma-separated lines with a header line. Cells holding a comma or quote are quoted.
pub fn render_csv(headers: &[String], rows: &[Vec<String>]) -> String {
    std::iter::once(headers)
        .chain(rows.iter().map(Vec::as_slice))
        .map(|row| row.iter().map(|c| csv_cell(c)).join(","))
        .join("\n")
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json<T: Serialize + ?Sized>(data: &T) -> CliResult<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| CliError::Render {
            format: "json",
            message: e.to_string(),
        })
}

pub fn render_yaml<T: Serialize + ?Sized>(data: &T) -> CliResult<String> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render {
        format: "yaml",
        message: e.to_string(),
    })
}
