//! Shared CLI definitions for lotedit.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};

/// A displayed column of the inventory table.
/// The internal `carid` is never displayed and so has no variant here.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
pub enum Column {
    /// Model year
    Year,
    /// Make and model name
    Model,
    /// Asking price
    Price,
    /// Odometer reading (the editable column)
    Mileage,
    /// Exterior color
    Color,
    /// Transmission type (AUTO or STANDARD)
    Transmission,
}

impl Column {
    /// Header label for this column
    pub fn label(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Model => "model",
            Self::Price => "price",
            Self::Mileage => "mileage",
            Self::Color => "color",
            Self::Transmission => "transmission",
        }
    }
}

/// Command-line arguments for lotedit
#[derive(Clone, Parser, Debug)]
#[command(
    name = "lotedit",
    version,
    about = "Vehicle inventory table editing in the terminal"
)]
pub struct Args {
    /// Path to a JSON inventory file ({"header": [...], "data": [...]}).
    /// When omitted, a built-in sample inventory is shown.
    #[arg(value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Number of rows per page (overrides config [display] page_size)
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<usize>,

    /// Sort the table by this column on startup
    #[arg(long = "sort", value_enum)]
    pub sort: Option<Column>,

    /// Sort descending instead of ascending (used with --sort)
    #[arg(long = "descending", requires = "sort", action)]
    pub descending: bool,

    /// Write saved edits to this JSON file (overrides config [persistence] output_path).
    /// By default edits are written to the cache directory.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<std::path::PathBuf>,

    /// Write saved edits to the log instead of a file
    #[arg(long = "log-only", conflicts_with = "output", action)]
    pub log_only: bool,

    /// Display row numbers on the left side of the table
    #[arg(long = "row-numbers", action)]
    pub row_numbers: bool,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data (saved edits, logs) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/lotedit/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_values_match_labels() {
        for col in Column::value_variants() {
            let value = col.to_possible_value().unwrap();
            assert_eq!(value.get_name(), col.label());
        }
    }

    #[test]
    fn test_args_parse_sort() {
        let args = Args::parse_from(["lotedit", "--sort", "mileage", "--descending"]);
        assert_eq!(args.sort, Some(Column::Mileage));
        assert!(args.descending);
        assert!(args.path.is_none());
    }

    #[test]
    fn test_log_only_conflicts_with_output() {
        assert!(Args::parse_from(["lotedit", "--log-only"]).log_only);
        assert!(Args::try_parse_from(["lotedit", "--log-only", "--output", "x.json"]).is_err());
    }

    #[test]
    fn test_descending_requires_sort() {
        assert!(Args::try_parse_from(["lotedit", "--descending"]).is_err());
    }

    #[test]
    fn test_markdown_lists_options() {
        let md = render_options_markdown();
        assert!(md.contains("--page-size"));
        assert!(md.contains("[<PATH>]"));
        assert!(!md.contains("--help"));
    }
}
