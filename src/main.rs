use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sales_matrix::parse_encoding;
use sales_matrix::InferenceOptions;
use sales_matrix::LoadOptions;
use sales_matrix::PipelineOptions;
use sales_matrix::Selection;
use sales_matrix::Session;
use sales_matrix::ViewMode;
use std::path::PathBuf;
use std::process::ExitCode;

/// Classifies agency records by feature adoption and engagement and prints
/// the chart data as JSON.
#[derive(Parser, Debug)]
#[command(name = "sales-matrix", version, about)]
struct Cli {
    /// Spreadsheet (.xlsx) or delimited text file to load
    file: PathBuf,

    /// Glob pattern selecting the worksheet (default: first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Field separator for delimited text
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Fallback encoding, as a label (windows-1252) or code page (1252)
    #[arg(long)]
    encoding: Option<String>,

    /// Treat columns without values as feature columns
    #[arg(long)]
    include_empty_columns: bool,

    /// Chart to render: quadrant or heatmap
    #[arg(long, value_parser = str::parse::<ViewMode>, default_value = "quadrant")]
    view: ViewMode,

    /// Show only these groups (repeatable)
    #[arg(long = "group")]
    groups: Vec<String>,

    /// Show only these agencies (repeatable)
    #[arg(long = "agency")]
    agencies: Vec<String>,

    /// Leave out the quadrant zones
    #[arg(long)]
    hide_zones: bool,

    /// Show details of the record at this 0-based row
    #[arg(long, conflicts_with = "select")]
    select_row: Option<usize>,

    /// Show details of the first visible record with this agency
    #[arg(long)]
    select: Option<String>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

impl Cli {
    fn pipeline_options(&self) -> Result<PipelineOptions> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter '{}' is not an ASCII character", self.delimiter);
        }
        let mut load = LoadOptions {
            sheet: self.sheet.to_owned(),
            delimiter: self.delimiter as u8,
            ..LoadOptions::default()
        };
        if let Some(label) = &self.encoding {
            load.fallback_encoding = parse_encoding(label)
                .with_context(|| format!("Unknown encoding '{label}'"))?;
        }

        Ok(PipelineOptions {
            load,
            inference: InferenceOptions {
                include_empty_columns: self.include_empty_columns,
            },
            ..PipelineOptions::default()
        })
    }

    fn selection(&self) -> Option<Selection> {
        match (&self.select_row, &self.select) {
            (Some(row), _) => Some(Selection::Row(*row)),
            (None, Some(label)) => Some(Selection::Label(label.to_owned())),
            (None, None) => None,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("Cannot read '{}'", cli.file.display()))?;
    let file_name = cli.file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut session = Session::new(cli.pipeline_options()?);
    session.upload(&bytes, file_name.as_deref())?;
    if !cli.groups.is_empty() {
        session.set_groups(cli.groups.to_owned());
    }
    session.set_agencies(cli.agencies.to_owned());
    session.set_view(cli.view);
    session.set_show_zones(!cli.hide_zones);
    session.select(cli.selection());

    let rendering = session.render().context("Nothing to render")?;
    let json = if cli.compact {
        serde_json::to_string(&rendering)?
    } else {
        serde_json::to_string_pretty(&rendering)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_flag_uses_view_mode_parsing() {
        let cli = Cli::try_parse_from(["sales-matrix", "agencies.csv"]).unwrap();
        assert_eq!(cli.view, ViewMode::Quadrant);

        let cli = Cli::try_parse_from(["sales-matrix", "agencies.csv", "--view", "Heatmap"]).unwrap();
        assert_eq!(cli.view, ViewMode::Heatmap);

        let error = Cli::try_parse_from(["sales-matrix", "agencies.csv", "--view", "pie"]).unwrap_err();
        assert!(error.to_string().contains("unknown view mode 'pie'"));
    }

    #[test]
    fn selection_flags_conflict() {
        let cli = Cli::try_parse_from(["sales-matrix", "a.csv", "--select-row", "2"]).unwrap();
        assert_eq!(cli.selection(), Some(Selection::Row(2)));
        assert!(Cli::try_parse_from(["sales-matrix", "a.csv", "--select-row", "2", "--select", "Acme"]).is_err());
    }
}
