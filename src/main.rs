use anyhow::Context;
use clap::{Parser, Subcommand};
use sigbench::export::{self, ExportFormat};
use sigbench::render::{self, BarChart};
use sigbench::{AnalysisConfig, CriterionLayout, MatrixBuilder, Phase, Protocol, ResultMatrix, ScaleConfig, TimeUnit};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Aggregate and plot threshold-signature benchmark results", long_about = None)]
struct Cli {
    /// TOML file with root, unit, output_dir and scales.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Results root holding one `<t>-out-of-<n>` directory per scale.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Display unit: ns, us, ms or s.
    #[arg(long, global = true)]
    unit: Option<TimeUnit>,

    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the median table.
    Summary,
    /// Write the result matrix as JSON or CSV.
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Grouped bar chart of medians across every scale.
    Bars {
        #[arg(long, value_delimiter = ',', default_values = ["initiation", "signing", "aggregation", "verify"])]
        phases: Vec<Phase>,
        #[arg(long)]
        annotate: bool,
        #[arg(long, default_value = "Computation Time per Phase")]
        title: String,
        #[arg(long, default_value = "phases.svg")]
        file: String,
    },
    /// Box plot of every phase at one scale (microseconds unless --unit is given).
    Boxplot {
        #[arg(long)]
        threshold: u32,
        #[arg(long)]
        system_size: u32,
        #[arg(long)]
        file: Option<String>,
    },
    /// ROAST versus multisig QC latency in the consensus runs.
    Latency {
        #[arg(long, default_value = "qc_latency.svg")]
        file: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(unit) = cli.unit {
        config.unit = unit;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn builder(config: &AnalysisConfig) -> MatrixBuilder<CriterionLayout> {
    MatrixBuilder::new(config.layout())
        .unit(config.unit)
        .scales(config.scales.iter().copied())
}

fn print_summary(matrix: &ResultMatrix) {
    let header: Vec<String> = matrix.scales().iter().map(ToString::to_string).collect();
    println!("{:<24} {}", format!("median ({})", matrix.unit()), fmt_row(&header));
    for (protocol, phase) in matrix.series_keys(&Phase::ALL) {
        let Some(values) = matrix.row(protocol, phase) else {
            continue;
        };
        let cells: Vec<String> = values
            .iter()
            .map(|v| v.map_or_else(|| "-".to_string(), sigbench::format_sig_figs))
            .collect();
        println!("{:<24} {}", format!("{} {}", protocol.label(), phase.label()), fmt_row(&cells));
    }
    println!("{} cells, {} missing", matrix.len(), matrix.missing());
}

fn fmt_row(cells: &[String]) -> String {
    cells.iter().map(|c| format!("{c:>11}")).collect::<String>()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli).context("invalid configuration")?;
    info!(root = %config.root.display(), unit = %config.unit, scales = config.scales.len(), "loaded configuration");

    match &cli.command {
        Command::Summary => {
            let matrix = builder(&config).build();
            print_summary(&matrix);
        }
        Command::Export { format, out } => {
            let matrix = builder(&config).build();
            match out {
                Some(path) => export::export_to_path(&matrix, *format, path)
                    .with_context(|| format!("failed to export to {}", path.display()))?,
                None => match format {
                    ExportFormat::Json => export::write_json(&matrix, io::stdout().lock())?,
                    ExportFormat::Csv => export::write_csv(&matrix, io::stdout().lock())?,
                },
            }
        }
        Command::Bars {
            phases,
            annotate,
            title,
            file,
        } => {
            let matrix = builder(&config).phases(phases.iter().copied()).build();
            let chart = BarChart {
                title,
                phases,
                y_desc: "Computation Time",
                annotate: *annotate,
            };
            let path = config.output_dir.join(file);
            render::render_grouped_bars(&matrix, &chart, &path)
                .with_context(|| format!("failed to render {}", path.display()))?;
        }
        Command::Boxplot {
            threshold,
            system_size,
            file,
        } => {
            let scale = ScaleConfig::new(*threshold, *system_size)?;
            let unit = cli.unit.unwrap_or(TimeUnit::Microseconds);
            let distributions = builder(&config)
                .unit(unit)
                .phases(Phase::SIGNATURE)
                .distributions(scale);
            let title = format!("Benchmark Performance for (t={threshold} out of n={system_size}) System");
            let file = file
                .clone()
                .unwrap_or_else(|| format!("{}.svg", scale.dir_name()));
            let path = config.output_dir.join(file);
            render::render_distributions(&distributions, &title, &path)
                .with_context(|| format!("failed to render {}", path.display()))?;
        }
        Command::Latency { file } => {
            let matrix = builder(&config)
                .protocols([Protocol::Roast, Protocol::Multisig])
                .phases([Phase::ViewLatency])
                .build();
            let chart = BarChart {
                title: "HotStuff QC Latency",
                phases: &[Phase::ViewLatency],
                y_desc: "QC Latency",
                annotate: true,
            };
            let path = config.output_dir.join(file);
            render::render_grouped_bars(&matrix, &chart, &path)
                .with_context(|| format!("failed to render {}", path.display()))?;
        }
    }
    Ok(())
}
