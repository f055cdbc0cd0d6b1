use anyhow::{Context, Result};
use autosales::{fetch, report_from_inputs, ChartDescriptor, Config};
use clap::Parser;
use prettytable::{format, Cell, Row, Table};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Print one dashboard report as text tables")]
struct Args {
    /// "Yearly Statistics" or "Recession Period Statistics"
    #[arg(short, long, default_value = "Yearly Statistics")]
    statistics: String,
    #[arg(short, long)]
    year: Option<i32>,
    /// Overrides AUTOSALES_DATA_URL
    #[arg(long)]
    source: Option<String>,
}

fn chart_table(chart: &ChartDescriptor) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);
    table.set_titles(Row::new(vec![
        Cell::new(&chart.x_label).style_spec("bFg"),
        Cell::new(&chart.y_label).style_spec("bFg"),
    ]));
    for p in &chart.points {
        table.add_row(Row::new(vec![
            Cell::new(&p.label),
            Cell::new(&format!("{:.2}", p.value)).style_spec("r"),
        ]));
    }
    table
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(raw) = &args.source {
        config.source = fetch::DataSource::parse(raw)?;
    }

    let client = fetch::build_client(config.fetch_timeout)?;
    let text = fetch::fetch_dataset_text(&client, &config.source, config.retry).await?;
    let table = autosales::SalesTable::from_csv_str(&text)
        .with_context(|| format!("parsing dataset from {}", config.source))?;
    info!(records = table.len(), "dataset loaded");

    let report = report_from_inputs(&table, Some(&args.statistics), args.year)?;
    for chart in report.charts() {
        println!("\n--- {} ({:?}) ---", chart.title, chart.kind);
        if chart.points.is_empty() {
            println!("(no rows)");
            continue;
        }
        chart_table(chart).printstd();
    }

    Ok(())
}
