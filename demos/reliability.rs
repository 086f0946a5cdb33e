use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use panelwise::prelude::*;
use polars::prelude::{DataFrame, df};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let table = TimeTable::new(raw_data()?, "day").context("Failed to index raw data")?;
    let chart = reliability_chart()?;

    let panels = chart.panels(&table)?;
    let (width, height) = chart.figure_size(&panels);
    info!(panels = panels.len(), width, height, "Rendering reliability chart");

    for panel in chart.data(&table)? {
        println!(
            "\n--- {} panel {} ---",
            panel.granularity(),
            panel.bounds()
        );
        println!("{}", panel.as_df());

        for label in panel.labels() {
            let rendered = panel
                .values(label)?
                .into_iter()
                .zip(panel.bucket_labels())
                .map(|(value, tick)| {
                    let value = value
                        .map(|v| chart.formatter().format(v))
                        .transpose()?
                        .unwrap_or_else(|| "-".to_string());
                    Ok(format!("{}={value}", tick.replace('\n', " ")))
                })
                .collect::<Result<Vec<_>>>()?;
            println!("{label}: {}", rendered.join("  "));
        }
    }

    println!("\n--- Automatic layout ---");
    for panel in Chart::auto().panels(&table)?.iter() {
        println!("{} x {}", panel.granularity(), panel.window_size());
    }

    Ok(())
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ================================================================================================
// Helper Functions
// ================================================================================================

fn reliability_chart() -> Result<Chart> {
    let columns = ["num_valid", "total_num"];
    let success = SeriesSpec::new(columns, "success", ratio("num_valid", "total_num"))
        .with_annotations(AnnotationStyle::default());
    let target = SeriesSpec::new(["target"], "target", max()).with_style(
        SeriesStyle::default()
            .with_color("tab:red")
            .with_line_style(LineStyle::Dashed),
    );
    let last_year = SeriesSpec::new(columns, "last year", ratio("num_valid", "total_num"))
        .with_offset(CalendarOffset::years(1))
        .with_style(SeriesStyle::default().with_alpha(0.4));

    let chart = Chart::builder()
        .with_title("Request success rate")
        .with_formatter(NumberFormat::pattern("{x:.2%}")?)
        .with_y_limits(0.9, 1.0)
        .with_panel(Panel::daily(vec![success.clone(), target.clone()], 7)?)
        .with_panel(Panel::weekly(vec![success.clone(), target.clone()], 6)?)
        .with_panel(
            Panel::monthly(vec![success, target, last_year], 13)?
                .with_range_columns(["total_num"]),
        )
        .build()?;
    Ok(chart)
}

/// Two years of daily request counts with a weekly error pattern.
fn raw_data() -> Result<DataFrame> {
    let start = NaiveDate::from_ymd_opt(2021, 7, 1).context("Invalid start date")?;
    let end = NaiveDate::from_ymd_opt(2023, 7, 9).context("Invalid end date")?;
    let days = start
        .iter_days()
        .take_while(|d| *d <= end)
        .collect::<Vec<_>>();

    let total = days
        .iter()
        .map(|d| 10_000 + 150 * i64::from(d.ordinal() % 17))
        .collect::<Vec<_>>();
    let errors = days
        .iter()
        .map(|d| 20 + 35 * i64::from(d.weekday().num_days_from_monday()))
        .collect::<Vec<_>>();
    let valid = total
        .iter()
        .zip(&errors)
        .map(|(t, e)| t - e)
        .collect::<Vec<_>>();
    let target = days.iter().map(|_| 0.99).collect::<Vec<_>>();

    let df = df![
        "day" => days,
        "num_valid" => valid,
        "num_errors" => errors,
        "total_num" => total,
        "target" => target,
    ]
    .context("Failed to build raw data")?;

    info!(rows = df.height(), last_day = %end, "Generated raw data");
    Ok(df)
}
