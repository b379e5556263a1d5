use std::collections::BTreeSet;
use std::env;
use std::process;
use std::str::FromStr;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use salesdash_pipeline::abc::AbcClass;
use salesdash_pipeline::forecast::Scenario;
use salesdash_pipeline::pipelines::dashboard::{
    DashboardOptions, DashboardPipeline, DashboardReport, ForecastSection,
};
use salesdash_pipeline::time_series::DecompositionStatus;
use salesdash_pipeline::transaction_loader::load_transactions_file;
use salesdash_pipeline::types::{DateRange, FilterSpec, Granularity};

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DashboardJson<'a> {
    generated_at: String,
    source: &'a str,
    records_loaded: usize,
    pipeline_ms: u128,
    filter: &'a FilterSpec,
    options: &'a DashboardOptions,
    report: &'a DashboardReport,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format an amount rounded to whole units with comma thousands separators.
fn format_amount(amount: f64) -> String {
    let digits = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0.0 && digits != "0" {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn print_human(
    report: &DashboardReport,
    options: &DashboardOptions,
    total_records: usize,
    load_ms: u128,
    pipeline_ms: u128,
) {
    let k = &report.kpis;
    println!();
    println!("  {:\u{2550}<64}", "");
    println!("  SALES DASHBOARD \u{00b7} {} of {} records", k.record_count, total_records);
    println!("  {:\u{2550}<64}", "");
    println!();

    println!(
        "  Sales \u{20b9}{}  \u{00b7}  Profit \u{20b9}{} ({:.1}% margin)  \u{00b7}  {} units",
        format_amount(k.total_sales),
        format_amount(k.total_profit),
        k.profit_margin_pct,
        k.total_quantity
    );
    println!(
        "  {} orders  \u{00b7}  AOV \u{20b9}{}  \u{00b7}  fulfilled {:.1}%  returned {:.1}%  cancelled {:.1}%",
        k.distinct_orders,
        format_amount(k.average_order_value),
        k.fulfillment_rate * 100.0,
        k.return_rate * 100.0,
        k.cancellation_rate * 100.0
    );
    if report.kpi_delta.sales_growth_pct != 0.0 {
        println!(
            "  vs. all data: sales {:+.1}%  quantity {:+.1}%  profit {:+.1}%",
            report.kpi_delta.sales_growth_pct,
            report.kpi_delta.quantity_growth_pct,
            report.kpi_delta.profit_growth_pct
        );
    }
    println!();

    println!("  {:\u{2500}<64}", "");
    println!(
        "  ABC tiers: A {} ({:.0}% of revenue) \u{00b7} B {} \u{00b7} C {}",
        report.abc.products_in(AbcClass::A).count(),
        report.abc.revenue_share_pct(AbcClass::A),
        report.abc.products_in(AbcClass::B).count(),
        report.abc.products_in(AbcClass::C).count()
    );
    for (i, p) in report.abc.products.iter().take(options.top_k).enumerate() {
        println!(
            "  {:>2}. {:28} {:>12}  {}  {:>5.1}%  {}",
            i + 1,
            p.product,
            format!("\u{20b9}{}", format_amount(p.revenue)),
            p.class,
            p.cumulative_pct,
            p.recommendation
        );
    }
    println!();

    println!("  {:\u{2500}<64}", "");
    let series = &report.time_series;
    println!("  {} {} buckets", series.buckets.len(), series.granularity);
    match &series.decomposition {
        DecompositionStatus::Available(d) => println!(
            "  seasonal indices ({}): {}",
            d.period,
            d.seasonal_indices
                .iter()
                .map(|s| format!("{:+.0}", s))
                .collect::<Vec<_>>()
                .join(" ")
        ),
        DecompositionStatus::Unavailable { required, actual } => println!(
            "  decomposition unavailable: {} buckets, {} required",
            actual, required
        ),
    }
    let flagged: Vec<_> = report.anomalies.iter().filter(|f| f.is_anomalous).collect();
    println!(
        "  {} anomalies at |z| > {}",
        flagged.len(),
        options.anomaly_threshold
    );
    for f in flagged.iter().take(options.top_k) {
        println!("     {:?}  value {}  z {:+.2}", f.subject, format_amount(f.value), f.z_score);
    }
    println!();

    println!("  {:\u{2500}<64}", "");
    match &report.forecast {
        ForecastSection::Available(f) => {
            let last = f.points.last();
            println!(
                "  Forecast ({}): slope {:+.2}/period, r\u{00b2} {:.2}",
                f.scenario.label(),
                f.slope,
                f.r_squared
            );
            if let Some(p) = last {
                println!("  {} \u{2192} \u{20b9}{}", p.date, format_amount(p.predicted));
            }
        }
        ForecastSection::Unavailable { reason } => println!("  Forecast unavailable: {}", reason),
    }
    let proj = &report.revenue_projection;
    println!(
        "  Revenue \u{20b9}{} \u{2192} \u{20b9}{} ({}\u{20b9}{})",
        format_amount(proj.current),
        format_amount(proj.projected),
        if proj.difference >= 0.0 { "+" } else { "-" },
        format_amount(proj.difference.abs())
    );
    println!();

    println!("  {:\u{2500}<64}", "");
    let top_products: Vec<&str> = report.top_products.iter().map(|d| d.key.as_str()).collect();
    let top_cities: Vec<&str> = report.top_cities.iter().map(|d| d.key.as_str()).collect();
    println!("  Demand leaders: {}", top_products.join(", "));
    println!("  Demand cities:  {}", top_cities.join(", "));
    let returned: Vec<String> = report
        .breakdown
        .top_returned_products
        .iter()
        .map(|r| format!("{} ({})", r.label, r.value))
        .collect();
    if !returned.is_empty() {
        println!("  Most returned:  {}", returned.join(", "));
    }
    let payments: Vec<String> = report
        .breakdown
        .sales_by_payment_method
        .iter()
        .take(3)
        .map(|p| format!("{} {:.0}%", p.label, p.share * 100.0))
        .collect();
    if !payments.is_empty() {
        println!("  Payment mix:    {}", payments.join(", "));
    }
    let day = &report.breakdown.day_type;
    println!(
        "  Avg sale weekday \u{20b9}{} \u{00b7} weekend \u{20b9}{}",
        format_amount(day.weekday_average_sales),
        format_amount(day.weekend_average_sales)
    );
    println!();

    println!(
        "  CSV loaded in {}ms \u{00b7} Pipeline ran in {}ms \u{00b7} Total {}ms",
        load_ms,
        pipeline_ms,
        load_ms + pipeline_ms
    );
    println!();
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn usage() -> ! {
    eprintln!("Usage: salesdash-server <transactions.csv> [options] [--json]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --from YYYY-MM-DD     First order date to include");
    eprintln!("  --to YYYY-MM-DD       Last order date to include");
    eprintln!("  --states a,b          Comma-separated states");
    eprintln!("  --cities a,b          Comma-separated cities");
    eprintln!("  --categories a,b      Comma-separated categories");
    eprintln!("  --granularity G       day or month (default: month)");
    eprintln!("  --threshold Z         Anomaly z-score threshold (default: 2.0)");
    eprintln!("  --horizon N           Forecast days ahead, 7-90 (default: 30)");
    eprintln!("  --price PCT           Scenario price change, -50 to 200");
    eprintln!("  --volume PCT          Scenario volume change, -50 to 200");
    eprintln!("  --top N               Entries per ranking (default: 10)");
    eprintln!("  --json                Output as JSON instead of formatted text");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  salesdash-server orders.csv --cities Pune,Mumbai --granularity day --json");
    process::exit(1);
}

fn flag_value<'a>(args: &'a [String], i: usize) -> &'a str {
    match args.get(i + 1) {
        Some(v) => v.as_str(),
        None => {
            eprintln!("Error: {} requires a value", args[i]);
            process::exit(1);
        }
    }
}

fn parse_or_exit<T: FromStr>(flag: &str, value: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid value '{}' for {}", value, flag);
        process::exit(1);
    })
}

fn parse_date(flag: &str, value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|_| {
        eprintln!("Error: {} expects YYYY-MM-DD, got '{}'", flag, value);
        process::exit(1);
    })
}

fn parse_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }
    let csv_path = &args[1];

    let mut spec = FilterSpec::default();
    let mut options = DashboardOptions::default();
    let mut from: Option<NaiveDate> = None;
    let mut to: Option<NaiveDate> = None;
    let mut scenario = Scenario::identity();
    let mut json_output = false;

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--json" => {
                json_output = true;
                i += 1;
                continue;
            }
            "--help" | "-h" => usage(),
            _ => {}
        }

        let value = flag_value(&args, i);
        match flag {
            "--from" => from = Some(parse_date(flag, value)),
            "--to" => to = Some(parse_date(flag, value)),
            "--states" => spec.states = parse_list(value),
            "--cities" => spec.cities = parse_list(value),
            "--categories" => spec.categories = parse_list(value),
            "--granularity" => {
                options.granularity = Granularity::parse(value).unwrap_or_else(|| {
                    eprintln!("Error: --granularity must be day or month");
                    process::exit(1);
                })
            }
            "--threshold" => options.anomaly_threshold = parse_or_exit(flag, value),
            "--horizon" => options.horizon = parse_or_exit(flag, value),
            "--price" => scenario.price_change_pct = parse_or_exit(flag, value),
            "--volume" => scenario.volume_change_pct = parse_or_exit(flag, value),
            "--top" => options.top_k = parse_or_exit(flag, value),
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 2;
    }
    options.scenario = scenario;
    if from.is_some() || to.is_some() {
        spec.date_range = Some(DateRange::new(
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
        ));
    }

    // Load transactions from CSV
    let load_start = Instant::now();
    let table = match load_transactions_file(csv_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error loading CSV: {}", e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();
    log::info!("transactions loaded: path={} records={} ms={}", csv_path, table.len(), load_ms);

    // Build and run pipeline
    let pipeline_start = Instant::now();
    let pipeline = DashboardPipeline::with_options(options.clone());
    let report = match pipeline.run(&table, &spec) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let pipeline_ms = pipeline_start.elapsed().as_millis();
    log::info!(
        "dashboard complete: records={} anomalies={} ms={}",
        report.kpis.record_count,
        report.anomaly_count(),
        pipeline_ms
    );

    if json_output {
        let out = DashboardJson {
            generated_at: Utc::now().to_rfc3339(),
            source: csv_path,
            records_loaded: table.len(),
            pipeline_ms,
            filter: &spec,
            options: &options,
            report: &report,
        };
        match serde_json::to_string_pretty(&out) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_human(&report, &options, table.len(), load_ms, pipeline_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.4), "999");
        assert_eq!(format_amount(1_000.0), "1,000");
        assert_eq!(format_amount(1_234_567.8), "1,234,568");
        assert_eq!(format_amount(-45_210.0), "-45,210");
    }

    #[test]
    fn small_negatives_round_to_unsigned_zero() {
        assert_eq!(format_amount(-0.3), "0");
        assert_eq!(format_amount(-0.0), "0");
        assert_eq!(format_amount(-0.6), "-1");
    }
}
