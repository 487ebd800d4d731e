//! `stats` command: aggregate view of stored listings.

use busdb_db::RouteStatistics;
use rust_decimal::Decimal;

const ROUTES_SHOWN: usize = 10;

/// # Errors
///
/// Returns an error if any of the statistics queries fail.
pub(crate) async fn run_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let stats = busdb_db::route_statistics(pool).await?;
    let routes = busdb_db::list_route_names(pool).await?;
    let bus_types = busdb_db::list_bus_types(pool).await?;

    for line in render_stats(&stats, &routes, &bus_types) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn render_stats(
    stats: &RouteStatistics,
    routes: &[String],
    bus_types: &[String],
) -> Vec<String> {
    let mut lines = vec![
        format!("total buses:   {}", stats.total_buses),
        format!("total routes:  {}", stats.total_routes),
        format!("price:         {}", price_summary(stats)),
        format!("avg rating:    {}", fmt_float(stats.avg_rating)),
        format!("avg seats:     {}", fmt_float(stats.avg_seats)),
    ];

    if !routes.is_empty() {
        lines.push(String::new());
        lines.push("routes:".to_string());
        lines.extend(routes.iter().take(ROUTES_SHOWN).map(|r| format!("  {r}")));
        if routes.len() > ROUTES_SHOWN {
            lines.push(format!("  ... and {} more", routes.len() - ROUTES_SHOWN));
        }
    }

    if !bus_types.is_empty() {
        lines.push(String::new());
        lines.push(format!("bus types: {}", bus_types.join(", ")));
    }

    lines
}

fn price_summary(stats: &RouteStatistics) -> String {
    match (stats.min_price, stats.max_price) {
        (Some(min), Some(max)) => format!(
            "₹{min} - ₹{max} (avg ₹{})",
            stats.avg_price.map_or_else(|| "-".to_string(), fmt_decimal)
        ),
        _ => "-".to_string(),
    }
}

fn fmt_decimal(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

fn fmt_float(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
