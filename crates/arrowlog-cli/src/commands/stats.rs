use arrowlog_core::services::ArcheryService;
use arrowlog_core::stats::LifetimeStats;

use crate::error::CliError;

pub async fn run_stats(as_json: bool, service: &ArcheryService) -> Result<(), CliError> {
    let stats = service.stats().await;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        for line in format_stats_lines(&stats) {
            println!("{line}");
        }
    }

    Ok(())
}

pub fn format_stats_lines(stats: &LifetimeStats) -> Vec<String> {
    vec![
        format!("Sessions       {}", stats.session_count),
        format!("Arrows         {}", stats.arrow_count),
        format!("Total points   {}", stats.total_points),
        format!("Avg per arrow  {:.2}", stats.avg_per_arrow),
        format!("Avg per end    {:.2}", stats.avg_per_end),
    ]
}
