use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Result of a `ping` run.
#[derive(Debug, Serialize)]
pub struct PingSummary {
    pub round_trips: usize,
    pub payload_size: usize,
    pub handles_per_message: usize,
    pub min_us: u128,
    pub avg_us: u128,
    pub max_us: u128,
    pub total_us: u128,
}

pub fn print_ping(summary: &PingSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROUND TRIPS", "SIZE", "HANDLES", "MIN", "AVG", "MAX"])
                .add_row(vec![
                    summary.round_trips.to_string(),
                    summary.payload_size.to_string(),
                    summary.handles_per_message.to_string(),
                    format!("{}us", summary.min_us),
                    format!("{}us", summary.avg_us),
                    format!("{}us", summary.max_us),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} round trips of {} bytes + {} handles: min={}us avg={}us max={}us total={}us",
                summary.round_trips,
                summary.payload_size,
                summary.handles_per_message,
                summary.min_us,
                summary.avg_us,
                summary.max_us,
                summary.total_us
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_summary_serializes_all_fields() {
        let summary = PingSummary {
            round_trips: 3,
            payload_size: 64,
            handles_per_message: 1,
            min_us: 10,
            avg_us: 20,
            max_us: 30,
            total_us: 60,
        };
        let value = serde_json::to_value(&summary).expect("summary should serialize");
        assert_eq!(value["round_trips"], 3);
        assert_eq!(value["handles_per_message"], 1);
        assert_eq!(value["max_us"], 30);
    }
}
