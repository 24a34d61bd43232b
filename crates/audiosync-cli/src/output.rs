//! Report formatting

use audiosync_core::batch::BatchReport;
use audiosync_core::matching::MatchResult;
use std::path::Path;

/// Print a match result as JSON
pub fn print_json_result(result: &MatchResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing result: {}", e),
    }
}

/// Print a whole batch report as JSON
pub fn print_json_report(report: &BatchReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing report: {}", e),
    }
}

/// Print the end-of-run summary table
pub fn print_summary(report: &BatchReport) {
    println!("{}", summary_table(report));
}

fn summary_table(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(78));
    out.push('\n');
    out.push_str("SUMMARY\n");
    out.push_str(&"=".repeat(78));
    out.push('\n');
    out.push_str(&format!(
        "{:<30} {:<24} {:<8} {:<9} {}\n",
        "Video", "Audio Match", "Score", "Offset", "Status"
    ));
    out.push_str(&"-".repeat(78));
    out.push('\n');

    for reference in &report.references {
        let (matched, score, offset) = match &reference.result {
            Some(result) => (
                result
                    .candidate
                    .as_deref()
                    .map(file_name)
                    .unwrap_or_else(|| "NO MATCH".to_string()),
                format!("{:.4}", result.score),
                format!("{:+.2}s", result.offset_seconds),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{:<30} {:<24} {:<8} {:<9} {}\n",
            truncate(&reference.reference, 28),
            truncate(&matched, 22),
            score,
            offset,
            reference.status.as_str()
        ));
    }
    out
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiosync_core::batch::{ReferenceReport, SyncStatus};
    use audiosync_core::matching::{MatchMethod, MatchResult};

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short.wav", 22), "short.wav");
        assert_eq!(
            truncate("a-very-long-recording-name.wav", 22),
            "a-very-long-recording..."
        );
    }

    #[test]
    fn test_summary_table_lists_every_reference() {
        let mut result = MatchResult::no_match("talk.mov", MatchMethod::Transcript);
        result.candidate = Some("/audio/room.wav".to_string());
        result.score = 0.82;
        result.offset_seconds = -3.2;

        let report = BatchReport {
            references: vec![
                ReferenceReport {
                    reference: "talk.mov".to_string(),
                    status: SyncStatus::Synced,
                    result: Some(result),
                    output: None,
                    error: None,
                },
                ReferenceReport {
                    reference: "broken.mov".to_string(),
                    status: SyncStatus::Failed,
                    result: None,
                    output: None,
                    error: Some("file not found".to_string()),
                },
            ],
        };

        let table = summary_table(&report);
        assert!(table.contains("talk.mov"));
        assert!(table.contains("room.wav"));
        assert!(table.contains("0.8200"));
        assert!(table.contains("-3.20s"));
        assert!(table.contains("synced"));
        assert!(table.contains("failed"));
    }
}
