//! Output formatting: console rendering and CSV reporting

use std::fs::File;
use std::path::Path;

use chrono::SecondsFormat;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::types::{BatchResult, QueryOutcome};

/// CSV column order, fixed by the output contract
const CSV_HEADER: [&str; 4] = ["plate_number", "status", "message", "timestamp"];

pub fn print_outcome(output_format: OutputFormat, outcome: &QueryOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(outcome)?;
        println!("{}", content);
    } else {
        println!("\nSearch Result");
        println!("=============");
        println!("Plate:   {}", outcome.plate);
        println!("Status:  {}", outcome.status.label());
        println!("Message: {}", outcome.message);
    }

    Ok(())
}

pub fn print_batch(output_format: OutputFormat, result: &BatchResult) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&result.outcomes)?;
        println!("{}", content);
        return Ok(());
    }

    let summary = result.summary();
    println!("\nBatch Summary");
    println!("=============");
    println!("Total checked: {}", summary.total());
    println!("Available:     {}", summary.available);
    println!("Unavailable:   {}", summary.unavailable);
    println!("Unknown:       {}", summary.unknown);
    println!("Errors:        {}", summary.error);

    if summary.available > 0 {
        println!("\nAvailable plates:");
        for outcome in &result.outcomes {
            if outcome.status == crate::types::PlateStatus::Available {
                println!("  - {}", outcome.plate);
            }
        }
    }

    if result.interrupted {
        println!("\nRun was interrupted; results above are partial.");
    }

    Ok(())
}

/// Incremental CSV writer: header on creation, one flushed row per outcome,
/// so an interrupted run leaves every finalized row on disk.
pub struct CsvReporter {
    writer: csv::Writer<File>,
}

impl CsvReporter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, outcome: &QueryOutcome) -> Result<()> {
        let status = outcome.status.to_string();
        let timestamp = outcome.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.writer.write_record([
            outcome.plate.as_str(),
            status.as_str(),
            outcome.message.as_str(),
            timestamp.as_str(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlateStatus;
    use chrono::DateTime;

    #[test]
    fn csv_has_header_and_one_row_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let mut reporter = CsvReporter::create(&path).unwrap();
        reporter
            .write(&QueryOutcome::new(
                "ABC123",
                PlateStatus::Available,
                "Congratulations!",
            ))
            .unwrap();
        reporter
            .write(&QueryOutcome::new(
                "DEF456",
                PlateStatus::Unavailable,
                "NOT available, sorry",
            ))
            .unwrap();
        drop(reporter);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)
            .unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(CSV_HEADER.to_vec())
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "ABC123");
        assert_eq!(&rows[0][1], "available");
        assert_eq!(&rows[1][0], "DEF456");
        assert_eq!(&rows[1][1], "unavailable");
        assert_eq!(&rows[1][2], "NOT available, sorry");

        // timestamps must parse back as RFC 3339
        for row in &rows {
            DateTime::parse_from_rfc3339(&row[3]).unwrap();
        }
    }

    #[test]
    fn csv_rows_survive_without_explicit_finish() {
        // rows are flushed as they are written, not on drop
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.csv");

        let mut reporter = CsvReporter::create(&path).unwrap();
        reporter
            .write(&QueryOutcome::new("ABC123", PlateStatus::Unknown, "odd"))
            .unwrap();

        // read while the reporter is still alive
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("plate_number,status,message,timestamp"));
        assert!(content.contains("ABC123,unknown,odd,"));
        drop(reporter);
    }

    #[test]
    fn messages_with_commas_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");

        let mut reporter = CsvReporter::create(&path).unwrap();
        reporter
            .write(&QueryOutcome::new(
                "ABC123",
                PlateStatus::Unknown,
                "odd, very odd",
            ))
            .unwrap();
        drop(reporter);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[2], "odd, very odd");
    }
}
