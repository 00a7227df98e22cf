//! Results output formatting

use anyhow::{bail, Context, Result};
use genweight_core::producer::EventRecord;
use genweight_core::run::RunReport;
use genweight_core::stats::{CounterTable, TableValue};
use genweight_core::threading::{EventSink, JobReport};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Job results as written to the output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub name: String,
    pub producer: String,
    pub streams: usize,
    /// Master seed of a synthetic source, for replay
    pub seed: Option<u64>,
    pub events_processed: u64,
    pub events_skipped: u64,
    pub events_selected: u64,
    pub runs: Vec<RunReport>,
    /// Counters summed over every run
    pub total: CounterTable,
}

impl JobResults {
    /// Create results from a finished job
    pub fn from_report(
        name: String,
        producer: String,
        streams: usize,
        seed: Option<u64>,
        report: JobReport,
    ) -> Self {
        let sum = |f: fn(&RunReport) -> u64| -> u64 { report.runs.iter().map(f).sum() };
        Self {
            name,
            producer,
            streams,
            seed,
            events_processed: sum(|r| r.events_processed),
            events_skipped: sum(|r| r.events_skipped),
            events_selected: sum(|r| r.events_selected),
            runs: report.runs,
            total: report.total,
        }
    }

    /// Combine result files of separate jobs over the same producer
    pub fn merge(name: String, inputs: &[JobResults]) -> Result<Self> {
        let Some(first) = inputs.first() else {
            bail!("Nothing to merge");
        };
        if let Some(other) = inputs.iter().find(|r| r.producer != first.producer) {
            bail!(
                "Cannot merge results of different producers: '{}' and '{}'",
                first.producer,
                other.producer
            );
        }

        let mut merged = Self {
            name,
            producer: first.producer.clone(),
            streams: 0,
            seed: None,
            events_processed: 0,
            events_skipped: 0,
            events_selected: 0,
            runs: Vec::new(),
            total: CounterTable::new(),
        };
        for input in inputs {
            merged.streams = merged.streams.max(input.streams);
            merged.events_processed += input.events_processed;
            merged.events_skipped += input.events_skipped;
            merged.events_selected += input.events_selected;
            merged.runs.extend(input.runs.iter().cloned());
            merged
                .total
                .merge(&input.total)
                .with_context(|| format!("Failed to merge results of job '{}'", input.name))?;
        }
        Ok(merged)
    }

    /// Print results to stdout in human-readable format
    pub fn print_human(&self) {
        println!("\n{}", "=".repeat(60));
        println!("Generator Weight Summary: {}", self.name);
        println!("{}", "=".repeat(60));
        println!();
        println!("Configuration:");
        println!("  Producer:        {}", self.producer);
        println!("  Streams:         {}", self.streams);
        if let Some(seed) = self.seed {
            println!("  Seed:            {}", seed);
        }
        println!();
        println!("Events:");
        println!("  Processed:       {}", self.events_processed);
        println!("  Without weight:  {}", self.events_skipped);
        println!("  Passed skim:     {}", self.events_selected);
        println!();
        for run in &self.runs {
            println!("Run {}:", run.run);
            print_table(&run.table);
            println!();
        }
        println!("All runs:");
        print_table(&self.total);
        println!();
        println!("{}", "=".repeat(60));
    }

    /// Write results to JSON file
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        println!("Results written to: {}", path.display());
        Ok(())
    }

    /// Read results previously written with [`JobResults::write_json`]
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse results file: {}", path.display()))
    }
}

fn print_table(table: &CounterTable) {
    if table.is_empty() {
        println!("  (no counters)");
        return;
    }
    for entry in table.entries() {
        match entry.value {
            TableValue::Int(v) => println!("  {:<40} {}", entry.name, v),
            TableValue::Float(v) => println!("  {:<40} {:.6}", entry.name, v),
        }
    }
}

/// One line of the per-event output file
#[derive(Debug, Serialize)]
struct EventLine<'a> {
    stream: usize,
    #[serde(rename = "genWeight")]
    gen_weight: f32,
    #[serde(rename = "genModel", skip_serializing_if = "Option::is_none")]
    gen_model: Option<&'a str>,
    selected: bool,
}

/// Writes per-event records as JSON lines, shared by all streams
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create events file: {}", path.display()))?;
        Ok(Self { writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn finish(self) -> Result<()> {
        let mut writer = self
            .writer
            .into_inner()
            .map_err(|_| anyhow::anyhow!("events file lock poisoned"))?;
        writer.flush()?;
        Ok(())
    }
}

impl EventSink for JsonLinesSink {
    fn record(
        &self,
        stream_id: usize,
        record: &EventRecord,
        selected: bool,
    ) -> genweight_core::Result<()> {
        let line = EventLine {
            stream: stream_id,
            gen_weight: record.gen_weight,
            gen_model: record.gen_model.as_deref(),
            selected,
        };
        let json = serde_json::to_string(&line)?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| genweight_core::Error::Worker("events file lock poisoned".to_string()))?;
        writeln!(writer, "{}", json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(count: u64, sumw: f64) -> CounterTable {
        let mut table = CounterTable::new();
        table.add_int("genEventCountPreSkim", "event count", count);
        table.add_float("genEventSumwPreSkim", "sum of gen weights", sumw);
        table
    }

    fn results(name: &str, run: u32, count: u64, sumw: f64) -> JobResults {
        let report = JobReport {
            runs: vec![RunReport {
                run,
                events_processed: count + 1,
                events_skipped: 1,
                events_selected: count / 2,
                table: table(count, sumw),
            }],
            total: table(count, sumw),
        };
        JobResults::from_report(name.to_string(), "gen-weight".to_string(), 2, Some(7), report)
    }

    #[test]
    fn test_from_report_totals() {
        let r = results("a", 1, 10, 9.5);
        assert_eq!(r.events_processed, 11);
        assert_eq!(r.events_skipped, 1);
        assert_eq!(r.events_selected, 5);
        assert_eq!(r.total.int("genEventCountPreSkim"), Some(10));
    }

    #[test]
    fn test_json_roundtrip_via_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let r = results("a", 1, 10, 9.5);
        r.write_json(&path).unwrap();
        assert_eq!(JobResults::read_json(&path).unwrap(), r);
    }

    #[test]
    fn test_merge_sums_tables() {
        let merged =
            JobResults::merge("all".into(), &[results("a", 1, 10, 9.5), results("b", 2, 4, 0.5)])
                .unwrap();
        assert_eq!(merged.runs.len(), 2);
        assert_eq!(merged.events_processed, 16);
        assert_eq!(merged.total.int("genEventCountPreSkim"), Some(14));
        assert_eq!(merged.total.float("genEventSumwPreSkim"), Some(10.0));
    }

    #[test]
    fn test_merge_rejects_mixed_producers() {
        let mut other = results("b", 2, 1, 1.0);
        other.producer = "pre-skim".into();
        assert!(JobResults::merge("all".into(), &[results("a", 1, 1, 1.0), other]).is_err());
        assert!(JobResults::merge("none".into(), &[]).is_err());
    }

    #[test]
    fn test_events_file_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let sink = JsonLinesSink::create(&path).unwrap();
        let record = EventRecord { gen_weight: 1.5, gen_model: Some("GenModel_m".into()) };
        sink.record(3, &record, true).unwrap();
        sink.record(0, &EventRecord { gen_weight: -2.0, gen_model: None }, false).unwrap();
        sink.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> =
            content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["genModel"], "GenModel_m");
        assert_eq!(lines[0]["stream"], 3);
        assert_eq!(lines[1]["genWeight"], -2.0);
        assert!(lines[1].get("genModel").is_none());
    }
}
