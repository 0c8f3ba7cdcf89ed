//! Result files: txt, json and csv

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RsaResult;
use crate::rule::{TechnologyMap, TechnologyMatch};
use crate::scan::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

/// JSON entry; technologies sorted by name
#[derive(Debug, Serialize, Deserialize)]
struct JsonEntry {
    url: String,
    technologies: Vec<TechnologyMatch>,
}

const CSV_HEADER: [&str; 4] = ["URL", "Technology", "Version", "Categories"];
const LIST_SEPARATOR: &str = "; ";

/// `<url> | tech1 (v1, v2) - tech2`
pub fn format_plain(result: &ScanResult) -> String {
    if result.technologies.is_empty() {
        return format!("{} | No technologies detected", result.url);
    }
    let parts: Vec<String> = result.technologies.values().map(ToString::to_string).collect();
    format!("{} | {}", result.url, parts.join(" - "))
}

pub fn write_results(results: &[ScanResult], path: &Path, format: OutputFormat) -> RsaResult<()> {
    let file = File::create(path)?;
    match format {
        OutputFormat::Txt => write_txt(results, file),
        OutputFormat::Json => write_json(results, file),
        OutputFormat::Csv => write_csv(results, file),
    }
}

fn write_txt(results: &[ScanResult], file: File) -> RsaResult<()> {
    let mut writer = BufWriter::new(file);
    for result in results {
        writeln!(writer, "{}", format_plain(result))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(results: &[ScanResult], file: File) -> RsaResult<()> {
    let entries: Vec<JsonEntry> = results
        .iter()
        .map(|result| JsonEntry {
            url: result.url.clone(),
            technologies: result.technologies.values().cloned().collect(),
        })
        .collect();

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &entries)?;
    writer.flush()?;
    Ok(())
}

fn write_csv(results: &[ScanResult], file: File) -> RsaResult<()> {
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CSV_HEADER)?;

    for result in results {
        if result.technologies.is_empty() {
            writer.write_record([result.url.as_str(), "", "", ""])?;
        }
        for tech in result.technologies.values() {
            let versions = tech.versions.join(LIST_SEPARATOR);
            let categories = tech.categories.iter().map(String::as_str).collect::<Vec<_>>().join(LIST_SEPARATOR);
            writer.write_record([result.url.as_str(), tech.name.as_str(), versions.as_str(), categories.as_str()])?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Read a JSON result file back
pub fn read_json(path: &Path) -> RsaResult<Vec<ScanResult>> {
    let reader = BufReader::new(File::open(path)?);
    let entries: Vec<JsonEntry> = serde_json::from_reader(reader)?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            let technologies: TechnologyMap = entry
                .technologies
                .into_iter()
                .map(|tech| (tech.name.clone(), tech))
                .collect();
            ScanResult {
                final_url: entry.url.clone(),
                url: entry.url,
                technologies,
            }
        })
        .collect())
}
