use crate::{cli::OutputFormat, error::Result};
use clipfetch::{DownloadResult, SavedDownload};
#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use std::io::Write;

/// Outcome of one line of a batch file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub input: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Ok(SavedDownload),
    Error { kind: &'static str, message: String },
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_download(&self, result: &DownloadResult, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_summary(
                &result.filename,
                &result.size_label,
                result.source.as_ref(),
                result.watermark_removed,
                None,
            )),
            OutputFormat::Json => to_json(&result.to_response(), true),
            OutputFormat::JsonCompact => to_json(&result.to_response(), false),
        }
    }

    pub fn format_saved(&self, saved: &SavedDownload, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Pretty => Ok(self.format_summary(
                &saved.filename,
                &saved.size_label,
                saved.source.as_ref(),
                saved.watermark_removed,
                Some(&saved.path.display().to_string()),
            )),
            OutputFormat::Json => to_json(saved, true),
            OutputFormat::JsonCompact => to_json(saved, false),
        }
    }

    pub fn format_batch(&self, entries: &[BatchEntry], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => to_json(&entries, true),
            OutputFormat::JsonCompact => to_json(&entries, false),
            OutputFormat::Pretty => {
                let mut output = String::new();
                for entry in entries {
                    match &entry.outcome {
                        BatchOutcome::Ok(saved) => output.push_str(&format!(
                            "{} {} -> {} ({}, {})\n",
                            self.colorize("✓", &Color::Green, true),
                            entry.input,
                            self.colorize(&saved.path.display().to_string(), &Color::Blue, false),
                            saved.size_label,
                            saved.source,
                        )),
                        BatchOutcome::Error { message, .. } => output.push_str(&format!(
                            "{} {}: {}\n",
                            self.colorize("✗", &Color::Red, true),
                            entry.input,
                            message,
                        )),
                    }
                }
                let failed = failed_count(entries);
                output.push_str(&format!(
                    "\n{}: {} ok, {} failed\n",
                    self.colorize("Summary", &Color::Yellow, true),
                    entries.len() - failed,
                    failed,
                ));
                Ok(output)
            }
        }
    }

    fn format_summary(
        &self,
        filename: &str,
        size: &str,
        source: &str,
        watermark_removed: bool,
        path: Option<&str>,
    ) -> String {
        let mut output = String::new();
        output.push_str(&self.colorize("Download complete:", &Color::Green, true));
        output.push('\n');

        let mut field = |name: &str, value: &str, color: Color| {
            output.push_str(&format!(
                "  {}: {}\n",
                self.colorize(name, &Color::Yellow, false),
                self.colorize(value, &color, false)
            ));
        };
        field("Filename", filename, Color::Cyan);
        field("Size", size, Color::Cyan);
        field("Source", source, Color::Cyan);
        field(
            "Watermark removed",
            if watermark_removed { "yes" } else { "no" },
            Color::Cyan,
        );
        if let Some(path) = path {
            field("Saved to", path, Color::Blue);
        }
        output
    }

    fn colorize(&self, text: &str, color: &Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                    Color::Red => text.red(),
                };
                if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                }
            } else {
                text.to_string()
            }
        }

        #[cfg(not(feature = "colored-output"))]
        {
            let _ = (color, bold, self.colored);
            text.to_string()
        }
    }
}

enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
    Red,
}

pub fn failed_count(entries: &[BatchEntry]) -> usize {
    entries
        .iter()
        .filter(|e| matches!(e.outcome, BatchOutcome::Error { .. }))
        .count()
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    json.push('\n');
    Ok(json)
}

pub fn write_output(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
