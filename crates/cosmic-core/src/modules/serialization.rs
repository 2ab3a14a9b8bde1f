use super::sweep::{GridSample, SampleOutcome, SweepSummary};
use crate::common::constants::CSV_HEADER;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl OutputFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::JsonLines => "jsonl",
        }
    }
}

/// Renders `value` like the invariant-culture `E6` format: six mantissa
/// decimals and a signed exponent of at least three digits (`6.915817E-002`).
pub fn format_scientific_e6(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let formatted = format!("{value:.6E}");
    let Some((mantissa, exponent)) = formatted.split_once('E') else {
        return formatted;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}E{sign}{digits:0>3}")
}

/// One CSV row without the line terminator.
///
/// Failed cells carry `Error: <message>` in both probability columns; commas
/// and line breaks in the message are replaced so the row keeps four fields.
pub fn format_csv_row(sample: &GridSample) -> String {
    match &sample.outcome {
        SampleOutcome::Estimate(estimate) => format!(
            "{:.4},{:.4},{},{}",
            sample.omega,
            sample.r,
            format_scientific_e6(estimate.quantum),
            format_scientific_e6(estimate.classical)
        ),
        SampleOutcome::Failed(message) => {
            let cell: String = message
                .chars()
                .map(|character| match character {
                    ',' => ';',
                    '\r' | '\n' => ' ',
                    other => other,
                })
                .collect();
            format!(
                "{:.4},{:.4},Error: {cell},Error: {cell}",
                sample.omega, sample.r
            )
        }
    }
}

pub fn write_csv<W, I>(writer: &mut W, samples: I) -> io::Result<SweepSummary>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = GridSample>,
{
    let mut summary = SweepSummary::default();
    writeln!(writer, "{CSV_HEADER}")?;
    for sample in samples {
        writeln!(writer, "{}", format_csv_row(&sample))?;
        summary.record(&sample);
    }
    writer.flush()?;
    debug!(rows = summary.cells, "csv records written");
    Ok(summary)
}

#[derive(Serialize)]
#[serde(untagged)]
enum JsonRecord<'a> {
    Estimate {
        omega: f64,
        r: f64,
        pq: f64,
        pc: f64,
    },
    Failed {
        omega: f64,
        r: f64,
        error: &'a str,
    },
}

impl<'a> From<&'a GridSample> for JsonRecord<'a> {
    fn from(sample: &'a GridSample) -> Self {
        match &sample.outcome {
            SampleOutcome::Estimate(estimate) => Self::Estimate {
                omega: sample.omega,
                r: sample.r,
                pq: estimate.quantum,
                pc: estimate.classical,
            },
            SampleOutcome::Failed(message) => Self::Failed {
                omega: sample.omega,
                r: sample.r,
                error: message,
            },
        }
    }
}

pub fn write_json_lines<W, I>(writer: &mut W, samples: I) -> io::Result<SweepSummary>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = GridSample>,
{
    let mut summary = SweepSummary::default();
    for sample in samples {
        serde_json::to_writer(&mut *writer, &JsonRecord::from(&sample))?;
        writer.write_all(b"\n")?;
        summary.record(&sample);
    }
    writer.flush()?;
    debug!(rows = summary.cells, "json records written");
    Ok(summary)
}

pub fn write_records<W, I>(
    format: OutputFormat,
    writer: &mut W,
    samples: I,
) -> io::Result<SweepSummary>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = GridSample>,
{
    match format {
        OutputFormat::Csv => write_csv(writer, samples),
        OutputFormat::JsonLines => write_json_lines(writer, samples),
    }
}
