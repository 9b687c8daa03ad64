//! CSV encoding of entry collections.
//!
//! The backing file and the export download share one encoder, so an export
//! is always byte-identical to what the store writes for the same data.
//!
//! Column order is `date,weight,dose,nausea,fatigue,gi,sleep,notes,id`.
//! Files written before ids existed have no `id` column. Those rows get an id
//! derived from their line number and contents, so repeated reads of the same
//! file agree on it until the next save writes the ids out.

use crate::{Entry, EntryCollection, EntryId, Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Header row of the backing file
pub const HEADER: [&str; 9] = [
    "date", "weight", "dose", "nausea", "fatigue", "gi", "sleep", "notes", "id",
];

const REQUIRED_COLUMNS: [&str; 7] = ["date", "weight", "dose", "nausea", "fatigue", "gi", "sleep"];

/// A row as written to CSV
#[derive(Debug, Serialize)]
struct CsvRowOut<'a> {
    date: String,
    weight: f64,
    dose: f64,
    nausea: u8,
    fatigue: u8,
    gi: u8,
    sleep: u8,
    notes: Option<&'a str>,
    id: String,
}

impl<'a> From<&'a Entry> for CsvRowOut<'a> {
    fn from(entry: &'a Entry) -> Self {
        CsvRowOut {
            date: entry.date.format("%Y-%m-%d").to_string(),
            weight: entry.weight,
            dose: entry.dose,
            nausea: entry.nausea,
            fatigue: entry.fatigue,
            gi: entry.gi,
            sleep: entry.sleep,
            notes: entry.notes.as_deref(),
            id: entry.id.to_string(),
        }
    }
}

/// A row as read from CSV. Everything stays text until `into_entry` so a
/// bad value is reported with its column name and line.
#[derive(Debug, Deserialize)]
struct CsvRowIn {
    date: String,
    weight: String,
    dose: String,
    nausea: String,
    fatigue: String,
    gi: String,
    sleep: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl CsvRowIn {
    fn into_entry(self, line: u64, legacy_id: impl FnOnce() -> EntryId) -> Result<Entry> {
        let id = match self.id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<EntryId>()
                .map_err(|_| Error::parse(line, format!("invalid id '{}'", raw)))?,
            _ => legacy_id(),
        };

        Ok(Entry {
            id,
            date: parse_date(&self.date, line)?,
            weight: parse_decimal("weight", &self.weight, line)?,
            dose: parse_decimal("dose", &self.dose, line)?,
            nausea: parse_severity("nausea", &self.nausea, line)?,
            fatigue: parse_severity("fatigue", &self.fatigue, line)?,
            gi: parse_severity("gi", &self.gi, line)?,
            sleep: parse_severity("sleep", &self.sleep, line)?,
            notes: crate::types::normalize_notes(self.notes),
        })
    }
}

fn parse_date(raw: &str, line: u64) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    // Timestamps at midnight show up when another tool rewrote the file
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }

    Err(Error::parse(line, format!("invalid date '{}'", raw)))
}

fn parse_decimal(column: &str, raw: &str, line: u64) -> Result<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::parse(line, format!("missing {}", column)));
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::parse(line, format!("{} is not a number: '{}'", column, raw)))
}

fn parse_severity(column: &str, raw: &str, line: u64) -> Result<u8> {
    let value = parse_decimal(column, raw, line)?;
    if value.fract() != 0.0 {
        return Err(Error::parse(
            line,
            format!("{} is not a whole number: '{}'", column, raw.trim()),
        ));
    }
    if !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(Error::parse(
            line,
            format!("{} is out of range: '{}'", column, raw.trim()),
        ));
    }
    Ok(value as u8)
}

fn check_headers(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(Error::parse(1, format!("missing column '{}'", column)));
        }
    }
    Ok(())
}

fn legacy_id(line: u64, record: &StringRecord) -> EntryId {
    let mut name = line.to_string();
    for field in record {
        name.push(',');
        name.push_str(field);
    }
    EntryId::derived(name.as_bytes())
}

fn csv_line(err: &csv::Error) -> u64 {
    err.position().map(|p| p.line()).unwrap_or(0)
}

/// Write the header and every entry, in stored order
pub fn write_collection<W: Write>(collection: &EntryCollection, writer: W) -> Result<W> {
    // Headers are written by hand so an empty collection still carries them
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    writer.write_record(HEADER)?;

    for entry in collection {
        writer.serialize(CsvRowOut::from(entry))?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::new(e.error().kind(), e.error().to_string())))
}

/// Serialize a collection to the exact bytes `save` writes
pub fn export_csv(collection: &EntryCollection) -> Result<Vec<u8>> {
    write_collection(collection, Vec::new())
}

/// Render a collection as a pretty-printed JSON array
pub fn export_json(collection: &EntryCollection) -> Result<String> {
    Ok(serde_json::to_string_pretty(collection)?)
}

/// Rows that could not be read by [`read_collection_lenient`]
#[derive(Debug)]
pub struct LoadReport {
    pub collection: EntryCollection,
    pub skipped: Vec<Error>,
}

/// Read every row, failing on the first malformed one
pub fn read_collection<R: Read>(reader: R) -> Result<EntryCollection> {
    read_rows(reader, true).map(|report| report.collection)
}

/// Read every row, skipping malformed ones with a warning
pub fn read_collection_lenient<R: Read>(reader: R) -> Result<LoadReport> {
    read_rows(reader, false)
}

fn read_rows<R: Read>(reader: R, strict: bool) -> Result<LoadReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::parse(1, e.to_string()))?
        .clone();
    if headers.is_empty() {
        // Zero-byte file
        return Ok(LoadReport {
            collection: EntryCollection::new(),
            skipped: Vec::new(),
        });
    }
    check_headers(&headers)?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for result in reader.records() {
        let parsed = result
            .map_err(|e| Error::parse(csv_line(&e), e.to_string()))
            .and_then(|record| {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                record
                    .deserialize::<CsvRowIn>(Some(&headers))
                    .map_err(|e| Error::parse(line, e.to_string()))
                    .and_then(|row| row.into_entry(line, || legacy_id(line, &record)))
            });

        match parsed {
            Ok(entry) => entries.push(entry),
            Err(err) if strict => return Err(err),
            Err(err) => {
                tracing::warn!("Skipping malformed row: {}", err);
                skipped.push(err);
            }
        }
    }

    tracing::debug!("Read {} entries ({} skipped)", entries.len(), skipped.len());
    Ok(LoadReport {
        collection: EntryCollection::from_entries(entries),
        skipped,
    })
}
