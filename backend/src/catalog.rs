//! Two-line element catalog text handling.
//!
//! Catalog blobs come as a sequence of records. A record is an optional name
//! line followed by element lines `1 ...` and `2 ...`. Names may carry the
//! `"0 "` prefix used by three-line element files.

use log::debug;
use thiserror::Error;

/// Name prefixes kept when no explicit filter is configured.
pub const DEFAULT_NAME_PREFIXES: &[&str] = &["STARLINK", "ONEWEB"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("No catalog records matched the name filter ({skipped} incomplete record(s) skipped)")]
    Empty { skipped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleRecord {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl TleRecord {
    /// Name with surrounding whitespace and any `"0 "` prefix removed.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(|n| {
            let n = n.trim();
            n.strip_prefix("0 ").unwrap_or(n).trim_start()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecords {
    pub records: Vec<TleRecord>,
    /// Records missing one of their element lines
    pub skipped: usize,
}

#[derive(Debug, Default)]
struct PartialRecord {
    name: Option<String>,
    line1: Option<String>,
    line2: Option<String>,
}

impl PartialRecord {
    fn is_blank(&self) -> bool {
        self.name.is_none() && self.line1.is_none() && self.line2.is_none()
    }
}

fn finish(partial: PartialRecord, parsed: &mut ParsedRecords) {
    if partial.is_blank() {
        return;
    }
    match (partial.line1, partial.line2) {
        (Some(line1), Some(line2)) => parsed.records.push(TleRecord {
            name: partial.name,
            line1,
            line2,
        }),
        _ => parsed.skipped += 1,
    }
}

/// Split catalog text into records.
pub fn parse_records(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();
    let mut current = PartialRecord::default();

    for line in text.lines() {
        let line = line.trim_end_matches('\r').trim_end();
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("1 ") {
            if current.line1.is_some() || current.line2.is_some() {
                finish(std::mem::take(&mut current), &mut parsed);
            }
            current.line1 = Some(line.to_string());
        } else if line.starts_with("2 ") {
            if current.line2.is_some() {
                finish(std::mem::take(&mut current), &mut parsed);
            }
            current.line2 = Some(line.to_string());
        } else {
            finish(std::mem::take(&mut current), &mut parsed);
            current.name = Some(line.to_string());
        }
    }
    finish(current, &mut parsed);

    parsed
}

/// Records that passed the name filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredCatalog {
    pub records: Vec<TleRecord>,
    pub skipped: usize,
    pub rejected: usize,
}

impl FilteredCatalog {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `line1\nline2` pairs joined by newlines, the form services load.
    pub fn to_two_line_text(&self) -> String {
        self.records
            .iter()
            .map(|r| format!("{}\n{}", r.line1, r.line2))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep named records whose name starts with one of `prefixes`.
///
/// An empty prefix list keeps every complete record, named or not.
pub fn filter_catalog<S: AsRef<str>>(
    text: &str,
    prefixes: &[S],
) -> Result<FilteredCatalog, CatalogError> {
    let parsed = parse_records(text);
    let total = parsed.records.len();

    let records: Vec<TleRecord> = parsed
        .records
        .into_iter()
        .filter(|record| {
            if prefixes.is_empty() {
                return true;
            }
            record
                .display_name()
                .map(|name| prefixes.iter().any(|p| name.starts_with(p.as_ref())))
                .unwrap_or(false)
        })
        .collect();

    let rejected = total - records.len();
    debug!(
        "Catalog filter kept {} of {} records ({} incomplete)",
        records.len(),
        total,
        parsed.skipped
    );

    if records.is_empty() {
        return Err(CatalogError::Empty {
            skipped: parsed.skipped,
        });
    }

    Ok(FilteredCatalog {
        records,
        skipped: parsed.skipped,
        rejected,
    })
}
