//! CSV data source for campaign rows.

use crate::error::{AnalyticsError, Result};
use detective_domain::{DomainError, Record, parse_count};
use duckdb::Connection;
use std::fs::File;
use std::io;
use std::path::Path;

/// Column holding the grouping key
pub const PLATFORM_COLUMN: &str = "Platform";
/// Column holding the currency-formatted spend
pub const AD_SPEND_COLUMN: &str = "Ad Spend (₹)";
/// Column holding the conversion count
pub const CONVERSIONS_COLUMN: &str = "Conversions";

/// Load every campaign row from the CSV file at `path`.
///
/// Extra columns are ignored. Cells are read as text and only the count is
/// coerced here; spend normalization happens on derivation.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    ensure_readable(path)?;

    let conn = Connection::open_in_memory()?;
    let query = format!(
        "SELECT {}, {}, {} FROM read_csv({}, header = true, delim = ',', quote = '\"', all_varchar = true)",
        quote_ident(PLATFORM_COLUMN),
        quote_ident(AD_SPEND_COLUMN),
        quote_ident(CONVERSIONS_COLUMN),
        quote_literal(&path.to_string_lossy()),
    );

    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let (platform, ad_spend, conversions) = row?;
        let row_number = index + 1;
        let at_row = |source: DomainError| AnalyticsError::Parse {
            row: row_number,
            source,
        };

        let platform = platform.ok_or_else(|| at_row(DomainError::parse("platform", "")))?;
        let ad_spend = ad_spend.ok_or_else(|| at_row(DomainError::parse("amount", "")))?;
        let conversions = conversions.ok_or_else(|| at_row(DomainError::parse("count", "")))?;
        let conversions = parse_count(&conversions).map_err(at_row)?;

        records.push(Record {
            platform,
            ad_spend,
            conversions,
        });
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "Loaded campaign records");
    Ok(records)
}

/// Separate a missing or unreadable file from a malformed one before DuckDB
/// sees it.
fn ensure_readable(path: &Path) -> Result<()> {
    let unavailable = |source: io::Error| AnalyticsError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unavailable)?;
    let metadata = file.metadata().map_err(unavailable)?;
    if !metadata.is_file() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
