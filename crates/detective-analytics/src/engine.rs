//! Metric engine using DuckDB for per-platform aggregation.

use crate::error::{AnalyticsError, Result};
use crate::source::load_records;
use detective_domain::{DerivedRecord, PlatformEfficiency, PlatformTotals, Record};
use duckdb::{Connection, params};
use std::path::Path;

/// DuckDB-backed engine holding one request's derived campaign rows.
///
/// The connection is in-memory and owned; dropping the engine discards all
/// derived rows and aggregates.
pub struct MetricEngine {
    pub(crate) conn: Connection,
    record_count: usize,
}

impl MetricEngine {
    /// Create an empty in-memory engine.
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let engine = Self {
            conn,
            record_count: 0,
        };
        engine.initialize_schema()?;
        Ok(engine)
    }

    /// Normalize, derive and ingest `records` into a fresh engine.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let derived = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                DerivedRecord::derive(record).map_err(|source| AnalyticsError::Parse {
                    row: index + 1,
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut engine = Self::new_in_memory()?;
        engine.ingest(&derived)?;
        Ok(engine)
    }

    /// Load the CSV at `path` and build an engine over its rows.
    pub fn from_source<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records = load_records(path)?;
        Self::from_records(&records)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS campaign_metrics (
                platform VARCHAR NOT NULL,
                ad_spend DOUBLE NOT NULL,
                conversions BIGINT NOT NULL,
                cost_per_conversion DOUBLE NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Ingest derived rows. Returns the number of rows written.
    pub fn ingest(&mut self, records: &[DerivedRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO campaign_metrics (
                    platform, ad_spend, conversions, cost_per_conversion
                ) VALUES (?, ?, ?, ?)
                ",
            )?;
            for record in records {
                let conversions = i64::try_from(record.conversions).map_err(|_| {
                    AnalyticsError::Conversion(format!(
                        "conversions {} out of range",
                        record.conversions
                    ))
                })?;
                stmt.execute(params![
                    record.platform,
                    record.ad_spend,
                    conversions,
                    record.cost_per_conversion,
                ])?;
            }
        }
        tx.commit()?;

        self.record_count += records.len();
        tracing::debug!(rows = records.len(), "Ingested derived campaign rows");
        Ok(records.len())
    }

    /// Number of rows ingested so far.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Mean cost per conversion by platform, cheapest first.
    pub fn mean_efficiency_by_key(&self) -> Result<Vec<PlatformEfficiency>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT
                platform,
                AVG(cost_per_conversion) AS avg_cpc
            FROM campaign_metrics
            GROUP BY platform
            ORDER BY avg_cpc ASC, platform ASC
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PlatformEfficiency {
                platform: row.get(0)?,
                avg_cost_per_conversion: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AnalyticsError::from)
    }

    /// Total spend and conversions by platform, ordered by platform.
    pub fn totals_by_key(&self) -> Result<Vec<PlatformTotals>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT
                platform,
                SUM(ad_spend) AS total_spend,
                CAST(SUM(conversions) AS BIGINT) AS total_conversions
            FROM campaign_metrics
            GROUP BY platform
            ORDER BY platform ASC
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        rows.map(|row| -> Result<PlatformTotals> {
            let (platform, total_ad_spend, conversions) = row?;
            let total_conversions = u64::try_from(conversions).map_err(|_| {
                AnalyticsError::Conversion(format!("negative conversion total {conversions}"))
            })?;
            Ok(PlatformTotals {
                platform,
                total_ad_spend,
                total_conversions,
            })
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn google_records() -> Vec<Record> {
        vec![
            Record::new("Google", "₹1,000", 2),
            Record::new("Google", "₹3,000", 3),
        ]
    }

    #[test]
    fn test_create_engine() {
        let engine = MetricEngine::new_in_memory().unwrap();
        assert_eq!(engine.record_count(), 0);
        assert!(engine.mean_efficiency_by_key().unwrap().is_empty());
        assert!(engine.totals_by_key().unwrap().is_empty());
    }

    #[test]
    fn test_mean_cost_per_conversion() {
        let engine = MetricEngine::from_records(&google_records()).unwrap();
        let efficiency = engine.mean_efficiency_by_key().unwrap();
        assert_eq!(
            efficiency,
            vec![PlatformEfficiency {
                platform: "Google".to_string(),
                avg_cost_per_conversion: 750.0,
            }]
        );
    }

    #[test]
    fn test_zero_conversions_yield_zero_mean() {
        let engine = MetricEngine::from_records(&[Record::new("X", "₹500", 0)]).unwrap();
        let efficiency = engine.mean_efficiency_by_key().unwrap();
        assert_eq!(efficiency.len(), 1);
        assert_eq!(efficiency[0].avg_cost_per_conversion, 0.0);
    }

    #[test]
    fn test_totals_by_platform() {
        let mut records = google_records();
        records.push(Record::new("Facebook", "₹2,400", 4));
        records.push(Record::new("Facebook", "₹600", 0));

        let engine = MetricEngine::from_records(&records).unwrap();
        let totals = engine.totals_by_key().unwrap();
        assert_eq!(
            totals,
            vec![
                PlatformTotals {
                    platform: "Facebook".to_string(),
                    total_ad_spend: 3000.0,
                    total_conversions: 4,
                },
                PlatformTotals {
                    platform: "Google".to_string(),
                    total_ad_spend: 4000.0,
                    total_conversions: 5,
                },
            ]
        );
    }

    #[test]
    fn test_efficiency_sorted_ascending() {
        let records = vec![
            Record::new("Instagram", "₹17,500", 2),
            Record::new("Google", "₹1,600", 2),
            Record::new("LinkedIn", "₹4,000", 2),
            Record::new("Google", "₹800", 1),
        ];
        let engine = MetricEngine::from_records(&records).unwrap();
        let platforms: Vec<_> = engine
            .mean_efficiency_by_key()
            .unwrap()
            .into_iter()
            .map(|e| e.platform)
            .collect();
        assert_eq!(platforms, vec!["Google", "LinkedIn", "Instagram"]);
    }

    #[test]
    fn test_keys_match_exactly() {
        let records = vec![
            Record::new("Google", "₹100", 1),
            Record::new("google", "₹300", 1),
        ];
        let engine = MetricEngine::from_records(&records).unwrap();
        assert_eq!(engine.mean_efficiency_by_key().unwrap().len(), 2);
    }

    #[test]
    fn test_mean_per_platform_with_zero_conversion_rows() {
        let mut records = google_records();
        records.push(Record::new("Facebook", "₹2,400", 4));
        records.push(Record::new("Facebook", "₹600", 0));
        records.push(Record::new("X", "₹500", 0));

        let engine = MetricEngine::from_records(&records).unwrap();
        assert_eq!(
            engine.mean_efficiency_by_key().unwrap(),
            vec![
                PlatformEfficiency {
                    platform: "X".to_string(),
                    avg_cost_per_conversion: 0.0,
                },
                PlatformEfficiency {
                    platform: "Facebook".to_string(),
                    avg_cost_per_conversion: 300.0,
                },
                PlatformEfficiency {
                    platform: "Google".to_string(),
                    avg_cost_per_conversion: 750.0,
                },
            ]
        );
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Campaign ID,Platform,Ad Spend (₹),Conversions").unwrap();
        writeln!(file, "CAM-01,Google,\"₹1,000\",2").unwrap();
        writeln!(file, "CAM-02,Google,\"₹3,000\",3").unwrap();
        writeln!(file, "CAM-03,Facebook,\"₹2,400\",4").unwrap();
        writeln!(file, "CAM-04,Facebook,₹600,0").unwrap();
        file.flush().unwrap();

        let first = MetricEngine::from_source(file.path()).unwrap();
        let second = MetricEngine::from_source(file.path()).unwrap();
        assert_eq!(first.record_count(), 4);
        assert_eq!(second.record_count(), 4);
        assert_eq!(
            first.mean_efficiency_by_key().unwrap(),
            second.mean_efficiency_by_key().unwrap()
        );
        assert_eq!(first.totals_by_key().unwrap(), second.totals_by_key().unwrap());
    }

    #[test]
    fn test_malformed_amount_reports_row() {
        let records = vec![Record::new("Google", "₹100", 1), Record::new("Meta", "N/A", 1)];
        let err = MetricEngine::from_records(&records).err().unwrap();
        assert!(matches!(err, AnalyticsError::Parse { row: 2, .. }));
    }
}
