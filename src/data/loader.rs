use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
    UInt64Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::enrich::enrich;
use super::error::DataError;
use super::model::{IncidentDataset, RawIncident};

/// Required column headings of the source table.
pub mod columns {
    pub const COUNTRY: &str = "Country";
    pub const YEAR: &str = "Year";
    pub const ATTACK_TYPE: &str = "Attack Type";
    pub const VULNERABILITY_TYPE: &str = "Security Vulnerability Type";
    pub const DEFENSE_MECHANISM: &str = "Defense Mechanism Used";
    pub const ATTACK_SOURCE: &str = "Attack Source";
    pub const TARGET_INDUSTRY: &str = "Target Industry";
    pub const FINANCIAL_LOSS: &str = "Financial Loss (in Million $)";
    pub const AFFECTED_USERS: &str = "Number of Affected Users";
    pub const RESOLUTION_HOURS: &str = "Incident Resolution Time (in Hours)";
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an incident dataset from a file and enrich it.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required column names (primary format)
/// * `.json`    – records-oriented array, the default `df.to_json(orient='records')`
/// * `.parquet` – flat scalar columns with the same names
///
/// A missing required column or a null/unparseable numeric cell aborts the
/// load; null categorical cells become empty strings and classify into their
/// default branches.
pub fn load_file(path: &Path) -> Result<IncidentDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    Ok(IncidentDataset::from_incidents(enrich(raw)))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<RawIncident>> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv_records(reader)
}

/// Parse raw incidents out of any CSV reader.
pub fn read_csv_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawIncident>> {
    let headers = reader.headers().context("reading CSV headers")?.clone();
    let col = |name: &'static str| -> Result<usize, DataError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(DataError::MissingColumn(name))
    };

    let country_idx = col(columns::COUNTRY)?;
    let year_idx = col(columns::YEAR)?;
    let attack_idx = col(columns::ATTACK_TYPE)?;
    let vuln_idx = col(columns::VULNERABILITY_TYPE)?;
    let defense_idx = col(columns::DEFENSE_MECHANISM)?;
    let source_idx = col(columns::ATTACK_SOURCE)?;
    let industry_idx = col(columns::TARGET_INDUSTRY)?;
    let loss_idx = col(columns::FINANCIAL_LOSS)?;
    let users_idx = col(columns::AFFECTED_USERS)?;
    let hours_idx = col(columns::RESOLUTION_HOURS)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let text = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        rows.push(RawIncident {
            country: text(country_idx),
            year: parse_i32(record.get(year_idx), row_no, columns::YEAR)?,
            attack_type: text(attack_idx),
            vulnerability_type: text(vuln_idx),
            defense_mechanism: text(defense_idx),
            attack_source: text(source_idx),
            target_industry: text(industry_idx),
            financial_loss_musd: parse_f64(record.get(loss_idx), row_no, columns::FINANCIAL_LOSS)?,
            affected_users: parse_u64(record.get(users_idx), row_no, columns::AFFECTED_USERS)?,
            resolution_hours: parse_f64(
                record.get(hours_idx),
                row_no,
                columns::RESOLUTION_HOURS,
            )?,
        });
    }
    Ok(rows)
}

fn parse_f64(cell: Option<&str>, row: usize, column: &'static str) -> Result<f64, DataError> {
    let s = cell.unwrap_or("").trim();
    if s.is_empty() {
        return Err(DataError::BadNumeric {
            row,
            column,
            reason: "is null".to_string(),
        });
    }
    let value: f64 = s.parse().map_err(|_| DataError::BadNumeric {
        row,
        column,
        reason: format!("has unparseable value '{s}'"),
    })?;
    require_non_negative(value, row, column)
}

fn parse_u64(cell: Option<&str>, row: usize, column: &'static str) -> Result<u64, DataError> {
    let s = cell.unwrap_or("").trim();
    if s.is_empty() {
        return Err(DataError::BadNumeric {
            row,
            column,
            reason: "is null".to_string(),
        });
    }
    s.parse().map_err(|_| DataError::BadNumeric {
        row,
        column,
        reason: format!("has unparseable value '{s}'"),
    })
}

fn parse_i32(cell: Option<&str>, row: usize, column: &'static str) -> Result<i32, DataError> {
    let s = cell.unwrap_or("").trim();
    if s.is_empty() {
        return Err(DataError::BadNumeric {
            row,
            column,
            reason: "is null".to_string(),
        });
    }
    s.parse().map_err(|_| DataError::BadNumeric {
        row,
        column,
        reason: format!("has unparseable value '{s}'"),
    })
}

fn require_non_negative(value: f64, row: usize, column: &'static str) -> Result<f64, DataError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(DataError::BadNumeric {
            row,
            column,
            reason: format!("has negative or non-finite value {value}"),
        })
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<RawIncident>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    parse_json_records(&root)
}

/// Parse raw incidents out of a records-oriented JSON array.
pub fn parse_json_records(root: &JsonValue) -> Result<Vec<RawIncident>> {
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (row_no, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {row_no} is not a JSON object"))?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(JsonValue::as_str)
                .unwrap_or("")
                .trim()
                .to_string()
        };

        rows.push(RawIncident {
            country: text(columns::COUNTRY),
            year: json_i32(obj, row_no, columns::YEAR)?,
            attack_type: text(columns::ATTACK_TYPE),
            vulnerability_type: text(columns::VULNERABILITY_TYPE),
            defense_mechanism: text(columns::DEFENSE_MECHANISM),
            attack_source: text(columns::ATTACK_SOURCE),
            target_industry: text(columns::TARGET_INDUSTRY),
            financial_loss_musd: json_f64(obj, row_no, columns::FINANCIAL_LOSS)?,
            affected_users: json_u64(obj, row_no, columns::AFFECTED_USERS)?,
            resolution_hours: json_f64(obj, row_no, columns::RESOLUTION_HOURS)?,
        });
    }
    Ok(rows)
}

type JsonObject = serde_json::Map<String, JsonValue>;

fn json_f64(obj: &JsonObject, row: usize, column: &'static str) -> Result<f64, DataError> {
    match obj.get(column).and_then(JsonValue::as_f64) {
        Some(value) => require_non_negative(value, row, column),
        None => Err(DataError::BadNumeric {
            row,
            column,
            reason: "is null, missing, or not a number".to_string(),
        }),
    }
}

fn json_u64(obj: &JsonObject, row: usize, column: &'static str) -> Result<u64, DataError> {
    obj.get(column)
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| DataError::BadNumeric {
            row,
            column,
            reason: "is null, missing, or not a non-negative integer".to_string(),
        })
}

fn json_i32(obj: &JsonObject, row: usize, column: &'static str) -> Result<i32, DataError> {
    obj.get(column)
        .and_then(JsonValue::as_i64)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| DataError::BadNumeric {
            row,
            column,
            reason: "is null, missing, or not an integer".to_string(),
        })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`): strings may be `Utf8` or `LargeUtf8`,
/// integers `Int32`/`Int64`/`UInt64`, floats `Float32`/`Float64`.
fn load_parquet(path: &Path) -> Result<Vec<RawIncident>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    let mut base = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let col = |name: &'static str| -> Result<usize, DataError> {
            schema
                .index_of(name)
                .map_err(|_| DataError::MissingColumn(name))
        };

        let country_col = batch.column(col(columns::COUNTRY)?);
        let year_col = batch.column(col(columns::YEAR)?);
        let attack_col = batch.column(col(columns::ATTACK_TYPE)?);
        let vuln_col = batch.column(col(columns::VULNERABILITY_TYPE)?);
        let defense_col = batch.column(col(columns::DEFENSE_MECHANISM)?);
        let source_col = batch.column(col(columns::ATTACK_SOURCE)?);
        let industry_col = batch.column(col(columns::TARGET_INDUSTRY)?);
        let loss_col = batch.column(col(columns::FINANCIAL_LOSS)?);
        let users_col = batch.column(col(columns::AFFECTED_USERS)?);
        let hours_col = batch.column(col(columns::RESOLUTION_HOURS)?);

        for row in 0..batch.num_rows() {
            let row_no = base + row;
            let year = int_cell(year_col, row)
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| null_numeric(row_no, columns::YEAR))?;
            let loss = float_cell(loss_col, row)
                .ok_or_else(|| null_numeric(row_no, columns::FINANCIAL_LOSS))?;
            let users = int_cell(users_col, row)
                .and_then(|u| u64::try_from(u).ok())
                .ok_or_else(|| null_numeric(row_no, columns::AFFECTED_USERS))?;
            let hours = float_cell(hours_col, row)
                .ok_or_else(|| null_numeric(row_no, columns::RESOLUTION_HOURS))?;

            rows.push(RawIncident {
                country: string_cell(country_col, row),
                year,
                attack_type: string_cell(attack_col, row),
                vulnerability_type: string_cell(vuln_col, row),
                defense_mechanism: string_cell(defense_col, row),
                attack_source: string_cell(source_col, row),
                target_industry: string_cell(industry_col, row),
                financial_loss_musd: require_non_negative(loss, row_no, columns::FINANCIAL_LOSS)?,
                affected_users: users,
                resolution_hours: require_non_negative(hours, row_no, columns::RESOLUTION_HOURS)?,
            });
        }
        base += batch.num_rows();
    }
    Ok(rows)
}

fn null_numeric(row: usize, column: &'static str) -> DataError {
    DataError::BadNumeric {
        row,
        column,
        reason: "is null or has an unsupported type".to_string(),
    }
}

// -- Arrow cell helpers --

/// Extract a string cell; nulls and non-string columns become empty strings.
fn string_cell(col: &Arc<dyn Array>, row: usize) -> String {
    if col.is_null(row) {
        return String::new();
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .map(|a| a.value(row).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Extract an integer cell as `i64`, if the column holds one.
fn int_cell(col: &Arc<dyn Array>, row: usize) -> Option<i64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as i64),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row)),
        DataType::UInt64 => col
            .as_any()
            .downcast_ref::<UInt64Array>()
            .and_then(|a| i64::try_from(a.value(row)).ok()),
        _ => None,
    }
}

/// Extract a float cell as `f64`; integer columns are widened.
fn float_cell(col: &Arc<dyn Array>, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.value(row)),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int32 | DataType::Int64 | DataType::UInt64 => {
            int_cell(col, row).map(|v| v as f64)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Country,Year,Attack Type,Security Vulnerability Type,\
Defense Mechanism Used,Attack Source,Target Industry,\
Financial Loss (in Million $),Number of Affected Users,\
Incident Resolution Time (in Hours)";

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn csv_happy_path() {
        let data = format!(
            "{HEADER}\nUS,2020,Phishing,Zero-day,Firewall,Hacker Group,Banking,80.5,600000,60\n\
UK,2021,Malware,Weak Passwords,VPN,Insider,Retail,30,100,10.5\n"
        );
        let rows = read_csv_records(reader(&data)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].country, "US");
        assert_eq!(rows[0].year, 2020);
        assert!((rows[0].financial_loss_musd - 80.5).abs() < 1e-9);
        assert_eq!(rows[1].affected_users, 100);
        assert!((rows[1].resolution_hours - 10.5).abs() < 1e-9);
    }

    #[test]
    fn csv_missing_column_is_fatal() {
        let data = "Country,Attack Type\nUS,Phishing\n";
        let err = read_csv_records(reader(data)).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::MissingColumn(col)) => assert_eq!(*col, "Year"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn csv_null_numeric_cell_is_rejected() {
        let data = format!(
            "{HEADER}\nUS,2020,Phishing,Zero-day,Firewall,Hacker Group,Banking,,600000,60\n"
        );
        let err = read_csv_records(reader(&data)).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::BadNumeric { row, column, .. }) => {
                assert_eq!(*row, 0);
                assert_eq!(*column, "Financial Loss (in Million $)");
            }
            other => panic!("expected BadNumeric, got {other:?}"),
        }
    }

    #[test]
    fn csv_negative_loss_is_rejected() {
        let data = format!(
            "{HEADER}\nUS,2020,Phishing,Zero-day,Firewall,Hacker Group,Banking,-5,600000,60\n"
        );
        assert!(read_csv_records(reader(&data)).is_err());
    }

    #[test]
    fn csv_null_categorical_cell_is_kept_as_empty() {
        let data = format!(
            "{HEADER}\nUS,2020,Phishing,,Firewall,Hacker Group,Banking,10,100,5\n"
        );
        let rows = read_csv_records(reader(&data)).unwrap();
        assert_eq!(rows[0].vulnerability_type, "");
    }

    #[test]
    fn json_records_happy_path() {
        let root = serde_json::json!([{
            "Country": "US",
            "Year": 2020,
            "Attack Type": "Phishing",
            "Security Vulnerability Type": "Zero-day",
            "Defense Mechanism Used": "Firewall",
            "Attack Source": "Hacker Group",
            "Target Industry": "Banking",
            "Financial Loss (in Million $)": 80.5,
            "Number of Affected Users": 600000,
            "Incident Resolution Time (in Hours)": 60.0
        }]);
        let rows = parse_json_records(&root).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2020);
        assert_eq!(rows[0].affected_users, 600_000);
    }

    #[test]
    fn json_null_numeric_is_rejected() {
        let root = serde_json::json!([{
            "Country": "US",
            "Year": 2020,
            "Attack Type": "Phishing",
            "Security Vulnerability Type": "Zero-day",
            "Defense Mechanism Used": "Firewall",
            "Attack Source": "Hacker Group",
            "Target Industry": "Banking",
            "Financial Loss (in Million $)": null,
            "Number of Affected Users": 600000,
            "Incident Resolution Time (in Hours)": 60.0
        }]);
        let err = parse_json_records(&root).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::BadNumeric { .. })
        ));
    }

    #[test]
    fn json_missing_categorical_defaults_to_empty() {
        let root = serde_json::json!([{
            "Country": "US",
            "Year": 2020,
            "Attack Type": "Phishing",
            "Defense Mechanism Used": "Firewall",
            "Attack Source": "Hacker Group",
            "Target Industry": "Banking",
            "Financial Loss (in Million $)": 1.0,
            "Number of Affected Users": 1,
            "Incident Resolution Time (in Hours)": 1.0
        }]);
        let rows = parse_json_records(&root).unwrap();
        assert_eq!(rows[0].vulnerability_type, "");
    }
}
