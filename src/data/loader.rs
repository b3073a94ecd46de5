use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{AirportRecord, AirportType, Dataset, NewEnglandState};

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// Cleaning steps applied after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Replace missing elevations with the median of the loaded rows.
    pub fill_missing_elevation: bool,
    /// Drop rows without a municipality.
    pub require_municipality: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fill_missing_elevation: true,
            require_municipality: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an airports table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with OurAirports column names (recommended)
/// * `.json`    – `[{ "ident": ..., "iso_region": ..., ... }, ...]`
/// * `.parquet` – one column per field
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)?
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            read_json(&text)?
        }
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    clean(rows, options)
}

/// Parse and clean CSV from any reader.
pub fn load_csv_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset> {
    clean(read_csv(reader)?, options)
}

// ---------------------------------------------------------------------------
// Raw rows, as they appear in the source table
// ---------------------------------------------------------------------------

/// One source row before cleaning. Unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawAirport {
    ident: String,
    #[serde(default)]
    name: String,
    iso_region: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    elevation_ft: Option<f64>,
    #[serde(default)]
    latitude_deg: Option<f64>,
    #[serde(default)]
    longitude_deg: Option<f64>,
    #[serde(default)]
    runway_length_ft: Option<f64>,
    #[serde(default)]
    municipality: Option<String>,
}

// ---------------------------------------------------------------------------
// CSV / JSON readers
// ---------------------------------------------------------------------------

fn read_csv<R: Read>(reader: R) -> Result<Vec<RawAirport>> {
    let mut reader = csv::Reader::from_reader(reader);
    reader
        .deserialize::<RawAirport>()
        .enumerate()
        .map(|(row_no, rec)| rec.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`).
fn read_json(text: &str) -> Result<Vec<RawAirport>> {
    serde_json::from_str(text).context("parsing JSON airport records")
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field. String columns may be
/// Utf8 or LargeUtf8; numeric columns any of Int32/Int64/Float32/Float64.
fn read_parquet(path: &Path) -> Result<Vec<RawAirport>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut rows)?;
    }
    Ok(rows)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Arc<dyn Array>> {
    batch.schema_ref().index_of(name).ok().map(|i| batch.column(i))
}

fn read_batch(batch: &RecordBatch, rows: &mut Vec<RawAirport>) -> Result<()> {
    let required = |name: &str| {
        column(batch, name).ok_or_else(|| anyhow!("Parquet file missing '{name}' column"))
    };

    let ident = required("ident")?;
    let iso_region = required("iso_region")?;
    let kind = required("type")?;
    let name = column(batch, "name");
    let elevation = column(batch, "elevation_ft");
    let latitude = column(batch, "latitude_deg");
    let longitude = column(batch, "longitude_deg");
    let runway = column(batch, "runway_length_ft");
    let municipality = column(batch, "municipality");

    for row in 0..batch.num_rows() {
        let string_at = |col: &Arc<dyn Array>| extract_string(col, row);
        let number_at = |col: Option<&Arc<dyn Array>>| -> Result<Option<f64>> {
            col.map(|c| extract_f64(c, row)).transpose().map(Option::flatten)
        };

        rows.push(RawAirport {
            ident: string_at(ident)?
                .with_context(|| format!("Row {row}: null 'ident'"))?,
            name: name.map(string_at).transpose()?.flatten().unwrap_or_default(),
            iso_region: string_at(iso_region)?.unwrap_or_default(),
            kind: string_at(kind)?.unwrap_or_default(),
            elevation_ft: number_at(elevation)?,
            latitude_deg: number_at(latitude)?,
            longitude_deg: number_at(longitude)?,
            runway_length_ft: number_at(runway)?,
            municipality: municipality.map(string_at).transpose()?.flatten(),
        });
    }
    Ok(())
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(Some(s.value(row).to_string()))
        }
        DataType::LargeUtf8 => Ok(Some(col.as_string::<i64>().value(row).to_string())),
        other => bail!("Expected string column, got {other:?}"),
    }
}

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| a.value(row) as f64),
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(row)),
        other => bail!("Expected numeric column, got {other:?}"),
    };
    value.map(Some).context("numeric column has unexpected array type")
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Keep New England rows, fill missing elevations with their median, then
/// drop rows without a municipality and parse types. The median is taken
/// before the municipality filter.
fn clean(rows: Vec<RawAirport>, options: &LoadOptions) -> Result<Dataset> {
    let total = rows.len();
    let regional: Vec<(usize, NewEnglandState, RawAirport)> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(row_no, raw)| {
            NewEnglandState::from_iso_region(&raw.iso_region).map(|state| (row_no, state, raw))
        })
        .collect();
    let outside_region = total - regional.len();

    let fill = if options.fill_missing_elevation {
        median(regional.iter().filter_map(|(_, _, raw)| raw.elevation_ft))
    } else {
        None
    };

    let mut filled = 0usize;
    let mut no_municipality = 0usize;
    let mut records = Vec::with_capacity(regional.len());

    for (row_no, state, raw) in regional {
        let municipality = raw.municipality.filter(|m| !m.trim().is_empty());
        if options.require_municipality && municipality.is_none() {
            no_municipality += 1;
            continue;
        }
        let airport_type: AirportType = raw
            .kind
            .parse()
            .map_err(|e: String| anyhow!("Row {row_no} ({}): {e}", raw.ident))?;

        let elevation_ft = match (raw.elevation_ft, fill) {
            (None, Some(m)) => {
                filled += 1;
                Some(m)
            }
            (elevation, _) => elevation,
        };

        records.push(AirportRecord {
            ident: raw.ident,
            name: raw.name,
            state,
            airport_type,
            elevation_ft,
            latitude_deg: raw.latitude_deg,
            longitude_deg: raw.longitude_deg,
            runway_length_ft: raw.runway_length_ft,
            municipality,
        });
    }

    if let (Some(m), true) = (fill, filled > 0) {
        log::debug!("Filled {filled} missing elevations with median {m}");
    }

    log::info!(
        "Loaded {} airports from {total} rows ({outside_region} outside New England, {no_municipality} without municipality)",
        records.len()
    );

    Ok(Dataset::from_records(records))
}

fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut v: Vec<f64> = values.filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
id,ident,type,name,latitude_deg,longitude_deg,elevation_ft,iso_region,municipality,runway_length_ft
1,KBOS,large_airport,Logan,42.36,-71.01,20,US-MA,Boston,10083
2,KBTV,medium_airport,Burlington,44.47,-73.15,335,US-VT,Burlington,
3,KJFK,large_airport,Kennedy,40.64,-73.78,13,US-NY,New York,14511
4,ME01,heliport,Pad,44.0,-70.0,,US-ME,Portland,
5,NH99,small_airport,Nowhere,43.0,-71.5,900,US-NH,,
";

    #[test]
    fn csv_keeps_new_england_rows_and_fills_median() {
        let ds = load_csv_reader(CSV.as_bytes(), &LoadOptions::default()).unwrap();
        let ids: Vec<&str> = ds.records.iter().map(|r| r.ident.as_str()).collect();
        assert_eq!(ids, vec!["KBOS", "KBTV", "ME01"]);

        assert_eq!(ds.records[0].state, NewEnglandState::MA);
        assert_eq!(ds.records[0].runway_length_ft, Some(10083.0));
        assert_eq!(ds.records[1].runway_length_ft, None);
        // Median of 20, 335 and 900: NH99 counts even though it is dropped
        // for lacking a municipality.
        assert_eq!(ds.records[2].elevation_ft, Some(335.0));
    }

    #[test]
    fn median_ignores_rows_outside_new_england() {
        let csv = "\
ident,type,name,iso_region,municipality,elevation_ft
A1,heliport,One,US-CT,Hartford,100
A2,heliport,Two,US-CT,Hartford,
NY1,heliport,Far,US-NY,Albany,5000
A3,heliport,Three,US-CT,,300
";
        let ds = load_csv_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        let ids: Vec<&str> = ds.records.iter().map(|r| r.ident.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2"]);
        assert_eq!(ds.records[1].elevation_ft, Some(200.0));
    }

    #[test]
    fn csv_cleaning_can_be_disabled() {
        let options = LoadOptions {
            fill_missing_elevation: false,
            require_municipality: false,
        };
        let ds = load_csv_reader(CSV.as_bytes(), &options).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.records[2].elevation_ft, None);
        assert_eq!(ds.records[3].municipality, None);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let csv = "ident,type,name,iso_region,municipality\nX1,spaceport,Moonbase,US-RI,Newport\n";
        let err = load_csv_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("X1"));
    }

    #[test]
    fn json_records() {
        let json = r#"[
            {"ident": "KPWM", "type": "medium_airport", "name": "Portland Jetport",
             "iso_region": "US-ME", "elevation_ft": 76, "latitude_deg": 43.64,
             "longitude_deg": -70.30, "municipality": "Portland", "continent": "NA"}
        ]"#;
        let ds = clean(read_json(json).unwrap(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].airport_type, AirportType::MediumAirport);
        assert_eq!(ds.records[0].elevation_ft, Some(76.0));
    }

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median([3.0, 1.0, 2.0].into_iter()), Some(2.0));
        assert_eq!(median([4.0, 1.0].into_iter()), Some(2.5));
        assert_eq!(median(std::iter::empty()), None);
    }
}
