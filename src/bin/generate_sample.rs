use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One output row, using OurAirports column names.
#[derive(Debug, Serialize)]
struct SampleAirport {
    ident: String,
    #[serde(rename = "type")]
    kind: &'static str,
    name: String,
    latitude_deg: f64,
    longitude_deg: f64,
    elevation_ft: Option<f64>,
    iso_region: &'static str,
    municipality: Option<String>,
    runway_length_ft: Option<f64>,
}

/// (region, postal code, centre lat, centre lon, spread deg, mean elevation ft, airports)
const REGIONS: [(&str, &str, f64, f64, f64, f64, usize); 7] = [
    ("US-CT", "CT", 41.6, -72.7, 0.35, 300.0, 40),
    ("US-MA", "MA", 42.3, -71.8, 0.55, 250.0, 70),
    ("US-ME", "ME", 45.0, -69.2, 1.0, 500.0, 80),
    ("US-NH", "NH", 43.6, -71.6, 0.5, 800.0, 45),
    ("US-RI", "RI", 41.7, -71.5, 0.15, 100.0, 12),
    ("US-VT", "VT", 44.1, -72.7, 0.4, 1100.0, 35),
    // Outside New England; dropped by the loader.
    ("US-NY", "NY", 42.9, -75.5, 1.0, 700.0, 10),
];

/// (type, weight) for drawing airport categories.
const TYPES: [(&str, usize); 6] = [
    ("small_airport", 50),
    ("heliport", 30),
    ("seaplane_base", 8),
    ("closed", 6),
    ("medium_airport", 5),
    ("large_airport", 1),
];

const TOWNS: [&str; 8] = [
    "Springfield", "Franklin", "Greenville", "Bristol", "Clinton", "Salem", "Madison", "Georgetown",
];

fn pick_type(rng: &mut SimpleRng) -> &'static str {
    let total: usize = TYPES.iter().map(|(_, w)| w).sum();
    let mut roll = rng.below(total);
    for (kind, w) in TYPES {
        if roll < w {
            return kind;
        }
        roll -= w;
    }
    TYPES[0].0
}

fn runway_for(kind: &str, rng: &mut SimpleRng) -> Option<f64> {
    let (mean, sd) = match kind {
        "small_airport" => (2800.0, 700.0),
        "medium_airport" => (5500.0, 900.0),
        "large_airport" => (9500.0, 1200.0),
        _ => return None,
    };
    Some(rng.gauss(mean, sd).max(800.0).round())
}

fn generate(rng: &mut SimpleRng) -> Vec<SampleAirport> {
    let mut rows = Vec::new();
    for (region, code, lat, lon, spread, elev, count) in REGIONS {
        for i in 0..count {
            let kind = pick_type(rng);
            let town = TOWNS[rng.below(TOWNS.len())];
            // A few rows without elevation or municipality exercise the cleaning.
            let elevation_ft = (rng.next_f64() > 0.05).then(|| rng.gauss(elev, elev * 0.6).max(0.0).round());
            let municipality = (rng.next_f64() > 0.03).then(|| town.to_string());
            rows.push(SampleAirport {
                ident: format!("{code}{i:02}"),
                kind,
                name: format!("{town} {}", kind.replace('_', " ")),
                latitude_deg: rng.gauss(lat, spread),
                longitude_deg: rng.gauss(lon, spread),
                elevation_ft,
                iso_region: region,
                municipality,
                runway_length_ft: runway_for(kind, rng),
            });
        }
    }
    rows
}

fn write_csv(path: &str, rows: &[SampleAirport]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[SampleAirport]) -> Result<()> {
    let strings = |f: fn(&SampleAirport) -> Option<&str>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<StringArray>())
    };
    let numbers = |f: fn(&SampleAirport) -> Option<f64>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<Float64Array>())
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("ident", DataType::Utf8, false),
        Field::new("type", DataType::Utf8, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("latitude_deg", DataType::Float64, false),
        Field::new("longitude_deg", DataType::Float64, false),
        Field::new("elevation_ft", DataType::Float64, true),
        Field::new("iso_region", DataType::Utf8, false),
        Field::new("municipality", DataType::Utf8, true),
        Field::new("runway_length_ft", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            strings(|r| Some(r.ident.as_str())),
            strings(|r| Some(r.kind)),
            strings(|r| Some(r.name.as_str())),
            numbers(|r| Some(r.latitude_deg)),
            numbers(|r| Some(r.longitude_deg)),
            numbers(|r| r.elevation_ft),
            strings(|r| Some(r.iso_region)),
            strings(|r| r.municipality.as_deref()),
            numbers(|r| r.runway_length_ft),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_csv("sample_airports.csv", &rows)?;
    write_parquet("sample_airports.parquet", &rows)?;

    println!(
        "Wrote {} airports to sample_airports.csv and sample_airports.parquet",
        rows.len()
    );
    Ok(())
}
