use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NewEnglandState – the six states covered by the dataset
// ---------------------------------------------------------------------------

/// One of the six New England states, ordered by postal code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NewEnglandState {
    CT,
    MA,
    ME,
    NH,
    RI,
    VT,
}

impl NewEnglandState {
    pub const ALL: [NewEnglandState; 6] = [
        NewEnglandState::CT,
        NewEnglandState::MA,
        NewEnglandState::ME,
        NewEnglandState::NH,
        NewEnglandState::RI,
        NewEnglandState::VT,
    ];

    /// Two-letter postal code.
    pub fn code(self) -> &'static str {
        match self {
            NewEnglandState::CT => "CT",
            NewEnglandState::MA => "MA",
            NewEnglandState::ME => "ME",
            NewEnglandState::NH => "NH",
            NewEnglandState::RI => "RI",
            NewEnglandState::VT => "VT",
        }
    }

    /// Parse an ISO 3166-2 region such as `US-MA`. A bare postal code is
    /// accepted too. Anything outside New England yields `None`.
    pub fn from_iso_region(region: &str) -> Option<Self> {
        let region = region.trim();
        let code = region.strip_prefix("US-").unwrap_or(region);
        Self::ALL
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for NewEnglandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// AirportType – the OurAirports facility categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirportType {
    Heliport,
    SmallAirport,
    MediumAirport,
    LargeAirport,
    SeaplaneBase,
    Balloonport,
    Closed,
}

impl AirportType {
    /// The raw value used in source tables.
    pub fn as_str(self) -> &'static str {
        match self {
            AirportType::Heliport => "heliport",
            AirportType::SmallAirport => "small_airport",
            AirportType::MediumAirport => "medium_airport",
            AirportType::LargeAirport => "large_airport",
            AirportType::SeaplaneBase => "seaplane_base",
            AirportType::Balloonport => "balloonport",
            AirportType::Closed => "closed",
        }
    }
}

impl FromStr for AirportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "heliport" => Ok(AirportType::Heliport),
            "small_airport" => Ok(AirportType::SmallAirport),
            "medium_airport" => Ok(AirportType::MediumAirport),
            "large_airport" => Ok(AirportType::LargeAirport),
            "seaplane_base" => Ok(AirportType::SeaplaneBase),
            "balloonport" => Ok(AirportType::Balloonport),
            "closed" => Ok(AirportType::Closed),
            other => Err(format!("unknown airport type '{other}'")),
        }
    }
}

impl fmt::Display for AirportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ElevationCategory – coarse banding used by the pie chart and filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElevationCategory {
    Low,
    Medium,
    High,
}

impl ElevationCategory {
    /// Below 200 ft is Low, below 1000 ft is Medium, anything else High.
    pub fn from_elevation(elevation_ft: f64) -> Self {
        if elevation_ft < 200.0 {
            ElevationCategory::Low
        } else if elevation_ft < 1000.0 {
            ElevationCategory::Medium
        } else {
            ElevationCategory::High
        }
    }
}

impl fmt::Display for ElevationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElevationCategory::Low => "Low",
            ElevationCategory::Medium => "Medium",
            ElevationCategory::High => "High",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Metric / Attribute – the columns the engine aggregates over
// ---------------------------------------------------------------------------

/// A numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Elevation,
    RunwayLength,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Elevation, Metric::RunwayLength];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Elevation => "Elevation (ft)",
            Metric::RunwayLength => "Runway length (ft)",
        }
    }
}

/// A categorical column usable for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    State,
    Type,
    ElevationCategory,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [
        Attribute::State,
        Attribute::Type,
        Attribute::ElevationCategory,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Attribute::State => "State",
            Attribute::Type => "Type",
            Attribute::ElevationCategory => "Elevation category",
        }
    }
}

/// The value of a categorical attribute for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoryValue {
    State(NewEnglandState),
    Type(AirportType),
    Elevation(ElevationCategory),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::State(s) => write!(f, "{s}"),
            CategoryValue::Type(t) => write!(f, "{t}"),
            CategoryValue::Elevation(e) => write!(f, "{e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// AirportRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single airport. Optional fields are absent in the source data for
/// some rows and are never synthesised by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub ident: String,
    pub name: String,
    pub state: NewEnglandState,
    pub airport_type: AirportType,
    pub elevation_ft: Option<f64>,
    pub latitude_deg: Option<f64>,
    pub longitude_deg: Option<f64>,
    pub runway_length_ft: Option<f64>,
    pub municipality: Option<String>,
}

impl AirportRecord {
    pub fn elevation_category(&self) -> Option<ElevationCategory> {
        self.elevation_ft.map(ElevationCategory::from_elevation)
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Elevation => self.elevation_ft,
            Metric::RunwayLength => self.runway_length_ft,
        }
    }

    pub fn category(&self, attribute: Attribute) -> Option<CategoryValue> {
        match attribute {
            Attribute::State => Some(CategoryValue::State(self.state)),
            Attribute::Type => Some(CategoryValue::Type(self.airport_type)),
            Attribute::ElevationCategory => self.elevation_category().map(CategoryValue::Elevation),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Inclusive numeric extent of a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All airports in source order.
    pub records: Vec<AirportRecord>,
    pub states: BTreeSet<NewEnglandState>,
    pub types: BTreeSet<AirportType>,
    pub elevation_categories: BTreeSet<ElevationCategory>,
    pub elevation_extent: Option<Extent>,
    pub runway_extent: Option<Extent>,
}

impl Dataset {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<AirportRecord>) -> Self {
        let mut states = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut elevation_categories = BTreeSet::new();

        for rec in &records {
            states.insert(rec.state);
            types.insert(rec.airport_type);
            if let Some(cat) = rec.elevation_category() {
                elevation_categories.insert(cat);
            }
        }

        let elevation_extent = extent_of(&records, Metric::Elevation);
        let runway_extent = extent_of(&records, Metric::RunwayLength);

        Dataset {
            records,
            states,
            types,
            elevation_categories,
            elevation_extent,
            runway_extent,
        }
    }

    /// Number of airports.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extent(&self, metric: Metric) -> Option<Extent> {
        match metric {
            Metric::Elevation => self.elevation_extent,
            Metric::RunwayLength => self.runway_extent,
        }
    }
}

fn extent_of(records: &[AirportRecord], metric: Metric) -> Option<Extent> {
    records
        .iter()
        .filter_map(|r| r.metric(metric))
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some(Extent { min: v, max: v }),
            Some(e) => Some(Extent {
                min: e.min.min(v),
                max: e.max.max(v),
            }),
        })
}

#[cfg(test)]
pub(crate) fn airport(
    ident: &str,
    state: NewEnglandState,
    airport_type: AirportType,
    elevation_ft: Option<f64>,
) -> AirportRecord {
    AirportRecord {
        ident: ident.to_string(),
        name: format!("{ident} Field"),
        state,
        airport_type,
        elevation_ft,
        latitude_deg: Some(43.0),
        longitude_deg: Some(-71.0),
        runway_length_ft: None,
        municipality: Some("Somewhere".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_regions() {
        assert_eq!(NewEnglandState::from_iso_region("US-MA"), Some(NewEnglandState::MA));
        assert_eq!(NewEnglandState::from_iso_region("vt"), Some(NewEnglandState::VT));
        assert_eq!(NewEnglandState::from_iso_region("US-NY"), None);
    }

    #[test]
    fn elevation_bands() {
        assert_eq!(ElevationCategory::from_elevation(199.9), ElevationCategory::Low);
        assert_eq!(ElevationCategory::from_elevation(200.0), ElevationCategory::Medium);
        assert_eq!(ElevationCategory::from_elevation(1000.0), ElevationCategory::High);
    }

    #[test]
    fn dataset_indexes_columns() {
        let ds = Dataset::from_records(vec![
            airport("A", NewEnglandState::ME, AirportType::SmallAirport, Some(100.0)),
            airport("B", NewEnglandState::VT, AirportType::LargeAirport, Some(900.0)),
            airport("C", NewEnglandState::ME, AirportType::Heliport, None),
        ]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.states.len(), 2);
        assert_eq!(ds.types.len(), 3);
        assert_eq!(ds.elevation_extent, Some(Extent { min: 100.0, max: 900.0 }));
        assert_eq!(ds.runway_extent, None);
        assert!(!ds.elevation_categories.contains(&ElevationCategory::High));
    }

    #[test]
    fn airport_type_round_trips_source_value() {
        assert_eq!("seaplane_base".parse::<AirportType>(), Ok(AirportType::SeaplaneBase));
        assert!("spaceport".parse::<AirportType>().is_err());
    }
}
