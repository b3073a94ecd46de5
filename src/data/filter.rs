use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{AirportRecord, AirportType, Dataset, ElevationCategory, Metric, NewEnglandState};

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn new(min: f64, max: f64) -> Self {
        NumericRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// The constraints chosen in the sidebar.
///
/// An empty set or an absent range means "no restriction on that column".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub states: BTreeSet<NewEnglandState>,
    pub types: BTreeSet<AirportType>,
    pub elevation_categories: BTreeSet<ElevationCategory>,
    pub elevation: Option<NumericRange>,
    pub runway_length: Option<NumericRange>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("{column}: minimum {min} is greater than maximum {max}")]
    InvertedRange { column: &'static str, min: f64, max: f64 },
    #[error("{column}: range bounds must be finite numbers")]
    NonFiniteBound { column: &'static str },
}

impl FilterSpec {
    /// Check range bounds before the spec is handed to [`filter`].
    pub fn validate(&self) -> Result<(), FilterError> {
        check_range(Metric::Elevation, self.elevation)?;
        check_range(Metric::RunwayLength, self.runway_length)
    }

    pub fn range(&self, metric: Metric) -> Option<NumericRange> {
        match metric {
            Metric::Elevation => self.elevation,
            Metric::RunwayLength => self.runway_length,
        }
    }

    /// Does `record` satisfy every active constraint?
    pub fn matches(&self, record: &AirportRecord) -> bool {
        if !self.states.is_empty() && !self.states.contains(&record.state) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&record.airport_type) {
            return false;
        }
        if !self.elevation_categories.is_empty() {
            match record.elevation_category() {
                Some(cat) if self.elevation_categories.contains(&cat) => {}
                _ => return false,
            }
        }
        Metric::ALL.into_iter().all(|metric| match self.range(metric) {
            None => true,
            // A missing value cannot satisfy a bound.
            Some(range) => record.metric(metric).is_some_and(|v| range.contains(v)),
        })
    }
}

fn check_range(metric: Metric, range: Option<NumericRange>) -> Result<(), FilterError> {
    let Some(range) = range else {
        return Ok(());
    };
    let column = metric.label();
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(FilterError::NonFiniteBound { column });
    }
    if range.min > range.max {
        return Err(FilterError::InvertedRange {
            column,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Return the airports that pass all active filters, in dataset order.
///
/// The spec is assumed to be validated. An empty result is a valid outcome.
pub fn filter<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> Vec<&'a AirportRecord> {
    dataset.records.iter().filter(|rec| spec.matches(rec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::airport;
    use NewEnglandState::*;

    fn sample() -> Dataset {
        let mut with_runway = airport("D", MA, AirportType::MediumAirport, Some(150.0));
        with_runway.runway_length_ft = Some(5000.0);
        Dataset::from_records(vec![
            airport("A", ME, AirportType::SmallAirport, Some(100.0)),
            airport("B", VT, AirportType::LargeAirport, Some(900.0)),
            airport("C", ME, AirportType::Heliport, None),
            with_runway,
        ])
    }

    fn idents(recs: &[&AirportRecord]) -> Vec<String> {
        recs.iter().map(|r| r.ident.clone()).collect()
    }

    #[test]
    fn empty_spec_returns_everything_in_order() {
        let ds = sample();
        let out = filter(&ds, &FilterSpec::default());
        assert_eq!(idents(&out), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn state_filter_keeps_only_selected_states() {
        let ds = Dataset::from_records(vec![
            airport("A", ME, AirportType::SmallAirport, Some(100.0)),
            airport("B", VT, AirportType::LargeAirport, Some(900.0)),
        ]);
        let spec = FilterSpec {
            states: [ME].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(idents(&filter(&ds, &spec)), vec!["A"]);
    }

    #[test]
    fn multi_valued_attributes_are_or_ed_and_columns_and_ed() {
        let ds = sample();
        let spec = FilterSpec {
            states: [ME, VT].into_iter().collect(),
            types: [AirportType::SmallAirport, AirportType::LargeAirport]
                .into_iter()
                .collect(),
            elevation: Some(NumericRange::new(0.0, 500.0)),
            ..Default::default()
        };
        assert_eq!(idents(&filter(&ds, &spec)), vec!["A"]);
    }

    #[test]
    fn missing_values_fail_bounds_but_pass_without_them() {
        let ds = sample();
        let bounded = FilterSpec {
            elevation: Some(NumericRange::new(-100.0, 10_000.0)),
            ..Default::default()
        };
        assert_eq!(idents(&filter(&ds, &bounded)), vec!["A", "B", "D"]);

        let runway = FilterSpec {
            runway_length: Some(NumericRange::new(5000.0, 5000.0)),
            ..Default::default()
        };
        assert_eq!(idents(&filter(&ds, &runway)), vec!["D"]);
    }

    #[test]
    fn elevation_category_filter() {
        let ds = sample();
        let spec = FilterSpec {
            elevation_categories: [ElevationCategory::Medium].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(idents(&filter(&ds, &spec)), vec!["B"]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let ds = sample();
        let spec = FilterSpec {
            states: [RI].into_iter().collect(),
            ..Default::default()
        };
        assert!(filter(&ds, &spec).is_empty());
    }

    #[test]
    fn results_are_idempotent() {
        let ds = sample();
        let spec = FilterSpec {
            types: [AirportType::SmallAirport, AirportType::MediumAirport]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let out = filter(&ds, &spec);
        assert_eq!(out, filter(&ds, &spec));
        assert_eq!(idents(&out), vec!["A", "D"]);
    }

    /// Each constraint spelled out on its own, without going through
    /// `FilterSpec::matches`.
    fn passes_by_hand(rec: &AirportRecord, spec: &FilterSpec) -> bool {
        let in_bounds = |range: Option<NumericRange>, value: Option<f64>| match (range, value) {
            (None, _) => true,
            (Some(r), Some(v)) => r.min <= v && v <= r.max,
            (Some(_), None) => false,
        };
        let category = rec.elevation_ft.map(|e| {
            if e < 200.0 {
                ElevationCategory::Low
            } else if e < 1000.0 {
                ElevationCategory::Medium
            } else {
                ElevationCategory::High
            }
        });

        (spec.states.is_empty() || spec.states.iter().any(|s| *s == rec.state))
            && (spec.types.is_empty() || spec.types.iter().any(|t| *t == rec.airport_type))
            && (spec.elevation_categories.is_empty()
                || category.is_some_and(|c| spec.elevation_categories.contains(&c)))
            && in_bounds(spec.elevation, rec.elevation_ft)
            && in_bounds(spec.runway_length, rec.runway_length_ft)
    }

    fn mixed() -> Dataset {
        use AirportType::*;
        let with_runway = |ident, state, kind, elevation, runway| {
            let mut rec = airport(ident, state, kind, elevation);
            rec.runway_length_ft = runway;
            rec
        };
        Dataset::from_records(vec![
            with_runway("A", ME, SmallAirport, Some(100.0), Some(3000.0)),
            with_runway("B", VT, LargeAirport, Some(900.0), Some(8000.0)),
            with_runway("C", ME, Heliport, None, None),
            with_runway("D", MA, MediumAirport, Some(150.0), Some(5000.0)),
            with_runway("E", NH, SmallAirport, Some(1500.0), None),
            with_runway("F", ME, SmallAirport, None, Some(2500.0)),
            with_runway("G", CT, SeaplaneBase, Some(50.0), None),
            with_runway("H", ME, SmallAirport, Some(200.0), Some(4000.0)),
        ])
    }

    #[test]
    fn filter_agrees_with_hand_written_constraints() {
        let ds = mixed();
        let every_constraint = FilterSpec {
            states: [ME, MA].into_iter().collect(),
            types: [AirportType::SmallAirport, AirportType::MediumAirport]
                .into_iter()
                .collect(),
            elevation_categories: [ElevationCategory::Low, ElevationCategory::Medium]
                .into_iter()
                .collect(),
            elevation: Some(NumericRange::new(0.0, 500.0)),
            runway_length: Some(NumericRange::new(2000.0, 6000.0)),
        };
        let specs = [
            FilterSpec::default(),
            FilterSpec {
                runway_length: Some(NumericRange::new(2000.0, 5000.0)),
                ..Default::default()
            },
            FilterSpec {
                elevation: Some(NumericRange::new(100.0, 200.0)),
                ..Default::default()
            },
            FilterSpec {
                elevation_categories: [ElevationCategory::High].into_iter().collect(),
                ..Default::default()
            },
            FilterSpec {
                states: [ME].into_iter().collect(),
                runway_length: Some(NumericRange::new(0.0, 10_000.0)),
                ..Default::default()
            },
            every_constraint.clone(),
        ];

        for spec in &specs {
            let out = filter(&ds, spec);
            let expected: Vec<&AirportRecord> =
                ds.records.iter().filter(|r| passes_by_hand(r, spec)).collect();
            assert_eq!(idents(&out), idents(&expected), "{spec:?}");
        }

        assert_eq!(idents(&filter(&ds, &every_constraint)), vec!["A", "D", "H"]);
        assert_eq!(
            idents(&filter(&ds, &specs[1])),
            vec!["A", "D", "F", "H"]
        );
        assert_eq!(idents(&filter(&ds, &specs[2])), vec!["A", "D", "H"]);
        assert_eq!(idents(&filter(&ds, &specs[3])), vec!["E"]);
        assert_eq!(idents(&filter(&ds, &specs[4])), vec!["A", "F", "H"]);
    }

    #[test]
    fn validation_rejects_bad_ranges() {
        let spec = FilterSpec {
            elevation: Some(NumericRange::new(500.0, 100.0)),
            ..Default::default()
        };
        assert!(matches!(
            spec.validate(),
            Err(FilterError::InvertedRange { min, max, .. }) if min == 500.0 && max == 100.0
        ));

        let spec = FilterSpec {
            runway_length: Some(NumericRange::new(f64::NAN, 100.0)),
            ..Default::default()
        };
        assert!(matches!(spec.validate(), Err(FilterError::NonFiniteBound { .. })));
    }
}
