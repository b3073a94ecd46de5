use super::model::{AirportRecord, Metric};

// ---------------------------------------------------------------------------
// Weighted points for the heatmap
// ---------------------------------------------------------------------------

/// One geolocated sample. Density is computed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bucketized {
    pub points: Vec<WeightedPoint>,
    /// Records dropped for missing or invalid coordinates (or a missing
    /// weight metric).
    pub skipped: usize,
}

/// Valid coordinates: present, finite and within the WGS84 ranges.
pub fn coordinates(record: &AirportRecord) -> Option<(f64, f64)> {
    let lat = record.latitude_deg.filter(|v| v.is_finite() && (-90.0..=90.0).contains(v))?;
    let lon = record.longitude_deg.filter(|v| v.is_finite() && (-180.0..=180.0).contains(v))?;
    Some((lat, lon))
}

/// Turn records into weighted points, one per record, in subset order.
///
/// With `weight == None` every point weighs 1; otherwise the metric value is
/// used and records without it are skipped.
pub fn bucketize(subset: &[&AirportRecord], weight: Option<Metric>) -> Bucketized {
    let mut out = Bucketized::default();
    for rec in subset {
        let w = match weight {
            None => Some(1.0),
            Some(metric) => rec.metric(metric).filter(|v| v.is_finite()),
        };
        match (coordinates(rec), w) {
            (Some((latitude, longitude)), Some(weight)) => out.points.push(WeightedPoint {
                latitude,
                longitude,
                weight,
            }),
            _ => out.skipped += 1,
        }
    }
    out
}

/// Unweighted mean position of `points`, marked on the map.
pub fn centroid(points: &[WeightedPoint]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.longitude).sum::<f64>() / n;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{airport, AirportType, NewEnglandState};

    #[test]
    fn unit_weights_and_invalid_coordinates_skipped() {
        let good = airport("A", NewEnglandState::MA, AirportType::SmallAirport, Some(10.0));
        let mut missing = good.clone();
        missing.latitude_deg = None;
        let mut out_of_range = good.clone();
        out_of_range.longitude_deg = Some(-200.0);
        let mut nan = good.clone();
        nan.latitude_deg = Some(f64::NAN);

        let b = bucketize(&[&good, &missing, &out_of_range, &nan], None);
        assert_eq!(b.points.len(), 1);
        assert_eq!(b.skipped, 3);
        assert_eq!(
            b.points[0],
            WeightedPoint {
                latitude: 43.0,
                longitude: -71.0,
                weight: 1.0
            }
        );
    }

    #[test]
    fn metric_weights() {
        let a = airport("A", NewEnglandState::MA, AirportType::SmallAirport, Some(250.0));
        let b = airport("B", NewEnglandState::MA, AirportType::SmallAirport, None);
        let out = bucketize(&[&a, &b], Some(Metric::Elevation));
        assert_eq!(out.points.len(), 1);
        assert_eq!(out.points[0].weight, 250.0);
        assert_eq!(out.skipped, 1);
    }

    #[test]
    fn centroid_of_points() {
        let pts = [
            WeightedPoint { latitude: 42.0, longitude: -72.0, weight: 1.0 },
            WeightedPoint { latitude: 44.0, longitude: -70.0, weight: 1.0 },
        ];
        assert_eq!(centroid(&pts), Some((43.0, -71.0)));
        assert_eq!(centroid(&[]), None);
    }
}
