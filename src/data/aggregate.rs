use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::model::{AirportRecord, Attribute, CategoryValue, Metric};

// ---------------------------------------------------------------------------
// count_by
// ---------------------------------------------------------------------------

/// Group sizes for one categorical attribute.
///
/// Entries are ordered by count, largest first; equal counts keep the order
/// in which the group first appeared in the subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Counts {
    pub attribute: Attribute,
    pub entries: Vec<(CategoryValue, usize)>,
}

impl Counts {
    pub fn get(&self, value: &CategoryValue) -> Option<usize> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Count records per value of `attribute`. Records that lack the attribute
/// are not counted.
pub fn count_by(subset: &[&AirportRecord], attribute: Attribute) -> Counts {
    let mut entries: Vec<(CategoryValue, usize)> = Vec::new();
    let mut slot: HashMap<CategoryValue, usize> = HashMap::new();

    for value in subset.iter().filter_map(|r| r.category(attribute)) {
        match slot.get(&value) {
            Some(&i) => entries[i].1 += 1,
            None => {
                slot.insert(value, entries.len());
                entries.push((value, 1));
            }
        }
    }

    // Stable: ties stay in first-occurrence order.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Counts { attribute, entries }
}

// ---------------------------------------------------------------------------
// top_n
// ---------------------------------------------------------------------------

/// The `n` records with the largest `metric`, descending. Ties keep subset
/// order. Records without the metric sort after every ranked record, so the
/// result always has `min(n, subset.len())` entries.
pub fn top_n<'a>(subset: &[&'a AirportRecord], metric: Metric, n: usize) -> Vec<&'a AirportRecord> {
    let mut ranked: Vec<(&'a AirportRecord, Option<f64>)> = subset
        .iter()
        .map(|r| (*r, r.metric(metric).filter(|v| !v.is_nan())))
        .collect();
    ranked.sort_by(|a, b| match (a.1, b.1) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ranked.truncate(n);
    ranked.into_iter().map(|(r, _)| r).collect()
}

// ---------------------------------------------------------------------------
// pivot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggFn {
    #[default]
    Count,
    Mean,
    Sum,
}

impl AggFn {
    pub const ALL: [AggFn; 3] = [AggFn::Count, AggFn::Mean, AggFn::Sum];
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggFn::Count => "count",
            AggFn::Mean => "mean",
            AggFn::Sum => "sum",
        };
        f.write_str(s)
    }
}

/// Two-attribute cross tabulation.
///
/// `cells` only holds pairs that had contributing records; a missing key
/// means "no data", which is distinct from a measured zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_attribute: Attribute,
    pub col_attribute: Attribute,
    pub metric: Metric,
    pub agg: AggFn,
    pub rows: Vec<CategoryValue>,
    pub columns: Vec<CategoryValue>,
    pub cells: BTreeMap<(CategoryValue, CategoryValue), f64>,
}

impl PivotTable {
    pub fn get(&self, row: &CategoryValue, col: &CategoryValue) -> Option<f64> {
        self.cells.get(&(*row, *col)).copied()
    }
}

#[derive(Default)]
struct CellAcc {
    records: usize,
    values: usize,
    sum: f64,
}

impl CellAcc {
    fn compute(&self, agg: AggFn) -> Option<f64> {
        match agg {
            AggFn::Count => (self.records > 0).then_some(self.records as f64),
            AggFn::Sum => (self.values > 0).then_some(self.sum),
            AggFn::Mean => (self.values > 0).then(|| self.sum / self.values as f64),
        }
    }
}

/// Cross-tabulate `row_attr` against `col_attr`, aggregating `metric` per
/// cell with `agg`. `Count` counts records and ignores the metric.
pub fn pivot(
    subset: &[&AirportRecord],
    row_attr: Attribute,
    col_attr: Attribute,
    metric: Metric,
    agg: AggFn,
) -> PivotTable {
    let mut rows = BTreeSet::new();
    let mut columns = BTreeSet::new();
    let mut acc: BTreeMap<(CategoryValue, CategoryValue), CellAcc> = BTreeMap::new();

    for rec in subset {
        let (Some(row), Some(col)) = (rec.category(row_attr), rec.category(col_attr)) else {
            continue;
        };
        rows.insert(row);
        columns.insert(col);
        let cell = acc.entry((row, col)).or_default();
        cell.records += 1;
        if let Some(v) = rec.metric(metric).filter(|v| v.is_finite()) {
            cell.values += 1;
            cell.sum += v;
        }
    }

    let cells = acc
        .into_iter()
        .filter_map(|(key, cell)| cell.compute(agg).map(|v| (key, v)))
        .collect();

    PivotTable {
        row_attribute: row_attr,
        col_attribute: col_attr,
        metric,
        agg,
        rows: rows.into_iter().collect(),
        columns: columns.into_iter().collect(),
        cells,
    }
}

// ---------------------------------------------------------------------------
// Summary statistics and histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    /// Mean over airports with a known elevation.
    pub mean_elevation: Option<f64>,
    pub counts_by_type: Counts,
}

pub fn summarize(subset: &[&AirportRecord]) -> Summary {
    let (n, sum) = subset
        .iter()
        .filter_map(|r| r.elevation_ft)
        .filter(|v| v.is_finite())
        .fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));

    Summary {
        total: subset.len(),
        mean_elevation: (n > 0).then(|| sum / n as f64),
        counts_by_type: count_by(subset, Attribute::Type),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Equal-width histogram of `metric` over the present values.
/// The last bin is closed on the right.
pub fn histogram(subset: &[&AirportRecord], metric: Metric, bins: usize) -> Histogram {
    let values: Vec<f64> = subset
        .iter()
        .filter_map(|r| r.metric(metric))
        .filter(|v| v.is_finite())
        .collect();
    if bins == 0 || values.is_empty() {
        return Histogram::default();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range.abs() < f64::EPSILON {
        return Histogram {
            bins: vec![HistogramBin {
                start: min,
                end: max,
                count: values.len(),
            }],
        };
    }

    let width = range / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    Histogram { bins: out }
}
