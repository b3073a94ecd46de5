use std::collections::BTreeSet;
use std::path::Path;

use crate::config::ExplorerConfig;
use crate::data::aggregate::{
    AggFn, Counts, Histogram, PivotTable, Summary, count_by, histogram, pivot, summarize, top_n,
};
use crate::data::filter::{FilterSpec, NumericRange, filter};
use crate::data::loader;
use crate::data::model::{
    AirportRecord, Attribute, CategoryValue, Dataset, ElevationCategory, Metric,
};
use crate::data::spatial::{Bucketized, bucketize, centroid};

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Everything the charts need, computed once per filter change.
#[derive(Debug, Clone)]
pub struct Views {
    pub summary: Summary,
    pub elevation_counts: Counts,
    pub top: Vec<AirportRecord>,
    pub pivot: PivotTable,
    pub histogram: Histogram,
    pub heat: Bucketized,
    pub center: Option<(f64, f64)>,
}

impl Views {
    /// True when no airport passed the filters.
    pub fn is_empty(&self) -> bool {
        self.summary.total == 0
    }
}

/// Analysis options chosen in the central panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub top_metric: Metric,
    pub top_n: usize,
    pub pivot_rows: Attribute,
    pub pivot_cols: Attribute,
    pub pivot_metric: Metric,
    pub pivot_agg: AggFn,
    pub heat_weight: Option<Metric>,
    pub histogram_bins: usize,
}

impl AnalysisOptions {
    fn from_config(config: &ExplorerConfig) -> Self {
        Self {
            top_metric: Metric::Elevation,
            top_n: config.top_n,
            pivot_rows: Attribute::State,
            pivot_cols: Attribute::Type,
            pivot_metric: Metric::Elevation,
            pivot_agg: AggFn::Count,
            heat_weight: None,
            histogram_bins: config.histogram_bins,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ExplorerConfig,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Sidebar selections.
    pub filters: FilterSpec,

    pub options: AnalysisOptions,

    /// Cached results; None when the filter spec is invalid.
    pub views: Option<Views>,

    /// Validation message for the current filter spec.
    pub filter_error: Option<String>,

    /// Elevation categories hidden from the pie chart.
    pub pie_hidden: BTreeSet<ElevationCategory>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ExplorerConfig) -> Self {
        let options = AnalysisOptions::from_config(&config);
        Self {
            config,
            dataset: None,
            filters: FilterSpec::default(),
            options,
            views: None,
            filter_error: None,
            pie_hidden: BTreeSet::new(),
            status_message: None,
        }
    }

    /// Load a table from disk, replacing the current dataset on success.
    pub fn load_path(&mut self, path: &Path) {
        match loader::load_file(path, &self.config.load_options()) {
            Ok(dataset) => {
                if dataset.is_empty() {
                    log::warn!("{} contains no New England airports", path.display());
                }
                log::info!("Loaded {} airports from {}", dataset.len(), path.display());
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and reset every filter.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = FilterSpec::default();
        self.pie_hidden.clear();
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Validate the filters and recompute the views after any change.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };

        if let Err(e) = self.filters.validate() {
            self.filter_error = Some(e.to_string());
            self.views = None;
            return;
        }
        self.filter_error = None;

        let subset = filter(ds, &self.filters);
        let opts = self.options;

        let heat = bucketize(&subset, opts.heat_weight);
        if heat.skipped > 0 {
            log::debug!("{} airports without usable coordinates or weight", heat.skipped);
        }
        let center = centroid(&heat.points);

        self.views = Some(Views {
            summary: summarize(&subset),
            elevation_counts: count_by(&subset, Attribute::ElevationCategory),
            top: top_n(&subset, opts.top_metric, opts.top_n)
                .into_iter()
                .cloned()
                .collect(),
            pivot: pivot(
                &subset,
                opts.pivot_rows,
                opts.pivot_cols,
                opts.pivot_metric,
                opts.pivot_agg,
            ),
            histogram: histogram(&subset, Metric::Elevation, opts.histogram_bins),
            heat,
            center,
        });
        log::debug!("Refiltered: {} of {} airports", subset.len(), ds.len());
    }

    /// Airports passing the current filters, in dataset order. Empty while
    /// the filter spec is invalid.
    pub fn visible_airports(&self) -> Vec<&AirportRecord> {
        match (&self.dataset, self.filter_error.is_none()) {
            (Some(ds), true) => filter(ds, &self.filters),
            _ => Vec::new(),
        }
    }

    /// Replace the analysis options, recomputing if anything changed.
    pub fn set_options(&mut self, options: AnalysisOptions) {
        if options != self.options {
            self.options = options;
            self.refilter();
        }
    }

    /// Is `value` currently selected? An empty selection means everything is.
    pub fn is_selected(&self, value: &CategoryValue) -> bool {
        match value {
            CategoryValue::State(s) => self.filters.states.is_empty() || self.filters.states.contains(s),
            CategoryValue::Type(t) => self.filters.types.is_empty() || self.filters.types.contains(t),
            CategoryValue::Elevation(c) => {
                self.filters.elevation_categories.is_empty()
                    || self.filters.elevation_categories.contains(c)
            }
        }
    }

    /// Toggle a single value in its attribute's filter.
    pub fn toggle_filter_value(&mut self, value: CategoryValue) {
        let Some(ds) = &self.dataset else {
            return;
        };
        match value {
            CategoryValue::State(s) => toggle(&mut self.filters.states, &ds.states, s),
            CategoryValue::Type(t) => toggle(&mut self.filters.types, &ds.types, t),
            CategoryValue::Elevation(c) => toggle(
                &mut self.filters.elevation_categories,
                &ds.elevation_categories,
                c,
            ),
        }
        self.refilter();
    }

    /// Remove every restriction on `attribute`.
    pub fn select_all(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::State => self.filters.states.clear(),
            Attribute::Type => self.filters.types.clear(),
            Attribute::ElevationCategory => self.filters.elevation_categories.clear(),
        }
        self.refilter();
    }

    pub fn set_range(&mut self, metric: Metric, range: Option<NumericRange>) {
        match metric {
            Metric::Elevation => self.filters.elevation = range,
            Metric::RunwayLength => self.filters.runway_length = range,
        }
        self.refilter();
    }

    pub fn toggle_pie_category(&mut self, category: ElevationCategory) {
        if !self.pie_hidden.remove(&category) {
            self.pie_hidden.insert(category);
        }
    }
}

/// Flip `value` in `selected`, where an empty set stands for all of `all`.
/// The last selected value cannot be removed.
fn toggle<T: Ord + Copy>(selected: &mut BTreeSet<T>, all: &BTreeSet<T>, value: T) {
    if selected.is_empty() {
        *selected = all.clone();
    }
    if selected.contains(&value) {
        if selected.len() > 1 {
            selected.remove(&value);
        }
    } else {
        selected.insert(value);
    }
    if selected == all {
        selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{AirportType, NewEnglandState, airport};
    use NewEnglandState::*;

    fn state_with_data() -> AppState {
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(vec![
            airport("A", ME, AirportType::SmallAirport, Some(100.0)),
            airport("B", VT, AirportType::LargeAirport, Some(900.0)),
            airport("C", MA, AirportType::Heliport, Some(1500.0)),
        ]));
        state
    }

    #[test]
    fn loading_computes_views_over_everything() {
        let state = state_with_data();
        assert_eq!(state.visible_airports().len(), 3);
        let views = state.views.as_ref().unwrap();
        assert_eq!(views.summary.total, 3);
        assert_eq!(views.top[0].ident, "C");
        assert_eq!(views.heat.points.len(), 3);
        assert!(views.center.is_some());
    }

    #[test]
    fn failed_load_keeps_current_dataset() {
        let mut state = state_with_data();
        state.load_path(Path::new("/nonexistent/airports.csv"));
        assert!(state.status_message.as_deref().is_some_and(|m| m.starts_with("Error")));
        assert_eq!(state.dataset.as_ref().map(Dataset::len), Some(3));
        assert!(state.views.is_some());
    }

    #[test]
    fn toggling_narrows_then_restores() {
        let mut state = state_with_data();
        state.toggle_filter_value(CategoryValue::State(VT));
        assert_eq!(state.filters.states, [MA, ME].into_iter().collect());
        let ids: Vec<&str> = state.visible_airports().iter().map(|r| r.ident.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert!(!state.is_selected(&CategoryValue::State(VT)));

        state.toggle_filter_value(CategoryValue::State(VT));
        assert!(state.filters.states.is_empty());
        assert_eq!(state.visible_airports().len(), 3);
    }

    #[test]
    fn last_selected_value_stays_selected() {
        let mut selected: BTreeSet<u8> = [2].into_iter().collect();
        let all: BTreeSet<u8> = [1, 2, 3].into_iter().collect();
        toggle(&mut selected, &all, 2);
        assert_eq!(selected, [2].into_iter().collect());
    }

    #[test]
    fn invalid_range_reports_error_instead_of_views() {
        let mut state = state_with_data();
        state.set_range(Metric::Elevation, Some(NumericRange::new(1000.0, 10.0)));
        assert!(state.filter_error.is_some());
        assert!(state.views.is_none());
        assert!(state.visible_airports().is_empty());

        state.set_range(Metric::Elevation, None);
        assert!(state.filter_error.is_none());
        assert!(state.views.is_some());
    }

    #[test]
    fn empty_selection_yields_empty_views() {
        let mut state = state_with_data();
        state.set_range(Metric::Elevation, Some(NumericRange::new(5000.0, 6000.0)));
        let views = state.views.as_ref().unwrap();
        assert!(views.is_empty());
        assert!(views.pivot.cells.is_empty());
        assert_eq!(views.center, None);
    }

    #[test]
    fn options_change_recomputes_ranking() {
        let mut state = state_with_data();
        let mut opts = state.options;
        opts.top_n = 1;
        state.set_options(opts);
        assert_eq!(state.views.as_ref().unwrap().top.len(), 1);
    }
}
