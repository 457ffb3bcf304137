use chrono::NaiveDate;

use crate::domain::{DateBounds, LayerQuery};

/// Dataset, variable and date range currently chosen in the explorer
#[derive(Debug, Clone)]
pub struct DatasetSelectionState {
    dataset: String,
    variable: Option<String>,
    variables: Vec<String>,
    bounds: Option<DateBounds>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    loaded: bool,
}

impl DatasetSelectionState {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            variable: None,
            variables: Vec::new(),
            bounds: None,
            start: None,
            end: None,
            loaded: false,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn variable(&self) -> Option<&str> {
        self.variable.as_deref()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub const fn bounds(&self) -> Option<DateBounds> {
        self.bounds
    }

    pub const fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub const fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether date bounds have been fetched at least once
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Replaces the variable list with the one fetched for `dataset` and
    /// selects its first entry. An empty list leaves everything unchanged.
    /// A different dataset drops the previous dataset's dates.
    pub fn apply_variables(&mut self, dataset: &str, variables: Vec<String>) -> bool {
        let Some(first) = variables.first().cloned() else {
            return false;
        };

        if self.dataset != dataset {
            self.bounds = None;
            self.start = None;
            self.end = None;
        }
        self.dataset = dataset.to_string();
        self.variables = variables;
        self.variable = Some(first);
        true
    }

    /// Local change only; ignores ids that are not valid for the dataset
    pub fn select_variable(&mut self, variable: &str) -> bool {
        if self.variable.as_deref() == Some(variable)
            || !self.variables.iter().any(|v| v == variable)
        {
            return false;
        }
        self.variable = Some(variable.to_string());
        true
    }

    /// Selects the variable `offset` places away in the list, wrapping
    pub fn cycle_variable(&mut self, forward: bool) -> bool {
        let len = self.variables.len();
        if len < 2 {
            return false;
        }
        let current = self
            .variable
            .as_ref()
            .and_then(|selected| self.variables.iter().position(|v| v == selected))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        let variable = self.variables[next].clone();
        self.select_variable(&variable)
    }

    /// Stores the dataset's supported range. A selection already made is
    /// clamped into it, otherwise both dates default to the most recent one.
    pub fn apply_bounds(&mut self, bounds: DateBounds) {
        self.bounds = Some(bounds);
        self.start = Some(self.start.map_or(bounds.max, |d| bounds.clamp(d)));
        self.end = Some(self.end.map_or(bounds.max, |d| bounds.clamp(d)));
        self.loaded = true;
    }

    /// Local change; dates are clamped into the supported range and put in
    /// order. Returns the range actually selected, or `None` before bounds
    /// are known or when nothing changed.
    pub fn select_date_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let bounds = self.bounds?;
        let start = bounds.clamp(start);
        let end = bounds.clamp(end);
        let (start, end) = if start <= end { (start, end) } else { (end, start) };

        if self.start == Some(start) && self.end == Some(end) {
            return None;
        }
        self.start = Some(start);
        self.end = Some(end);
        Some((start, end))
    }

    /// The layer request for the current selection, once it is complete
    pub fn layer_query(&self) -> Option<LayerQuery> {
        Some(LayerQuery {
            dataset: self.dataset.clone(),
            variable: self.variable.clone()?,
            start: self.start?,
            end: self.end?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        crate::domain::parse_api_date(value).unwrap_or_default()
    }

    fn loaded() -> DatasetSelectionState {
        let mut selection = DatasetSelectionState::new("LANDSAT8_SR");
        selection.apply_variables("LANDSAT8_SR", vec!["NDVI".into(), "NDWI".into()]);
        selection.apply_bounds(DateBounds::new(date("2013-01-01"), date("2023-01-01")));
        selection
    }

    #[test]
    fn test_new_dataset_replaces_variables_and_selects_first() {
        let mut selection = loaded();
        selection.select_variable("NDWI");

        assert!(selection.apply_variables("GRIDMET", vec!["pr".into(), "tmmx".into()]));
        assert_eq!(selection.dataset(), "GRIDMET");
        assert_eq!(selection.variables(), ["pr".to_string(), "tmmx".to_string()]);
        assert_eq!(selection.variable(), Some("pr"));
    }

    #[test]
    fn test_empty_variable_list_leaves_selection_unchanged() {
        let mut selection = loaded();
        assert!(!selection.apply_variables("BROKEN", Vec::new()));
        assert_eq!(selection.dataset(), "LANDSAT8_SR");
        assert_eq!(selection.variable(), Some("NDVI"));
        assert_eq!(selection.variables().len(), 2);
    }

    #[test]
    fn test_bounds_default_dates_to_max() {
        let selection = loaded();
        assert!(selection.is_loaded());
        assert_eq!(selection.start(), Some(date("2023-01-01")));
        assert_eq!(selection.end(), Some(date("2023-01-01")));
    }

    #[test]
    fn test_later_bounds_clamp_existing_dates() {
        let mut selection = loaded();
        selection.select_date_range(date("2014-03-01"), date("2020-05-01"));

        selection.apply_bounds(DateBounds::new(date("2015-01-01"), date("2019-12-31")));
        assert_eq!(selection.start(), Some(date("2015-01-01")));
        assert_eq!(selection.end(), Some(date("2019-12-31")));
    }

    #[test]
    fn test_new_dataset_drops_previous_dates() {
        let mut selection = loaded();
        selection.select_date_range(date("2014-03-01"), date("2020-05-01"));

        selection.apply_variables("GRIDMET", vec!["pr".into()]);
        assert_eq!(selection.bounds(), None);
        assert_eq!(selection.layer_query(), None);

        selection.apply_bounds(DateBounds::new(date("1979-01-01"), date("2024-06-30")));
        assert_eq!(selection.start(), Some(date("2024-06-30")));
        assert_eq!(selection.end(), Some(date("2024-06-30")));
    }

    #[test]
    fn test_date_range_is_clamped_and_ordered() {
        let mut selection = loaded();
        let selected = selection.select_date_range(date("2024-06-01"), date("2010-02-02"));
        assert_eq!(selected, Some((date("2013-01-01"), date("2023-01-01"))));

        let bounds = selection.bounds().unwrap_or_else(|| DateBounds::new(date("2000-01-01"), date("2000-01-01")));
        assert!(selection.start().is_some_and(|d| bounds.contains(d)));
        assert!(selection.end().is_some_and(|d| bounds.contains(d)));

        // Same range again is not a change
        assert_eq!(selection.select_date_range(date("2013-01-01"), date("2023-01-01")), None);
    }

    #[test]
    fn test_date_range_needs_bounds() {
        let mut selection = DatasetSelectionState::new("LANDSAT8_SR");
        assert_eq!(selection.select_date_range(date("2020-01-01"), date("2020-02-01")), None);
        assert_eq!(selection.layer_query(), None);
    }

    #[test]
    fn test_variable_selection_is_validated_and_cycles() {
        let mut selection = loaded();
        assert!(!selection.select_variable("EVI"));
        assert!(selection.cycle_variable(true));
        assert_eq!(selection.variable(), Some("NDWI"));
        assert!(selection.cycle_variable(true));
        assert_eq!(selection.variable(), Some("NDVI"));
        assert!(selection.cycle_variable(false));
        assert_eq!(selection.variable(), Some("NDWI"));
    }

    #[test]
    fn test_layer_query_for_complete_selection() {
        let query = loaded().layer_query();
        assert_eq!(
            query,
            Some(LayerQuery {
                dataset: "LANDSAT8_SR".to_string(),
                variable: "NDVI".to_string(),
                start: date("2023-01-01"),
                end: date("2023-01-01"),
            })
        );
    }
}
