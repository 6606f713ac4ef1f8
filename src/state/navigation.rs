use crate::models::{FetchRequest, FilterCriteria};
use std::collections::HashMap;

/// Which tab is shown, under which filter, and which node is being expanded.
///
/// Filters are remembered per tab so switching back restores the last one.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NavigationState {
    tab_id: Option<String>,
    filter: FilterCriteria,
    expanding: Option<String>,
    filters_by_tab: HashMap<String, FilterCriteria>,
}

impl NavigationState {
    pub fn tab_id(&self) -> Option<&str> {
        self.tab_id.as_deref()
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn expanding(&self) -> Option<&str> {
        self.expanding.as_deref()
    }

    /// Returns `true` if the active tab changed.
    pub fn select_tab(&mut self, tab_id: &str) -> bool {
        if self.tab_id.as_deref() == Some(tab_id) {
            return false;
        }

        if let Some(prev) = self.tab_id.take() {
            self.filters_by_tab.insert(prev, self.filter.clone());
        }
        self.filter = self.filters_by_tab.get(tab_id).cloned().unwrap_or_default();
        self.tab_id = Some(tab_id.to_string());
        self.expanding = None;
        true
    }

    /// Returns `true` if the filter changed.
    pub fn set_filter(&mut self, filter: FilterCriteria) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.expanding = None;
        true
    }

    pub fn set_expanding(&mut self, node_id: Option<String>) {
        self.expanding = node_id;
    }

    /// Clear `expanding` if it still points at `node_id`.
    pub fn finish_expanding(&mut self, node_id: &str) {
        if self.expanding.as_deref() == Some(node_id) {
            self.expanding = None;
        }
    }

    /// Whether `(tab_id, filter)` is what the user is currently looking at.
    pub fn is_active(&self, tab_id: &str, filter: &FilterCriteria) -> bool {
        self.tab_id.as_deref() == Some(tab_id) && &self.filter == filter
    }

    pub fn root_request(&self) -> Option<FetchRequest> {
        let tab_id = self.tab_id.clone()?;
        Some(FetchRequest::root(tab_id, self.filter.clone()))
    }

    pub fn children_request(&self, parent_id: &str) -> Option<FetchRequest> {
        let tab_id = self.tab_id.clone()?;
        Some(FetchRequest::children(tab_id, parent_id, self.filter.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_same_tab_is_noop() {
        let mut nav = NavigationState::default();
        assert!(nav.select_tab("t1"));
        assert!(!nav.select_tab("t1"));
        assert_eq!(nav.tab_id(), Some("t1"));
    }

    #[test]
    fn test_filters_are_remembered_per_tab() {
        let mut nav = NavigationState::default();
        nav.select_tab("t1");
        assert!(nav.set_filter(FilterCriteria::new("status", "done")));

        nav.select_tab("t2");
        assert_eq!(nav.filter(), &FilterCriteria::default());

        nav.select_tab("t1");
        assert_eq!(nav.filter(), &FilterCriteria::new("status", "done"));
    }

    #[test]
    fn test_set_same_filter_is_noop() {
        let mut nav = NavigationState::default();
        nav.select_tab("t1");
        assert!(!nav.set_filter(FilterCriteria::default()));
    }

    #[test]
    fn test_expanding_cleared_on_reset_and_finish() {
        let mut nav = NavigationState::default();
        nav.select_tab("t1");
        nav.set_expanding(Some("A".into()));
        nav.finish_expanding("B");
        assert_eq!(nav.expanding(), Some("A"));
        nav.finish_expanding("A");
        assert_eq!(nav.expanding(), None);

        nav.set_expanding(Some("A".into()));
        nav.set_filter(FilterCriteria::new("x", "y"));
        assert_eq!(nav.expanding(), None);
    }

    #[test]
    fn test_requests_need_a_tab() {
        let mut nav = NavigationState::default();
        assert!(nav.root_request().is_none());
        nav.select_tab("t1");
        let req = nav.children_request("A").expect("tab selected");
        assert_eq!(req.parent_id.as_deref(), Some("A"));
        assert!(nav.is_active("t1", &FilterCriteria::default()));
        assert!(!nav.is_active("t2", &FilterCriteria::default()));
    }
}
