//! Key list state and its reducer.
//!
//! `ListState` owns everything the key list view derives from: the full key
//! list, the active filter, paging, selection and the detail panel. All
//! transitions go through `ListState::reduce`, which performs no I/O; the
//! controller issues the backend calls and feeds the outcomes back in as
//! events.

use std::collections::BTreeSet;

use crate::core::models::filter::{FilterSpec, FilterToken};
use crate::core::models::key_record::{KeyQuery, KeyRecord};
use crate::core::services::filter_builder::build_filter_spec;
use crate::core::services::pager;

/// Page size used until the user picks another one.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Detail panel lifecycle: closed → loading → loaded | failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailPanel {
    #[default]
    Closed,
    Loading {
        query: KeyQuery,
    },
    Loaded {
        record: KeyRecord,
    },
    Failed {
        query: KeyQuery,
        message: String,
    },
}

/// Everything that can happen to the key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// User replaced the filter tokens.
    FilterChanged(Vec<FilterToken>),
    /// User asked to reload with the current filter.
    RefreshRequested,
    /// A fetch issued as `generation` returned.
    ListLoaded {
        generation: u64,
        keys: Vec<KeyRecord>,
    },
    /// A fetch issued as `generation` failed.
    ListFailed { generation: u64, message: String },
    /// 1-based page index.
    PageChanged(usize),
    PageSizeChanged(usize),
    /// Absolute indices into the full key list.
    SelectionChanged(Vec<usize>),
    SelectionCleared,
    DetailRequested(KeyQuery),
    DetailLoaded { query: KeyQuery, record: KeyRecord },
    DetailFailed { query: KeyQuery, message: String },
    DetailDismissed,
    /// A create or delete failed; the list is left as it was.
    MutationFailed(String),
}

/// A fetch the controller should perform: `None` spec means the unfiltered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub spec: Option<FilterSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    keys: Vec<KeyRecord>,
    tokens: Vec<FilterToken>,
    spec: FilterSpec,
    current_page: usize,
    page_size: usize,
    selection: BTreeSet<usize>,
    detail: DetailPanel,
    error: Option<String>,
    issued: u64,
    applied: u64,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ListState {
    /// Fresh state. The initial unfiltered fetch is already pending.
    pub fn new(page_size: usize) -> Self {
        Self {
            keys: Vec::new(),
            tokens: Vec::new(),
            spec: FilterSpec::new(),
            current_page: 1,
            page_size: page_size.max(1),
            selection: BTreeSet::new(),
            detail: DetailPanel::Closed,
            error: None,
            issued: 1,
            applied: 0,
        }
    }

    /// Apply one event and return the next state.
    pub fn reduce(mut self, event: ListEvent) -> Self {
        match event {
            ListEvent::FilterChanged(tokens) => {
                self.spec = build_filter_spec(&tokens);
                self.tokens = tokens;
                self.current_page = 1;
                self.selection.clear();
                self.issued += 1;
            }
            ListEvent::RefreshRequested => {
                self.issued += 1;
            }
            ListEvent::ListLoaded { generation, keys } => {
                if generation != self.issued {
                    tracing::debug!(generation, latest = self.issued, "dropping stale key list");
                    return self;
                }
                self.keys = keys;
                self.applied = generation;
                self.current_page = 1;
                self.selection.clear();
                self.error = None;
            }
            ListEvent::ListFailed {
                generation,
                message,
            } => {
                if generation != self.issued {
                    return self;
                }
                self.applied = generation;
                self.error = Some(message);
            }
            ListEvent::PageChanged(page) => {
                self.current_page = page.max(1);
            }
            ListEvent::PageSizeChanged(size) => {
                // current_page is kept, even when it now lies past the last page.
                self.page_size = size.max(1);
            }
            ListEvent::SelectionChanged(indices) => {
                let len = self.keys.len();
                self.selection = indices.into_iter().filter(|&i| i < len).collect();
            }
            ListEvent::SelectionCleared => {
                self.selection.clear();
            }
            ListEvent::DetailRequested(query) => {
                self.detail = DetailPanel::Loading { query };
            }
            ListEvent::DetailLoaded { query, record } => {
                if self.is_loading_detail(&query) {
                    self.detail = DetailPanel::Loaded { record };
                }
            }
            ListEvent::DetailFailed { query, message } => {
                if self.is_loading_detail(&query) {
                    self.detail = DetailPanel::Failed { query, message };
                }
            }
            ListEvent::DetailDismissed => {
                self.detail = DetailPanel::Closed;
            }
            ListEvent::MutationFailed(message) => {
                self.error = Some(message);
            }
        }
        self
    }

    fn is_loading_detail(&self, query: &KeyQuery) -> bool {
        matches!(&self.detail, DetailPanel::Loading { query: q } if q == query)
    }

    /// The fetch still outstanding for the latest generation, if any.
    pub fn fetch_request(&self) -> Option<FetchRequest> {
        if self.applied == self.issued {
            return None;
        }
        Some(FetchRequest {
            generation: self.issued,
            spec: (!self.spec.is_empty()).then(|| self.spec.clone()),
        })
    }

    pub fn keys(&self) -> &[KeyRecord] {
        &self.keys
    }

    pub fn tokens(&self) -> &[FilterToken] {
        &self.tokens
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        pager::total_pages(self.keys.len(), self.page_size)
    }

    /// Keys on the current page. Empty when the page is out of range.
    pub fn visible_keys(&self) -> &[KeyRecord] {
        pager::paginate(&self.keys, self.current_page, self.page_size)
    }

    /// Absolute index of the first visible key.
    pub fn page_offset(&self) -> usize {
        (self.current_page - 1).saturating_mul(self.page_size)
    }

    pub fn selected_keys(&self) -> Vec<&KeyRecord> {
        self.selection.iter().filter_map(|&i| self.keys.get(i)).collect()
    }

    pub fn detail(&self) -> &DetailPanel {
        &self.detail
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::filter::{FilterOperator, FilterProperty};
    use crate::core::models::key_record::{KeyClass, KeyType};

    fn key(n: usize) -> KeyRecord {
        KeyRecord {
            label: Some(format!("key-{n}")),
            key_class: KeyClass::SecretKey,
            key_type: KeyType::Aes,
            key_id: None,
            token: false,
            private: false,
            sensitive: false,
            extractable: false,
            local: false,
            modifiable: false,
            destroyable: false,
        }
    }

    fn keys(n: usize) -> Vec<KeyRecord> {
        (1..=n).map(key).collect()
    }

    fn loaded(n: usize, page_size: usize) -> ListState {
        let state = ListState::new(page_size);
        let generation = state.fetch_request().unwrap().generation;
        state.reduce(ListEvent::ListLoaded {
            generation,
            keys: keys(n),
        })
    }

    fn class_filter() -> Vec<FilterToken> {
        vec![FilterToken::new(
            FilterProperty::KeyClass,
            FilterOperator::Equals,
            "SECRET_KEY",
        )]
    }

    #[test]
    fn new_state_requests_unfiltered_fetch() {
        let state = ListState::default();
        let req = state.fetch_request().unwrap();
        assert!(req.spec.is_none());
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn loaded_list_is_paged() {
        let state = loaded(7, 5);
        assert!(state.fetch_request().is_none());
        assert_eq!(state.page_size(), 5);
        assert_eq!(state.total_pages(), 2);
        assert_eq!(state.visible_keys().len(), 5);
        assert_eq!(state.visible_keys()[0].label.as_deref(), Some("key-1"));

        let state = state.reduce(ListEvent::PageChanged(2));
        let labels: Vec<_> = state
            .visible_keys()
            .iter()
            .map(|k| k.label.clone().unwrap())
            .collect();
        assert_eq!(labels, vec!["key-6", "key-7"]);
        assert_eq!(state.page_offset(), 5);
    }

    #[test]
    fn filter_change_resets_page_and_selection() {
        let state = loaded(12, 5)
            .reduce(ListEvent::PageChanged(3))
            .reduce(ListEvent::SelectionChanged(vec![10, 11]));
        assert_eq!(state.selected_keys().len(), 2);

        let state = state.reduce(ListEvent::FilterChanged(class_filter()));
        assert_eq!(state.current_page(), 1);
        assert!(state.selected_keys().is_empty());
        let req = state.fetch_request().unwrap();
        assert_eq!(req.spec.unwrap().get("key_class"), Some("SECRET_KEY"));
    }

    #[test]
    fn clearing_filter_requests_unfiltered_list() {
        let state = loaded(3, 5)
            .reduce(ListEvent::FilterChanged(class_filter()))
            .reduce(ListEvent::FilterChanged(vec![]));
        assert!(state.fetch_request().unwrap().spec.is_none());
    }

    #[test]
    fn reload_replaces_list_and_resets_page() {
        let state = loaded(12, 5)
            .reduce(ListEvent::PageChanged(3))
            .reduce(ListEvent::SelectionChanged(vec![1]))
            .reduce(ListEvent::RefreshRequested);
        let generation = state.fetch_request().unwrap().generation;
        let state = state.reduce(ListEvent::ListLoaded {
            generation,
            keys: keys(4),
        });
        assert_eq!(state.keys().len(), 4);
        assert_eq!(state.current_page(), 1);
        assert!(state.selected_keys().is_empty());
    }

    #[test]
    fn stale_response_is_dropped() {
        let state = loaded(2, 5).reduce(ListEvent::FilterChanged(class_filter()));
        let old = state.fetch_request().unwrap().generation;
        let state = state.reduce(ListEvent::FilterChanged(vec![]));
        let latest = state.fetch_request().unwrap().generation;
        assert!(latest > old);

        let state = state.reduce(ListEvent::ListLoaded {
            generation: latest,
            keys: keys(9),
        });
        let state = state.reduce(ListEvent::ListLoaded {
            generation: old,
            keys: keys(1),
        });
        assert_eq!(state.keys().len(), 9);
    }

    #[test]
    fn failed_fetch_keeps_list_and_surfaces_message() {
        let state = loaded(3, 5).reduce(ListEvent::RefreshRequested);
        let generation = state.fetch_request().unwrap().generation;
        let state = state.reduce(ListEvent::ListFailed {
            generation,
            message: "Request failed: timeout".into(),
        });
        assert_eq!(state.keys().len(), 3);
        assert_eq!(state.error(), Some("Request failed: timeout"));
        assert!(state.fetch_request().is_none());
    }

    #[test]
    fn page_out_of_range_is_empty_not_error() {
        let state = loaded(3, 5).reduce(ListEvent::PageChanged(4));
        assert!(state.visible_keys().is_empty());
        assert_eq!(state.current_page(), 4);
    }

    #[test]
    fn page_size_change_keeps_current_page() {
        let state = loaded(12, 5)
            .reduce(ListEvent::PageChanged(3))
            .reduce(ListEvent::PageSizeChanged(50));
        assert_eq!(state.current_page(), 3);
        assert_eq!(state.total_pages(), 1);
        assert!(state.visible_keys().is_empty());
    }

    #[test]
    fn selection_is_replaced_not_merged() {
        let state = loaded(6, 5)
            .reduce(ListEvent::SelectionChanged(vec![0, 1]))
            .reduce(ListEvent::SelectionChanged(vec![4, 99]));
        assert_eq!(state.selected_keys().len(), 1);
        assert_eq!(state.selected_keys()[0].label.as_deref(), Some("key-5"));

        let state = state.reduce(ListEvent::SelectionCleared);
        assert!(state.selected_keys().is_empty());
    }

    #[test]
    fn detail_panel_lifecycle() {
        let record = key(1);
        let query = record.query();
        let state = loaded(1, 5);
        assert_eq!(state.detail(), &DetailPanel::Closed);

        let state = state.reduce(ListEvent::DetailRequested(query.clone()));
        assert_eq!(state.detail(), &DetailPanel::Loading { query: query.clone() });

        let state = state.reduce(ListEvent::DetailLoaded {
            query: query.clone(),
            record: record.clone(),
        });
        assert_eq!(state.detail(), &DetailPanel::Loaded { record });

        let state = state.reduce(ListEvent::DetailDismissed);
        assert_eq!(state.detail(), &DetailPanel::Closed);
    }

    #[test]
    fn late_detail_for_previous_key_is_ignored() {
        let first = key(1).query();
        let second = key(2).query();
        let state = loaded(2, 5)
            .reduce(ListEvent::DetailRequested(first.clone()))
            .reduce(ListEvent::DetailRequested(second.clone()))
            .reduce(ListEvent::DetailLoaded {
                query: first,
                record: key(1),
            });
        assert_eq!(state.detail(), &DetailPanel::Loading { query: second });
    }

    #[test]
    fn failed_detail_stays_until_new_request() {
        let query = key(1).query();
        let state = loaded(1, 5)
            .reduce(ListEvent::DetailRequested(query.clone()))
            .reduce(ListEvent::DetailFailed {
                query: query.clone(),
                message: "Key not found".into(),
            });
        assert!(matches!(
            state.detail(),
            DetailPanel::Failed { message, .. } if message == "Key not found"
        ));

        let state = state.reduce(ListEvent::DetailRequested(key(2).query()));
        assert!(matches!(state.detail(), DetailPanel::Loading { .. }));
    }

    #[test]
    fn mutation_failure_does_not_touch_list() {
        let before = loaded(3, 5);
        let after = before
            .clone()
            .reduce(ListEvent::MutationFailed("Invalid key size".into()));
        assert_eq!(after.keys(), before.keys());
        assert_eq!(after.error(), Some("Invalid key size"));
    }
}
