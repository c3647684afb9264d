use crate::core::errors::{HsmError, Result};
use crate::core::models::filter::FilterToken;
use crate::core::models::key_record::{CreateKeyParams, KeyRecord};
use crate::core::services::list_state::{ListEvent, ListState};
use crate::core::traits::key_directory::KeyDirectory;

/// Outcome of deleting a batch of keys, one backend call per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub requested: usize,
    /// Sum of `deleted_count` over the calls that succeeded.
    pub deleted_count: usize,
    pub failures: Vec<(KeyRecord, String)>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert a partial failure into an error carrying every failure message.
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        let detail = self
            .failures
            .iter()
            .map(|(key, msg)| format!("    → {key}: {msg}"))
            .collect::<Vec<_>>()
            .join("\n");
        Err(HsmError::DeleteIncomplete {
            requested: self.requested,
            deleted: self.requested - self.failures.len(),
            failed: self.failures.len(),
            detail,
        })
    }
}

/// Drives a `ListState` against a `KeyDirectory`.
///
/// Every state change is a `ListEvent` passed through the reducer; this type
/// only adds the backend calls. Errors are recorded in the state as a
/// user-visible message and also returned to the caller.
pub struct KeyListController<D: KeyDirectory> {
    directory: D,
    state: ListState,
}

impl<D: KeyDirectory> KeyListController<D> {
    pub fn new(directory: D, page_size: usize) -> Self {
        Self {
            directory,
            state: ListState::new(page_size),
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    fn dispatch(&mut self, event: ListEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(event);
    }

    /// Perform the outstanding fetch, if any.
    pub fn sync(&mut self) -> Result<()> {
        let Some(request) = self.state.fetch_request() else {
            return Ok(());
        };
        let result = match &request.spec {
            Some(spec) => {
                let fields: Vec<&str> = spec.iter().map(|(field, _)| field).collect();
                tracing::debug!(
                    generation = request.generation,
                    count = spec.len(),
                    ?fields,
                    "filtering keys"
                );
                self.directory.filter(spec)
            }
            None => {
                tracing::debug!(generation = request.generation, "listing keys");
                self.directory.list()
            }
        };
        match result {
            Ok(keys) => {
                tracing::info!(count = keys.len(), "key list loaded");
                self.dispatch(ListEvent::ListLoaded {
                    generation: request.generation,
                    keys,
                });
                Ok(())
            }
            Err(e) => {
                self.dispatch(ListEvent::ListFailed {
                    generation: request.generation,
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    /// Replace the filter and refetch. Page resets to 1, selection clears.
    pub fn apply_filter(&mut self, tokens: Vec<FilterToken>) -> Result<()> {
        self.dispatch(ListEvent::FilterChanged(tokens));
        self.sync()
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.dispatch(ListEvent::RefreshRequested);
        self.sync()
    }

    pub fn change_page(&mut self, page: usize) {
        self.dispatch(ListEvent::PageChanged(page));
    }

    pub fn change_page_size(&mut self, size: usize) {
        self.dispatch(ListEvent::PageSizeChanged(size));
    }

    /// Select rows of the visible page by 1-based row number.
    /// Rows outside the page are ignored.
    pub fn select_rows(&mut self, rows: &[usize]) {
        let offset = self.state.page_offset();
        let visible = self.state.visible_keys().len();
        let indices = rows
            .iter()
            .filter(|&&r| r >= 1 && r <= visible)
            .map(|&r| offset + r - 1)
            .collect();
        self.dispatch(ListEvent::SelectionChanged(indices));
    }

    /// Select every key on the visible page.
    pub fn select_page(&mut self) {
        let offset = self.state.page_offset();
        let indices = (offset..offset + self.state.visible_keys().len()).collect();
        self.dispatch(ListEvent::SelectionChanged(indices));
    }

    pub fn clear_selection(&mut self) {
        self.dispatch(ListEvent::SelectionCleared);
    }

    /// Open the detail panel for `record` and look up its full attributes.
    pub fn view_detail(&mut self, record: &KeyRecord) -> Result<()> {
        let query = record.query();
        self.dispatch(ListEvent::DetailRequested(query.clone()));
        match self.directory.find(&query) {
            Ok(detail) => {
                self.dispatch(ListEvent::DetailLoaded {
                    query,
                    record: detail,
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "key detail lookup failed");
                self.dispatch(ListEvent::DetailFailed {
                    query,
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.dispatch(ListEvent::DetailDismissed);
    }

    /// Reload after a mutation that went through. A failed reload stays in
    /// the state as `ListFailed` and never turns the mutation into an error.
    fn reload_after_mutation(&mut self) {
        if let Err(e) = self.refresh() {
            tracing::warn!(error = %e, "key list reload failed after mutation");
        }
    }

    /// Generate a key and reload the list. Returns the backend's message.
    pub fn create_key(&mut self, params: &CreateKeyParams) -> Result<String> {
        match self.directory.create(params) {
            Ok(resp) if resp.success => {
                tracing::info!(label = %params.label, "key created");
                self.reload_after_mutation();
                Ok(resp.message)
            }
            Ok(resp) => {
                self.dispatch(ListEvent::MutationFailed(resp.message.clone()));
                Err(HsmError::ValidationError {
                    detail: resp.message,
                })
            }
            Err(e) => {
                self.dispatch(ListEvent::MutationFailed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Delete each of `records`. Failures do not stop the remaining deletes;
    /// they are collected in the report. The list is reloaded when at least
    /// one delete went through.
    pub fn delete_keys(&mut self, records: &[KeyRecord]) -> Result<DeleteReport> {
        let mut report = DeleteReport {
            requested: records.len(),
            deleted_count: 0,
            failures: Vec::new(),
        };

        for record in records {
            match self.directory.delete(&record.query()) {
                Ok(resp) if resp.success => report.deleted_count += resp.deleted_count,
                Ok(resp) => report.failures.push((record.clone(), resp.message)),
                Err(e @ HsmError::AuthenticationExpired) => return Err(e),
                Err(e) => report.failures.push((record.clone(), e.user_message())),
            }
        }

        if report.failures.len() < report.requested {
            self.reload_after_mutation();
        }
        // After the reload, which clears the error on success.
        if !report.is_complete() {
            let message = format!(
                "{} of {} delete(s) failed",
                report.failures.len(),
                report.requested
            );
            tracing::warn!(%message);
            self.dispatch(ListEvent::MutationFailed(message));
        }
        Ok(report)
    }
}
