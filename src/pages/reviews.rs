use log::{debug, info, warn};
use std::time::{Duration, Instant};

use super::{
    ConfirmOutcome, MutationTracker, Target, failure_message, run_tracked, success_message,
};
use crate::bus::{EventBus, Notice};
use crate::debounce::Debouncer;
use crate::filters::{FilterInput, FiltersPanel};
use crate::moderation::{ModerationAction, ModerationError, ModerationModal};
use crate::ports::{ReviewBackend, ReviewPage, ReviewStatistics};
use crate::query::{ReviewQuery, ReviewTab};
use crate::review::{Review, ReviewId};
use crate::selection::SelectionSet;
use crate::toolbar::{BulkActionsToolbar, ToolbarCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModalTarget {
    Single(ReviewId),
    Selection,
}

/// State and wiring of the reviews list screen.
///
/// Owns the explicit filters, the debounced search, the active tab, the
/// selection and the moderation modal, and dispatches confirmed commands to
/// the backend.
pub struct ReviewsPage<B: ReviewBackend> {
    backend: B,
    bus: EventBus,
    filters: ReviewQuery,
    pub panel: FiltersPanel,
    search_input: String,
    search: Debouncer<String>,
    tab: ReviewTab,
    selection: SelectionSet,
    modal: ModerationModal,
    modal_target: Option<ModalTarget>,
    current_review: Option<ReviewId>,
    mutations: MutationTracker,
    page: Option<ReviewPage>,
    statistics: Option<ReviewStatistics>,
    load_error: Option<String>,
    cursor: usize,
    fetch_count: usize,
}

impl<B: ReviewBackend> ReviewsPage<B> {
    pub fn new(backend: B, bus: EventBus, page_size: u32, search_delay: Duration) -> Self {
        Self {
            backend,
            bus,
            filters: ReviewQuery::with_limit(page_size),
            panel: FiltersPanel::default(),
            search_input: String::new(),
            search: Debouncer::new(search_delay),
            tab: ReviewTab::default(),
            selection: SelectionSet::default(),
            modal: ModerationModal::default(),
            modal_target: None,
            current_review: None,
            mutations: MutationTracker::default(),
            page: None,
            statistics: None,
            load_error: None,
            cursor: 0,
            fetch_count: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn filters(&self) -> &ReviewQuery {
        &self.filters
    }

    /// The query sent to the backend for the current state.
    pub fn query(&self) -> ReviewQuery {
        self.filters.effective(self.tab)
    }

    pub fn tab(&self) -> ReviewTab {
        self.tab
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn modal(&self) -> &ModerationModal {
        &self.modal
    }

    pub fn current_review(&self) -> Option<&ReviewId> {
        self.current_review.as_ref()
    }

    pub fn page(&self) -> Option<&ReviewPage> {
        self.page.as_ref()
    }

    pub fn reviews(&self) -> &[Review] {
        self.page
            .as_ref()
            .map(|page| page.reviews.as_slice())
            .unwrap_or(&[])
    }

    pub fn statistics(&self) -> Option<&ReviewStatistics> {
        self.statistics.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn is_mutating(&self) -> bool {
        self.mutations.is_mutating()
    }

    /// Number of loads issued so far, refetches included.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_review(&self) -> Option<&Review> {
        self.reviews().get(self.cursor)
    }

    pub fn load(&mut self) {
        self.fetch_count += 1;
        if !self.tab.shows_list() {
            if !self.selection.is_empty() {
                info!("cleared {} selected reviews on the statistics tab", self.selection.len());
            }
            self.selection.clear();
            self.page = None;
            self.cursor = 0;
            match self.backend.statistics() {
                Ok(stats) => {
                    self.statistics = Some(stats);
                    self.load_error = None;
                }
                Err(err) => {
                    warn!("statistics load failed: {}", err);
                    self.load_error = Some(err.message());
                }
            }
            return;
        }

        let query = self.query();
        debug!("reviews load (query={:?})", query);
        match self.backend.list(&query) {
            Ok(page) => {
                if page.reviews.is_empty() && page.total_pages > 0 && query.page > page.total_pages {
                    info!(
                        "page {} is past the end, stepping back to {}",
                        query.page, page.total_pages
                    );
                    self.filters.page = page.total_pages;
                    return self.load();
                }
                let dropped = self.selection.retain_loaded(page.ids());
                if dropped > 0 {
                    info!("dropped {} selected reviews no longer on the page", dropped);
                }
                self.cursor = self.cursor.min(page.reviews.len().saturating_sub(1));
                self.page = Some(page);
                self.load_error = None;
            }
            Err(err) => {
                warn!("reviews load failed: {}", err);
                self.page = None;
                self.load_error = Some(err.message());
            }
        }
    }

    pub fn refetch(&mut self) {
        self.load();
    }

    pub fn set_search_input(&mut self, text: &str, now: Instant) {
        self.search_input = text.to_string();
        self.search.push(text.to_string(), now);
    }

    pub fn push_search_char(&mut self, ch: char, now: Instant) {
        let mut text = self.search_input.clone();
        text.push(ch);
        self.set_search_input(&text, now);
    }

    pub fn pop_search_char(&mut self, now: Instant) {
        let mut text = self.search_input.clone();
        text.pop();
        self.set_search_input(&text, now);
    }

    pub fn search_pending(&self) -> bool {
        self.search.is_pending()
    }

    /// Advances the search debounce. Returns true when the settled search
    /// text changed the query (which also reloads the list).
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(text) = self.search.poll(now) else {
            return false;
        };
        let text = text.trim().to_string();
        if self.filters.search.as_deref().unwrap_or("") == text {
            return false;
        }
        self.apply_filter(FilterInput::Search(text)).is_ok()
    }

    pub fn apply_filter(&mut self, input: FilterInput) -> Result<(), ModerationError> {
        self.panel.apply(&mut self.filters, input)?;
        self.load();
        Ok(())
    }

    /// Applies the next value of the filters panel row under its cursor.
    pub fn cycle_selected_filter(&mut self) -> Result<(), ModerationError> {
        let input = self.panel.cycle(&self.filters);
        self.apply_filter(input)
    }

    pub fn clear_filters(&mut self) {
        self.panel.clear(&mut self.filters);
        self.search_input.clear();
        self.search.cancel();
        self.load();
    }

    pub fn has_active_filters(&self) -> bool {
        self.panel.has_active_filters(&self.filters)
    }

    pub fn set_tab(&mut self, tab: ReviewTab) {
        if self.tab == tab {
            return;
        }
        info!("tab switch (from={:?}, to={:?})", self.tab, tab);
        self.tab = tab;
        self.filters.page = 1;
        self.cursor = 0;
        self.load();
    }

    pub fn total_pages(&self) -> u32 {
        self.page.as_ref().map(|page| page.total_pages).unwrap_or(0)
    }

    pub fn next_page(&mut self) -> bool {
        if self.filters.page >= self.total_pages() {
            return false;
        }
        self.filters.page += 1;
        self.cursor = 0;
        self.load();
        true
    }

    pub fn prev_page(&mut self) -> bool {
        if self.filters.page <= 1 {
            return false;
        }
        self.filters.page -= 1;
        self.cursor = 0;
        self.load();
        true
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.reviews().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = next as usize;
    }

    pub fn toggle_selected(&mut self, id: &ReviewId) {
        if !self.tab.shows_list() {
            return;
        }
        let on_page = self.reviews().iter().any(|review| &review.id == id);
        if on_page {
            self.selection.toggle(id);
        }
    }

    pub fn toggle_at_cursor(&mut self) {
        if let Some(id) = self.cursor_review().map(|review| review.id.clone()) {
            self.toggle_selected(&id);
        }
    }

    pub fn toggle_all_on_page(&mut self) {
        if !self.tab.shows_list() {
            return;
        }
        let ids: Vec<ReviewId> = self.reviews().iter().map(|r| r.id.clone()).collect();
        self.selection.toggle_all(&ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Moderation and selection only act on reviews the list is showing.
    pub fn accepts_actions(&self) -> bool {
        self.tab.shows_list() && self.page.is_some()
    }

    pub fn request_single_action(&mut self, action: ModerationAction, id: &ReviewId) -> bool {
        if !self.accepts_actions() || self.modal.is_open() {
            return false;
        }
        if self.modal.open(action, 1).is_err() {
            return false;
        }
        self.current_review = Some(id.clone());
        self.modal_target = Some(ModalTarget::Single(id.clone()));
        true
    }

    pub fn request_action_at_cursor(&mut self, action: ModerationAction) -> bool {
        match self.cursor_review().map(|review| review.id.clone()) {
            Some(id) => self.request_single_action(action, &id),
            None => false,
        }
    }

    pub fn request_bulk_action(&mut self, action: ModerationAction) -> bool {
        if !self.accepts_actions() || self.modal.is_open() {
            return false;
        }
        if self.modal.open(action, self.selection.len()).is_err() {
            self.bus
                .notify(Notice::error(ModerationError::EmptySelection.to_string()));
            return false;
        }
        self.modal_target = Some(ModalTarget::Selection);
        true
    }

    /// Routes a bulk toolbar key. Returns false when the toolbar is hidden
    /// or the key is not bound.
    pub fn toolbar_key(&mut self, key: char) -> bool {
        if !self.accepts_actions() {
            return false;
        }
        match BulkActionsToolbar::dispatch(self.selection.len(), key) {
            Some(ToolbarCommand::Moderate(action)) => self.request_bulk_action(action),
            Some(ToolbarCommand::ClearSelection) => {
                self.clear_selection();
                true
            }
            None => false,
        }
    }

    pub fn modal_input(&mut self, ch: char) {
        self.modal.push_char(ch);
    }

    pub fn modal_backspace(&mut self) {
        self.modal.pop_char();
    }

    pub fn set_modal_reason(&mut self, reason: &str) {
        self.modal.set_reason(reason);
    }

    pub fn can_confirm(&self) -> bool {
        self.modal.can_confirm(self.is_mutating())
    }

    pub fn cancel_modal(&mut self) -> bool {
        if !self.modal.cancel(self.is_mutating()) {
            return false;
        }
        self.modal_target = None;
        self.current_review = None;
        true
    }

    pub fn confirm(&mut self) -> ConfirmOutcome {
        let Some(command) = self.modal.submit(self.is_mutating()) else {
            return ConfirmOutcome::Blocked;
        };

        let target = match self.modal_target.clone() {
            Some(ModalTarget::Single(id)) => Target::Single(id),
            Some(ModalTarget::Selection) if !self.selection.is_empty() => {
                Target::Bulk(self.selection.ids())
            }
            Some(ModalTarget::Selection) | None => {
                self.bus
                    .notify(Notice::error(ModerationError::EmptySelection.to_string()));
                self.modal.close();
                self.modal_target = None;
                return ConfirmOutcome::Aborted;
            }
        };

        match run_tracked(&self.backend, &mut self.mutations, &command, &target) {
            Ok(affected) => {
                self.bus
                    .notify(Notice::success(success_message(command.action, affected)));
                self.modal.close();
                self.modal_target = None;
                self.current_review = None;
                self.selection.clear();
                self.refetch();
                ConfirmOutcome::Completed
            }
            Err(err) => {
                self.bus.notify(Notice::error(failure_message(
                    &err,
                    command.action,
                    target.len(),
                )));
                self.modal.fail();
                ConfirmOutcome::Failed
            }
        }
    }
}
