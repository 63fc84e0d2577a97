use log::{info, warn};

use super::{
    ConfirmOutcome, MutationTracker, Target, failure_message, run_tracked, success_message,
};
use crate::bus::{EventBus, Notice, Route};
use crate::moderation::{ModerationAction, ModerationModal};
use crate::ports::ReviewBackend;
use crate::review::{Review, ReviewId};

/// Single review screen. Same actions as the list, always one target.
pub struct ReviewDetailPage<B: ReviewBackend> {
    backend: B,
    bus: EventBus,
    review_id: ReviewId,
    review: Option<Review>,
    load_error: Option<String>,
    modal: ModerationModal,
    mutations: MutationTracker,
    fetch_count: usize,
}

impl<B: ReviewBackend> ReviewDetailPage<B> {
    pub fn new(backend: B, bus: EventBus, review_id: ReviewId) -> Self {
        Self {
            backend,
            bus,
            review_id,
            review: None,
            load_error: None,
            modal: ModerationModal::default(),
            mutations: MutationTracker::default(),
            fetch_count: 0,
        }
    }

    pub fn review_id(&self) -> &ReviewId {
        &self.review_id
    }

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn modal(&self) -> &ModerationModal {
        &self.modal
    }

    pub fn is_mutating(&self) -> bool {
        self.mutations.is_mutating()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    pub fn load(&mut self) {
        self.fetch_count += 1;
        match self.backend.get(&self.review_id) {
            Ok(review) => {
                self.review = Some(review);
                self.load_error = None;
            }
            Err(err) => {
                warn!("review {} load failed: {}", self.review_id, err);
                self.review = None;
                self.load_error = Some(err.message());
            }
        }
    }

    pub fn request_action(&mut self, action: ModerationAction) -> bool {
        if self.modal.is_open() || self.review.is_none() {
            return false;
        }
        self.modal.open(action, 1).is_ok()
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
        self.modal.cancel(self.is_mutating())
    }

    /// Deleting leaves the page: the review no longer exists at this route,
    /// so success navigates back to the list instead of refetching.
    pub fn confirm(&mut self) -> ConfirmOutcome {
        let Some(command) = self.modal.submit(self.is_mutating()) else {
            return ConfirmOutcome::Blocked;
        };
        let target = Target::Single(self.review_id.clone());

        match run_tracked(&self.backend, &mut self.mutations, &command, &target) {
            Ok(affected) => {
                self.bus
                    .notify(Notice::success(success_message(command.action, affected)));
                self.modal.close();
                if command.action == ModerationAction::Delete {
                    info!("review {} deleted, leaving detail page", self.review_id);
                    self.review = None;
                    self.bus.navigate(Route::Reviews);
                } else {
                    self.load();
                }
                ConfirmOutcome::Completed
            }
            Err(err) => {
                self.bus
                    .notify(Notice::error(failure_message(&err, command.action, 1)));
                self.modal.fail();
                ConfirmOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::AppEvent;
    use crate::pages::fake::{Call, FakeBackend};
    use crate::review::ReviewStatus;
    use crate::review::tests::sample_review;

    fn backend() -> FakeBackend {
        FakeBackend::with_reviews(vec![sample_review("r1", ReviewStatus::Pending, 3)])
    }

    #[test]
    fn test_delete_navigates_to_list_without_refetch() {
        let backend = backend();
        let bus = EventBus::new();
        let events = bus.subscribe();
        let mut page = ReviewDetailPage::new(&backend, bus, ReviewId::from("r1"));
        page.load();
        let fetches = page.fetch_count();

        assert!(page.request_action(ModerationAction::Delete));
        assert_eq!(page.modal().target_count(), 1);
        assert_eq!(page.confirm(), ConfirmOutcome::Completed);

        assert_eq!(page.fetch_count(), fetches);
        assert_eq!(backend.mutation_calls(), vec![Call::Delete(ReviewId::from("r1"))]);
        let navigations: Vec<AppEvent> = events
            .drain()
            .into_iter()
            .filter(|event| matches!(event, AppEvent::Navigate(_)))
            .collect();
        assert_eq!(navigations, vec![AppEvent::Navigate(Route::Reviews)]);
    }

    #[test]
    fn test_reject_refetches_in_place() {
        let backend = backend();
        let mut page = ReviewDetailPage::new(&backend, EventBus::new(), ReviewId::from("r1"));
        page.load();
        let fetches = page.fetch_count();

        page.request_action(ModerationAction::Reject);
        assert_eq!(page.confirm(), ConfirmOutcome::Blocked);
        page.set_modal_reason("offensive language");
        assert_eq!(page.confirm(), ConfirmOutcome::Completed);

        assert_eq!(page.fetch_count(), fetches + 1);
        let review = page.review().unwrap();
        assert_eq!(review.status, ReviewStatus::Rejected);
        assert_eq!(
            review
                .moderation
                .as_ref()
                .and_then(|m| m.rejection_reason.as_deref()),
            Some("offensive language")
        );
    }

    #[test]
    fn test_missing_review_is_page_error() {
        let backend = backend();
        let mut page = ReviewDetailPage::new(&backend, EventBus::new(), ReviewId::from("nope"));
        page.load();
        assert_eq!(page.load_error(), Some("Review nope not found"));
        assert!(!page.request_action(ModerationAction::Approve));
    }
}
