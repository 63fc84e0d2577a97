//! Moderation screens: the reviews list orchestrator and the single review
//! detail page. Both share the mutation dispatch below.

pub mod detail;
pub mod reviews;

use log::{info, warn};
use std::collections::HashSet;

use crate::moderation::{ModerationAction, ModerationCommand};
use crate::ports::{
    ApproveData, BulkModerateRequest, PortError, PortResult, ReasonData, ReviewMutationPort,
};
use crate::review::ReviewId;

pub use detail::ReviewDetailPage;
pub use reviews::ReviewsPage;

/// What a moderation command is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Single(ReviewId),
    Bulk(Vec<ReviewId>),
}

impl Target {
    pub fn len(&self) -> usize {
        match self {
            Target::Single(_) => 1,
            Target::Bulk(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The five mutation entry points a page can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Approve,
    Reject,
    Flag,
    Delete,
    BulkModerate,
}

impl MutationKind {
    pub fn for_command(action: ModerationAction, target: &Target) -> Self {
        match (action, target) {
            (_, Target::Bulk(_)) => MutationKind::BulkModerate,
            (ModerationAction::Approve, Target::Single(_)) => MutationKind::Approve,
            (ModerationAction::Reject, Target::Single(_)) => MutationKind::Reject,
            (ModerationAction::Flag, Target::Single(_)) => MutationKind::Flag,
            (ModerationAction::Delete, Target::Single(_)) => MutationKind::Delete,
        }
    }
}

/// Pending flag per mutation entry point.
#[derive(Debug, Default)]
pub struct MutationTracker {
    pending: HashSet<MutationKind>,
}

impl MutationTracker {
    pub fn begin(&mut self, kind: MutationKind) {
        self.pending.insert(kind);
    }

    pub fn finish(&mut self, kind: MutationKind) {
        self.pending.remove(&kind);
    }

    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.pending.contains(&kind)
    }

    /// Logical OR of every entry point's pending flag.
    pub fn is_mutating(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Confirm is disabled (reason missing or a mutation is in flight).
    Blocked,
    /// Nothing left to act on; no mutation was issued.
    Aborted,
    Failed,
    Completed,
}

/// Sends one validated command through the matching mutation entry point
/// and returns how many reviews it touched.
pub fn execute<M: ReviewMutationPort + ?Sized>(
    backend: &M,
    command: &ModerationCommand,
    target: &Target,
) -> PortResult<u64> {
    info!(
        "moderate start (action={}, targets={}, reason_present={})",
        command.action,
        target.len(),
        command.reason.is_some()
    );
    let result = match target {
        Target::Single(id) => execute_single(backend, command, id).map(|_| 1),
        Target::Bulk(ids) => {
            if ids.is_empty() {
                return Err(PortError::Validation("No reviews selected".to_string()));
            }
            let request = BulkModerateRequest {
                review_ids: ids.clone(),
                action: command.action,
                reason: command.reason.clone(),
            };
            backend.bulk_moderate(&request).map(|result| result.affected)
        }
    };
    match &result {
        Ok(affected) => info!(
            "moderate done (action={}, affected={})",
            command.action, affected
        ),
        Err(err) => warn!("moderate failed (action={}): {}", command.action, err),
    }
    result
}

fn execute_single<M: ReviewMutationPort + ?Sized>(
    backend: &M,
    command: &ModerationCommand,
    id: &ReviewId,
) -> PortResult<()> {
    let reason = || ReasonData {
        reason: command.reason.clone().unwrap_or_default(),
    };
    match command.action {
        ModerationAction::Approve => backend
            .approve(
                id,
                ApproveData {
                    comment: command.reason.clone(),
                },
            )
            .map(|_| ()),
        ModerationAction::Reject => backend.reject(id, reason()).map(|_| ()),
        ModerationAction::Flag => backend.flag(id, reason()).map(|_| ()),
        ModerationAction::Delete => backend.delete(id),
    }
}

/// Runs [`execute`] with the entry point's pending flag raised.
pub(crate) fn run_tracked<M: ReviewMutationPort + ?Sized>(
    backend: &M,
    tracker: &mut MutationTracker,
    command: &ModerationCommand,
    target: &Target,
) -> PortResult<u64> {
    let kind = MutationKind::for_command(command.action, target);
    tracker.begin(kind);
    let result = execute(backend, command, target);
    tracker.finish(kind);
    result
}

pub(crate) fn failure_message(err: &PortError, action: ModerationAction, count: usize) -> String {
    let message = err.message();
    if message.is_empty() {
        let noun = if count > 1 { "reviews" } else { "review" };
        format!("Failed to {} {}", action, noun)
    } else {
        message
    }
}

pub(crate) fn success_message(action: ModerationAction, count: u64) -> String {
    if count == 1 {
        format!("Review {} successfully", action.past_tense())
    } else {
        format!("{} reviews {} successfully", count, action.past_tense())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording backend shared by the page tests.

    use std::cell::{Cell, RefCell};

    use crate::ports::*;
    use crate::query::ReviewQuery;
    use crate::review::{Review, ReviewId};
    use crate::store::ReviewCatalog;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Approve(ReviewId, ApproveData),
        Reject(ReviewId, ReasonData),
        Flag(ReviewId, ReasonData),
        Delete(ReviewId),
        Bulk(BulkModerateRequest),
    }

    #[derive(Default)]
    pub struct FakeBackend {
        pub catalog: RefCell<ReviewCatalog>,
        pub calls: RefCell<Vec<Call>>,
        pub fail_with: RefCell<Option<PortError>>,
        pub fail_loads: Cell<bool>,
        pub list_queries: RefCell<Vec<ReviewQuery>>,
    }

    impl FakeBackend {
        pub fn with_reviews(reviews: Vec<Review>) -> Self {
            Self {
                catalog: RefCell::new(ReviewCatalog::new(reviews)),
                ..Self::default()
            }
        }

        pub fn mutation_calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: Call) -> PortResult<()> {
            self.calls.borrow_mut().push(call);
            match self.fail_with.borrow().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    impl ReviewQueryPort for FakeBackend {
        fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage> {
            self.list_queries.borrow_mut().push(query.clone());
            if self.fail_loads.get() {
                return Err(PortError::Transport("connection refused".to_string()));
            }
            Ok(self.catalog.borrow().query(query))
        }

        fn get(&self, id: &ReviewId) -> PortResult<Review> {
            if self.fail_loads.get() {
                return Err(PortError::Transport("connection refused".to_string()));
            }
            self.catalog.borrow().get(id).cloned()
        }

        fn statistics(&self) -> PortResult<ReviewStatistics> {
            Ok(self.catalog.borrow().statistics())
        }
    }

    impl ReviewMutationPort for FakeBackend {
        fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review> {
            self.record(Call::Approve(id.clone(), data.clone()))?;
            self.catalog.borrow_mut().approve(id, "tester", data.comment)
        }

        fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
            self.record(Call::Reject(id.clone(), data.clone()))?;
            self.catalog.borrow_mut().reject(id, "tester", &data.reason)
        }

        fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
            self.record(Call::Flag(id.clone(), data.clone()))?;
            self.catalog.borrow_mut().flag(id, "tester", &data.reason)
        }

        fn delete(&self, id: &ReviewId) -> PortResult<()> {
            self.record(Call::Delete(id.clone()))?;
            self.catalog.borrow_mut().delete(id).map(|_| ())
        }

        fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult> {
            self.record(Call::Bulk(request.clone()))?;
            self.catalog.borrow_mut().bulk_moderate(request, "tester")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_point_selection() {
        let single = Target::Single(ReviewId::from("r1"));
        let bulk = Target::Bulk(vec![ReviewId::from("r1")]);
        assert_eq!(
            MutationKind::for_command(ModerationAction::Flag, &single),
            MutationKind::Flag
        );
        assert_eq!(
            MutationKind::for_command(ModerationAction::Flag, &bulk),
            MutationKind::BulkModerate
        );
    }

    #[test]
    fn test_tracker_is_logical_or() {
        let mut tracker = MutationTracker::default();
        assert!(!tracker.is_mutating());
        tracker.begin(MutationKind::Approve);
        tracker.begin(MutationKind::BulkModerate);
        tracker.finish(MutationKind::Approve);
        assert!(tracker.is_mutating());
        assert!(tracker.is_pending(MutationKind::BulkModerate));
        tracker.finish(MutationKind::BulkModerate);
        assert!(!tracker.is_mutating());
    }

    #[test]
    fn test_failure_message_fallback() {
        let err = PortError::Backend {
            status: 500,
            message: "  ".to_string(),
        };
        assert_eq!(
            failure_message(&err, ModerationAction::Reject, 3),
            "Failed to reject reviews"
        );
        let err = PortError::Validation("Reason too short".to_string());
        assert_eq!(
            failure_message(&err, ModerationAction::Reject, 1),
            "Reason too short"
        );
    }
}
