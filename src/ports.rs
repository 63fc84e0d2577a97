//! Capability traits the moderation pages are written against.
//!
//! The pages never know whether reviews live in the local store or behind
//! the marketplace API; both backends implement these traits and tests use
//! in-memory fakes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::moderation::ModerationAction;
use crate::query::ReviewQuery;
use crate::review::{Review, ReviewId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("Review {0} not found")]
    NotFound(ReviewId),
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Could not reach the review service: {0}")]
    Transport(String),
    #[error("Review storage error: {0}")]
    Storage(String),
}

impl PortError {
    /// Human-readable message, empty when the backend gave none.
    pub fn message(&self) -> String {
        self.to_string().trim().to_string()
    }
}

impl From<anyhow::Error> for PortError {
    fn from(err: anyhow::Error) -> Self {
        PortError::Storage(format!("{:#}", err))
    }
}

pub type PortResult<T> = Result<T, PortError>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl ReviewPage {
    pub fn empty(query: &ReviewQuery) -> Self {
        Self {
            reviews: Vec::new(),
            total: 0,
            page: query.page,
            limit: query.limit,
            total_pages: 0,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &ReviewId> {
        self.reviews.iter().map(|review| &review.id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatistics {
    pub total_reviews: u64,
    pub pending_reviews: u64,
    pub approved_reviews: u64,
    pub rejected_reviews: u64,
    pub flagged_reviews: u64,
    pub product_reviews: u64,
    pub vendor_reviews: u64,
    pub average_rating: f64,
    #[serde(default)]
    pub rating_distribution: BTreeMap<u8, u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApproveData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReasonData {
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkModerateRequest {
    pub review_ids: Vec<ReviewId>,
    pub action: ModerationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkModerateResult {
    pub affected: u64,
}

pub trait ReviewQueryPort {
    fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage>;
    fn get(&self, id: &ReviewId) -> PortResult<Review>;
    fn statistics(&self) -> PortResult<ReviewStatistics>;
}

pub trait ReviewMutationPort {
    fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review>;
    fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review>;
    fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review>;
    fn delete(&self, id: &ReviewId) -> PortResult<()>;
    fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult>;
}

/// Everything a moderation page needs from a backend.
pub trait ReviewBackend: ReviewQueryPort + ReviewMutationPort {}

impl<T: ReviewQueryPort + ReviewMutationPort> ReviewBackend for T {}

impl<T: ReviewQueryPort + ?Sized> ReviewQueryPort for &T {
    fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage> {
        (**self).list(query)
    }

    fn get(&self, id: &ReviewId) -> PortResult<Review> {
        (**self).get(id)
    }

    fn statistics(&self) -> PortResult<ReviewStatistics> {
        (**self).statistics()
    }
}

impl<T: ReviewMutationPort + ?Sized> ReviewMutationPort for &T {
    fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review> {
        (**self).approve(id, data)
    }

    fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        (**self).reject(id, data)
    }

    fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        (**self).flag(id, data)
    }

    fn delete(&self, id: &ReviewId) -> PortResult<()> {
        (**self).delete(id)
    }

    fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult> {
        (**self).bulk_moderate(request)
    }
}
