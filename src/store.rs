use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::moderation::{ModerationAction, ModerationCommand};
use crate::ports::{
    ApproveData, BulkModerateRequest, BulkModerateResult, PortError, PortResult, ReasonData,
    ReviewMutationPort, ReviewPage, ReviewQueryPort, ReviewStatistics,
};
use crate::query::{ReviewQuery, SortField, SortOrder};
use crate::review::{ModerationAudit, Review, ReviewId, ReviewStatus, ReviewType};

pub const DIGIMALL_DIR: &str = ".digimall";
const DB_FILE: &str = "reviews.jsonl";
const MODERATION_LOG: &str = "moderation.jsonl";
const LOCK_FILE: &str = "store.lock";
pub const DEFAULT_MODERATOR: &str = "admin@digimall.local";

/// One line of the moderation audit log.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModerationRecord {
    pub id: String,
    pub review_id: ReviewId,
    pub action: ModerationAction,
    pub reason: Option<String>,
    pub moderator: String,
    pub timestamp: i64,
    pub bulk: bool,
}

/// In-memory set of reviews with the moderation rules applied to it.
#[derive(Debug, Default, Clone)]
pub struct ReviewCatalog {
    reviews: Vec<Review>,
}

impl ReviewCatalog {
    pub fn new(reviews: Vec<Review>) -> Self {
        Self { reviews }
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn get(&self, id: &ReviewId) -> PortResult<&Review> {
        self.reviews
            .iter()
            .find(|review| &review.id == id)
            .ok_or_else(|| PortError::NotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &ReviewId) -> PortResult<&mut Review> {
        self.reviews
            .iter_mut()
            .find(|review| &review.id == id)
            .ok_or_else(|| PortError::NotFound(id.clone()))
    }

    /// Inserts or replaces by id. Returns true for a new review.
    pub fn upsert(&mut self, review: Review) -> bool {
        match self.reviews.iter_mut().find(|existing| existing.id == review.id) {
            Some(existing) => {
                *existing = review;
                false
            }
            None => {
                self.reviews.push(review);
                true
            }
        }
    }

    pub fn query(&self, query: &ReviewQuery) -> ReviewPage {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut matching: Vec<&Review> = self
            .reviews
            .iter()
            .filter(|review| matches_query(review, query, needle.as_deref()))
            .collect();

        let field = query.sort_by.unwrap_or_default();
        let order = query.sort_order.unwrap_or_default();
        matching.sort_by(|a, b| {
            let ordering = compare_by(a, b, field);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let limit = query.limit.max(1);
        let page = query.page.max(1);
        let total = matching.len() as u64;
        let total_pages = total.div_ceil(u64::from(limit)) as u32;
        let offset = (page as usize - 1).saturating_mul(limit as usize);
        let reviews = matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect();

        ReviewPage {
            reviews,
            total,
            page,
            limit,
            total_pages,
        }
    }

    pub fn statistics(&self) -> ReviewStatistics {
        let mut stats = ReviewStatistics {
            total_reviews: self.reviews.len() as u64,
            ..ReviewStatistics::default()
        };
        let mut distribution: BTreeMap<u8, u64> = (1..=5).map(|rating| (rating, 0)).collect();
        let mut rating_sum = 0u64;

        for review in &self.reviews {
            match review.status {
                ReviewStatus::Pending => stats.pending_reviews += 1,
                ReviewStatus::Approved => stats.approved_reviews += 1,
                ReviewStatus::Rejected => stats.rejected_reviews += 1,
                ReviewStatus::Flagged => {}
            }
            if review.is_flagged || review.status == ReviewStatus::Flagged {
                stats.flagged_reviews += 1;
            }
            match review.review_type {
                ReviewType::Product => stats.product_reviews += 1,
                ReviewType::Vendor => stats.vendor_reviews += 1,
            }
            *distribution.entry(review.rating).or_default() += 1;
            rating_sum += u64::from(review.rating);
        }

        if stats.total_reviews > 0 {
            stats.average_rating = rating_sum as f64 / stats.total_reviews as f64;
        }
        stats.rating_distribution = distribution;
        stats
    }

    pub fn approve(
        &mut self,
        id: &ReviewId,
        moderator: &str,
        comment: Option<String>,
    ) -> PortResult<Review> {
        let review = self.get_mut(id)?;
        let now = Utc::now();
        review.status = ReviewStatus::Approved;
        review.is_flagged = false;
        review.moderation = Some(ModerationAudit {
            moderated_by: Some(moderator.to_string()),
            approved_at: Some(now),
            comment: comment.filter(|c| !c.trim().is_empty()),
            rejection_reason: None,
            flag_reason: None,
        });
        review.updated_at = now;
        Ok(review.clone())
    }

    pub fn reject(&mut self, id: &ReviewId, moderator: &str, reason: &str) -> PortResult<Review> {
        let reason = required_reason(ModerationAction::Reject, reason)?;
        let review = self.get_mut(id)?;
        let now = Utc::now();
        review.status = ReviewStatus::Rejected;
        let audit = review.moderation.get_or_insert_with(ModerationAudit::default);
        audit.moderated_by = Some(moderator.to_string());
        audit.approved_at = None;
        audit.rejection_reason = Some(reason);
        review.updated_at = now;
        Ok(review.clone())
    }

    pub fn flag(&mut self, id: &ReviewId, moderator: &str, reason: &str) -> PortResult<Review> {
        let reason = required_reason(ModerationAction::Flag, reason)?;
        let review = self.get_mut(id)?;
        let now = Utc::now();
        review.status = ReviewStatus::Flagged;
        review.is_flagged = true;
        let audit = review.moderation.get_or_insert_with(ModerationAudit::default);
        audit.moderated_by = Some(moderator.to_string());
        audit.flag_reason = Some(reason);
        review.updated_at = now;
        Ok(review.clone())
    }

    pub fn delete(&mut self, id: &ReviewId) -> PortResult<Review> {
        let idx = self
            .reviews
            .iter()
            .position(|review| &review.id == id)
            .ok_or_else(|| PortError::NotFound(id.clone()))?;
        Ok(self.reviews.remove(idx))
    }

    /// Applies one action to every id, or to none of them.
    pub fn bulk_moderate(
        &mut self,
        request: &BulkModerateRequest,
        moderator: &str,
    ) -> PortResult<BulkModerateResult> {
        let command = ModerationCommand::new(request.action, request.reason.as_deref())
            .map_err(|err| PortError::Validation(err.to_string()))?;
        let ids = unique_ids(&request.review_ids);
        if ids.is_empty() {
            return Err(PortError::Validation("No reviews selected".to_string()));
        }
        if let Some(missing) = ids.iter().find(|id| self.get(id).is_err()) {
            return Err(PortError::NotFound((*missing).clone()));
        }

        let reason = command.reason.clone().unwrap_or_default();
        for id in &ids {
            match command.action {
                ModerationAction::Approve => {
                    self.approve(id, moderator, command.reason.clone())?;
                }
                ModerationAction::Reject => {
                    self.reject(id, moderator, &reason)?;
                }
                ModerationAction::Flag => {
                    self.flag(id, moderator, &reason)?;
                }
                ModerationAction::Delete => {
                    self.delete(id)?;
                }
            }
        }
        Ok(BulkModerateResult {
            affected: ids.len() as u64,
        })
    }
}

fn required_reason(action: ModerationAction, reason: &str) -> PortResult<String> {
    ModerationCommand::new(action, Some(reason))
        .map_err(|err| PortError::Validation(err.to_string()))
        .map(|command| command.reason.unwrap_or_default())
}

fn unique_ids(ids: &[ReviewId]) -> Vec<&ReviewId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).collect()
}

fn matches_query(review: &Review, query: &ReviewQuery, needle: Option<&str>) -> bool {
    if let Some(status) = query.status
        && review.status != status
    {
        return false;
    }
    if let Some(review_type) = query.review_type
        && review.review_type != review_type
    {
        return false;
    }
    if query.min_rating.is_some_and(|min| review.rating < min) {
        return false;
    }
    if query.max_rating.is_some_and(|max| review.rating > max) {
        return false;
    }
    if query.needs_moderation == Some(true) && !review.needs_moderation() {
        return false;
    }
    if query.is_flagged == Some(true) && !review.is_flagged {
        return false;
    }
    match needle {
        Some(needle) => [
            review.title.as_deref().unwrap_or(""),
            review.content.as_str(),
            review.author.name.as_str(),
            review.target.name.as_str(),
        ]
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(needle)),
        None => true,
    }
}

fn compare_by(a: &Review, b: &Review, field: SortField) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortField::Rating => a.rating.cmp(&b.rating),
        SortField::HelpfulCount => a.helpful_count.cmp(&b.helpful_count),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub updated: usize,
}

/// Reviews kept as JSON lines under `.digimall/`, plus an append-only
/// moderation log.
pub struct FileStore {
    root_path: PathBuf,
    moderator: String,
}

struct StoreLock(File);

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.0) {
            warn!("Failed to release store lock: {}", err);
        }
    }
}

impl FileStore {
    /// Finds the nearest `.digimall` directory above the working directory,
    /// creating one in the working directory when there is none.
    pub fn new() -> Result<Self> {
        let start_dir = std::env::current_dir()?;
        Self::discover(&start_dir)
    }

    pub fn discover(start_dir: &Path) -> Result<Self> {
        let mut current = Some(start_dir);
        while let Some(dir) = current {
            if dir.join(DIGIMALL_DIR).is_dir() {
                return Self::at(dir);
            }
            current = dir.parent();
        }
        Self::at(start_dir)
    }

    pub fn at(root: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root.into();
        let data_dir = root_path.join(DIGIMALL_DIR);
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create {}", data_dir.display()))?;
        }
        Ok(Self {
            root_path,
            moderator: DEFAULT_MODERATOR.to_string(),
        })
    }

    pub fn with_moderator(mut self, moderator: impl Into<String>) -> Self {
        self.moderator = moderator.into();
        self
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root_path.join(DIGIMALL_DIR)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DB_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join(MODERATION_LOG)
    }

    fn lock(&self) -> Result<StoreLock> {
        let path = self.data_dir().join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", path.display()))?;
        Ok(StoreLock(file))
    }

    pub fn read_reviews(&self) -> Result<Vec<Review>> {
        read_jsonl(&self.db_path())
    }

    pub fn write_reviews(&self, reviews: &[Review]) -> Result<()> {
        let db_path = self.db_path();
        let tmp_path = db_path.with_extension("jsonl.tmp");
        let mut content = String::new();
        for review in reviews {
            content.push_str(&serde_json::to_string(review)?);
            content.push('\n');
        }
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &db_path)
            .with_context(|| format!("Failed to replace {}", db_path.display()))?;
        debug!("wrote {} reviews to {}", reviews.len(), db_path.display());
        Ok(())
    }

    pub fn read_history(&self) -> Result<Vec<ModerationRecord>> {
        read_jsonl(&self.log_path())
    }

    fn append(&self, record: &ModerationRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn record(&self, ids: &[&ReviewId], action: ModerationAction, reason: Option<&str>, bulk: bool) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        for id in ids {
            let record = ModerationRecord {
                id: Uuid::new_v4().to_string(),
                review_id: (*id).clone(),
                action,
                reason: reason.map(str::to_string),
                moderator: self.moderator.clone(),
                timestamp,
                bulk,
            };
            if let Err(err) = self.append(&record) {
                warn!("Failed to append moderation record for {}: {}", id, err);
            }
        }
    }

    fn load_catalog(&self) -> PortResult<ReviewCatalog> {
        Ok(ReviewCatalog::new(self.read_reviews()?))
    }

    fn mutate<T>(&self, apply: impl FnOnce(&mut ReviewCatalog) -> PortResult<T>) -> PortResult<T> {
        let _lock = self.lock()?;
        let mut catalog = self.load_catalog()?;
        let value = apply(&mut catalog)?;
        self.write_reviews(catalog.reviews())?;
        Ok(value)
    }

    pub fn import(&self, reviews: Vec<Review>) -> Result<ImportSummary> {
        for review in &reviews {
            review.validate()?;
        }
        let summary = self.mutate(|catalog| {
            let mut summary = ImportSummary::default();
            for review in reviews {
                if catalog.upsert(review) {
                    summary.added += 1;
                } else {
                    summary.updated += 1;
                }
            }
            Ok(summary)
        })?;
        info!(
            "import done (added={}, updated={})",
            summary.added, summary.updated
        );
        Ok(summary)
    }

    pub fn import_file(&self, path: &Path) -> Result<ImportSummary> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let reviews: Vec<Review> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse reviews from {}", path.display()))?;
        self.import(reviews)
    }
}

fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(item) => items.push(item),
            Err(err) => warn!("Skipping malformed line in {}: {}", path.display(), err),
        }
    }
    Ok(items)
}

impl ReviewQueryPort for FileStore {
    fn list(&self, query: &ReviewQuery) -> PortResult<ReviewPage> {
        Ok(self.load_catalog()?.query(query))
    }

    fn get(&self, id: &ReviewId) -> PortResult<Review> {
        self.load_catalog()?.get(id).cloned()
    }

    fn statistics(&self) -> PortResult<ReviewStatistics> {
        Ok(self.load_catalog()?.statistics())
    }
}

impl ReviewMutationPort for FileStore {
    fn approve(&self, id: &ReviewId, data: ApproveData) -> PortResult<Review> {
        let comment = data.comment.clone();
        let review = self.mutate(|catalog| catalog.approve(id, &self.moderator, comment))?;
        self.record(&[id], ModerationAction::Approve, data.comment.as_deref(), false);
        Ok(review)
    }

    fn reject(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        let review = self.mutate(|catalog| catalog.reject(id, &self.moderator, &data.reason))?;
        self.record(&[id], ModerationAction::Reject, Some(data.reason.trim()), false);
        Ok(review)
    }

    fn flag(&self, id: &ReviewId, data: ReasonData) -> PortResult<Review> {
        let review = self.mutate(|catalog| catalog.flag(id, &self.moderator, &data.reason))?;
        self.record(&[id], ModerationAction::Flag, Some(data.reason.trim()), false);
        Ok(review)
    }

    fn delete(&self, id: &ReviewId) -> PortResult<()> {
        self.mutate(|catalog| catalog.delete(id))?;
        self.record(&[id], ModerationAction::Delete, None, false);
        Ok(())
    }

    fn bulk_moderate(&self, request: &BulkModerateRequest) -> PortResult<BulkModerateResult> {
        let result = self.mutate(|catalog| catalog.bulk_moderate(request, &self.moderator))?;
        let ids = unique_ids(&request.review_ids);
        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty() && request.action != ModerationAction::Delete);
        self.record(&ids, request.action, reason, true);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::tests::sample_review;
    use chrono::Duration;

    fn catalog() -> ReviewCatalog {
        let mut reviews = vec![
            sample_review("r1", ReviewStatus::Pending, 5),
            sample_review("r2", ReviewStatus::Approved, 2),
            sample_review("r3", ReviewStatus::Flagged, 1),
            sample_review("r4", ReviewStatus::Rejected, 4),
        ];
        for (idx, review) in reviews.iter_mut().enumerate() {
            review.created_at += Duration::hours(idx as i64);
            review.helpful_count = (idx as u32) * 3;
        }
        reviews[1].review_type = ReviewType::Vendor;
        reviews[1].target.name = "Acme Electronics".to_string();
        ReviewCatalog::new(reviews)
    }

    fn ids(page: &ReviewPage) -> Vec<&str> {
        page.reviews.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let page = catalog().query(&ReviewQuery::default());
        assert_eq!(ids(&page), vec!["r4", "r3", "r2", "r1"]);
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_filters_combine() {
        let catalog = catalog();
        let query = ReviewQuery {
            min_rating: Some(2),
            max_rating: Some(4),
            sort_by: Some(SortField::Rating),
            sort_order: Some(SortOrder::Asc),
            ..ReviewQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query)), vec!["r2", "r4"]);

        let query = ReviewQuery {
            needs_moderation: Some(true),
            ..ReviewQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query)), vec!["r3", "r1"]);

        let query = ReviewQuery {
            review_type: Some(ReviewType::Vendor),
            ..ReviewQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query)), vec!["r2"]);
    }

    #[test]
    fn test_search_matches_target_name_case_insensitively() {
        let query = ReviewQuery {
            search: Some("ACME".to_string()),
            ..ReviewQuery::default()
        };
        assert_eq!(ids(&catalog().query(&query)), vec!["r2"]);
    }

    #[test]
    fn test_page_past_end_is_empty_with_total() {
        let query = ReviewQuery {
            page: 5,
            limit: 2,
            ..ReviewQuery::default()
        };
        let page = catalog().query(&query);
        assert!(page.reviews.is_empty());
        assert_eq!(page.total, 4);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_transitions_record_audit() {
        let mut catalog = catalog();
        let flagged = catalog.flag(&ReviewId::from("r1"), "mod", " fake ").unwrap();
        assert_eq!(flagged.status, ReviewStatus::Flagged);
        assert!(flagged.is_flagged);
        assert_eq!(
            flagged.moderation.as_ref().unwrap().flag_reason.as_deref(),
            Some("fake")
        );

        let approved = catalog
            .approve(&ReviewId::from("r1"), "mod", Some("looks fine".to_string()))
            .unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert!(!approved.is_flagged);
        let audit = approved.moderation.unwrap();
        assert!(audit.approved_at.is_some());
        assert_eq!(audit.comment.as_deref(), Some("looks fine"));
        assert_eq!(audit.flag_reason, None);
    }

    #[test]
    fn test_reject_requires_reason() {
        let mut catalog = catalog();
        let err = catalog.reject(&ReviewId::from("r1"), "mod", "  ").unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
        assert_eq!(
            catalog.get(&ReviewId::from("r1")).unwrap().status,
            ReviewStatus::Pending
        );
    }

    #[test]
    fn test_bulk_is_all_or_nothing() {
        let mut catalog = catalog();
        let request = BulkModerateRequest {
            review_ids: vec![ReviewId::from("r1"), ReviewId::from("ghost")],
            action: ModerationAction::Delete,
            reason: None,
        };
        let err = catalog.bulk_moderate(&request, "mod").unwrap_err();
        assert_eq!(err, PortError::NotFound(ReviewId::from("ghost")));
        assert_eq!(catalog.reviews().len(), 4);
    }

    #[test]
    fn test_bulk_collapses_duplicates() {
        let mut catalog = catalog();
        let request = BulkModerateRequest {
            review_ids: vec![
                ReviewId::from("r1"),
                ReviewId::from("r1"),
                ReviewId::from("r2"),
            ],
            action: ModerationAction::Delete,
            reason: None,
        };
        let result = catalog.bulk_moderate(&request, "mod").unwrap();
        assert_eq!(result.affected, 2);
        assert_eq!(catalog.reviews().len(), 2);
    }

    #[test]
    fn test_statistics_counts() {
        let stats = catalog().statistics();
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.pending_reviews, 1);
        assert_eq!(stats.approved_reviews, 1);
        assert_eq!(stats.rejected_reviews, 1);
        assert_eq!(stats.flagged_reviews, 1);
        assert_eq!(stats.vendor_reviews, 1);
        assert_eq!(stats.average_rating, 3.0);
        assert_eq!(stats.rating_distribution.get(&3), Some(&0));
        assert_eq!(stats.rating_distribution.get(&5), Some(&1));
    }

    #[test]
    fn test_file_store_persists_and_logs() {
        let dir = std::env::temp_dir()
            .join("digimall_store_tests")
            .join(Uuid::new_v4().to_string());
        let store = FileStore::at(&dir).unwrap().with_moderator("alice@digimall");
        let summary = store.import(catalog().reviews().to_vec()).unwrap();
        assert_eq!(summary, ImportSummary { added: 4, updated: 0 });

        store
            .reject(
                &ReviewId::from("r1"),
                ReasonData {
                    reason: "spam".to_string(),
                },
            )
            .unwrap();
        let reopened = FileStore::discover(&dir).unwrap();
        let review = reopened.get(&ReviewId::from("r1")).unwrap();
        assert_eq!(review.status, ReviewStatus::Rejected);

        let history = reopened.read_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].moderator, "alice@digimall");
        assert_eq!(history[0].reason.as_deref(), Some("spam"));

        fs::remove_dir_all(&dir).ok();
    }
}
