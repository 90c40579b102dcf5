//! Remote content store access.
//!
//! `ContentStore` is the single injected dependency behind every
//! engagement and visitor-stat operation; production code uses
//! [`SupabaseStore`], tests substitute [`MockStore`].

pub mod mock;
mod supabase;

pub use mock::MockStore;
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{Agenda, Comment, Informasi, ItemKind, LikeRecord, VisitRow};

#[async_trait]
pub trait ContentStore: Send + Sync {
    // ===== Home listing =====

    /// Active agenda rows with embedded comments and media, ascending by
    /// date, at most `limit` rows.
    async fn fetch_agendas(&self, limit: u32) -> Result<Vec<Agenda>>;

    /// Active informasi rows, newest first, at most `limit` rows.
    async fn fetch_informasi(&self, limit: u32) -> Result<Vec<Informasi>>;

    /// Authoritative `likes_count` of a single item.
    async fn fetch_likes_count(&self, kind: ItemKind, item_id: i64) -> Result<i64>;

    // ===== Like markers =====

    async fn find_like(&self, kind: ItemKind, item_id: i64, ip: &str)
        -> Result<Option<LikeRecord>>;

    async fn insert_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()>;

    async fn delete_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()>;

    /// `increment_likes(table_name, row_id)` stored procedure.
    async fn increment_likes(&self, kind: ItemKind, item_id: i64) -> Result<()>;

    /// `decrement_likes(table_name, row_id)` stored procedure.
    async fn decrement_likes(&self, kind: ItemKind, item_id: i64) -> Result<()>;

    // ===== Comments =====

    /// Insert and return the stored row (server-assigned id and timestamp).
    async fn insert_comment(
        &self,
        kind: ItemKind,
        item_id: i64,
        user_name: &str,
        content: &str,
    ) -> Result<Comment>;

    /// Update the content (and `updated_at`) of a comment; returns the
    /// stored row.
    async fn update_comment(&self, kind: ItemKind, comment_id: i64, content: &str)
        -> Result<Comment>;

    async fn delete_comment(&self, kind: ItemKind, comment_id: i64) -> Result<()>;

    // ===== Visitor stats =====

    async fn insert_visit(&self, ip: &str, page: &str) -> Result<VisitRow>;

    /// Newest visit by this IP that has no exit time yet.
    async fn latest_open_visit(&self, ip: &str) -> Result<Option<VisitRow>>;

    async fn close_visit(
        &self,
        visit_id: i64,
        exit_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<()>;

    async fn count_visits_on(&self, date: NaiveDate) -> Result<u64>;

    /// Durations (seconds) of the most recently closed visits, at most
    /// `limit` samples.
    async fn recent_durations(&self, limit: u32) -> Result<Vec<i64>>;

    /// Visits that started after `cutoff` and are still open.
    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}
