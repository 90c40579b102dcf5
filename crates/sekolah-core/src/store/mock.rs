//! In-memory mock content store for testing.
//!
//! Behaves like a tiny backend: rows inserted or deleted through the
//! trait are visible to later fetches, counters are adjusted the way the
//! stored procedures would, and individual write paths can be made to
//! fail to exercise the partial-failure windows.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use super::ContentStore;
use crate::error::{CoreError, Result};
use crate::models::{Agenda, Comment, Engageable, Informasi, ItemKind, LikeRecord, VisitRow};

#[derive(Default)]
struct MockData {
    agendas: Vec<Agenda>,
    informasi: Vec<Informasi>,
    likes: HashSet<(ItemKind, i64, String)>,
    counts: HashMap<(ItemKind, i64), i64>,
    visits: Vec<VisitRow>,
    next_like_id: i64,
    next_comment_id: i64,
    next_visit_id: i64,
}

pub struct MockStore {
    data: Mutex<MockData>,
    fail_increment: AtomicBool,
    fail_decrement: AtomicBool,
    fail_insert_comment: AtomicBool,
    comment_delay_ms: AtomicU64,
    list_fetch_calls: AtomicU32,
    like_lookup_calls: AtomicU32,
    comment_insert_calls: AtomicU32,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(MockData {
                next_like_id: 1,
                next_comment_id: 1,
                next_visit_id: 1,
                ..MockData::default()
            }),
            fail_increment: AtomicBool::new(false),
            fail_decrement: AtomicBool::new(false),
            fail_insert_comment: AtomicBool::new(false),
            comment_delay_ms: AtomicU64::new(0),
            list_fetch_calls: AtomicU32::new(0),
            like_lookup_calls: AtomicU32::new(0),
            comment_insert_calls: AtomicU32::new(0),
        }
    }

    // ===== Seeding =====

    pub fn with_agendas(self, rows: Vec<Agenda>) -> Self {
        {
            let mut data = self.data.lock();
            for row in &rows {
                data.counts.insert((ItemKind::Agenda, row.id), row.likes_count);
                data.next_comment_id = data
                    .next_comment_id
                    .max(row.comments.iter().map(|c| c.id + 1).max().unwrap_or(1));
            }
            data.agendas = rows;
        }
        self
    }

    pub fn with_informasi(self, rows: Vec<Informasi>) -> Self {
        {
            let mut data = self.data.lock();
            for row in &rows {
                data.counts
                    .insert((ItemKind::Informasi, row.id), row.likes_count);
                data.next_comment_id = data
                    .next_comment_id
                    .max(row.comments.iter().map(|c| c.id + 1).max().unwrap_or(1));
            }
            data.informasi = rows;
        }
        self
    }

    /// Seed a pre-existing like marker (e.g. from a previous session).
    pub fn with_like(self, kind: ItemKind, item_id: i64, ip: &str) -> Self {
        self.data.lock().likes.insert((kind, item_id, ip.to_string()));
        self
    }

    /// Seed an authoritative counter for an item that is not in any list.
    pub fn with_count(self, kind: ItemKind, item_id: i64, count: i64) -> Self {
        self.data.lock().counts.insert((kind, item_id), count);
        self
    }

    // ===== Failure / latency injection =====

    pub fn set_fail_increment(&self, fail: bool) {
        self.fail_increment.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_decrement(&self, fail: bool) {
        self.fail_decrement.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_insert_comment(&self, fail: bool) {
        self.fail_insert_comment.store(fail, Ordering::SeqCst);
    }

    pub fn set_comment_delay_ms(&self, ms: u64) {
        self.comment_delay_ms.store(ms, Ordering::SeqCst);
    }

    // ===== Inspection =====

    pub fn list_fetch_count(&self) -> u32 {
        self.list_fetch_calls.load(Ordering::SeqCst)
    }

    pub fn like_lookup_count(&self) -> u32 {
        self.like_lookup_calls.load(Ordering::SeqCst)
    }

    pub fn comment_insert_count(&self) -> u32 {
        self.comment_insert_calls.load(Ordering::SeqCst)
    }

    pub fn has_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> bool {
        self.data
            .lock()
            .likes
            .contains(&(kind, item_id, ip.to_string()))
    }

    pub fn stored_count(&self, kind: ItemKind, item_id: i64) -> i64 {
        *self.data.lock().counts.get(&(kind, item_id)).unwrap_or(&0)
    }

    pub fn push_visit(&self, row: VisitRow) {
        let mut data = self.data.lock();
        data.next_visit_id = data.next_visit_id.max(row.id + 1);
        data.visits.push(row);
    }

    pub fn visit(&self, visit_id: i64) -> Option<VisitRow> {
        self.data.lock().visits.iter().find(|v| v.id == visit_id).cloned()
    }
}

fn with_item<R>(
    data: &mut MockData,
    kind: ItemKind,
    item_id: i64,
    f: impl FnOnce(&mut dyn Engageable) -> R,
) -> Option<R> {
    match kind {
        ItemKind::Agenda => data
            .agendas
            .iter_mut()
            .find(|a| a.id == item_id)
            .map(|a| f(a)),
        ItemKind::Informasi => data
            .informasi
            .iter_mut()
            .find(|i| i.id == item_id)
            .map(|i| f(i)),
    }
}

fn all_comments_mut(data: &mut MockData, kind: ItemKind) -> Vec<&mut Vec<Comment>> {
    match kind {
        ItemKind::Agenda => data.agendas.iter_mut().map(|a| &mut a.comments).collect(),
        ItemKind::Informasi => data.informasi.iter_mut().map(|i| &mut i.comments).collect(),
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn fetch_agendas(&self, limit: u32) -> Result<Vec<Agenda>> {
        self.list_fetch_calls.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock();
        Ok(data.agendas.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_informasi(&self, limit: u32) -> Result<Vec<Informasi>> {
        self.list_fetch_calls.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock();
        Ok(data.informasi.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_likes_count(&self, kind: ItemKind, item_id: i64) -> Result<i64> {
        Ok(self.stored_count(kind, item_id))
    }

    async fn find_like(
        &self,
        kind: ItemKind,
        item_id: i64,
        ip: &str,
    ) -> Result<Option<LikeRecord>> {
        self.like_lookup_calls.fetch_add(1, Ordering::SeqCst);
        let found = self.has_like(kind, item_id, ip);
        Ok(found.then(|| LikeRecord {
            id: 0,
            item_id,
            ip_address: ip.to_string(),
        }))
    }

    async fn insert_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()> {
        let mut data = self.data.lock();
        data.next_like_id += 1;
        data.likes.insert((kind, item_id, ip.to_string()));
        Ok(())
    }

    async fn delete_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()> {
        self.data.lock().likes.remove(&(kind, item_id, ip.to_string()));
        Ok(())
    }

    async fn increment_likes(&self, kind: ItemKind, item_id: i64) -> Result<()> {
        if self.fail_increment.load(Ordering::SeqCst) {
            return Err(CoreError::Store {
                status: 500,
                message: "increment_likes failed".to_string(),
            });
        }
        let mut data = self.data.lock();
        let count = data.counts.entry((kind, item_id)).or_insert(0);
        *count += 1;
        let count = *count;
        with_item(&mut data, kind, item_id, |item| item.set_likes_count(count));
        Ok(())
    }

    async fn decrement_likes(&self, kind: ItemKind, item_id: i64) -> Result<()> {
        if self.fail_decrement.load(Ordering::SeqCst) {
            return Err(CoreError::Store {
                status: 500,
                message: "decrement_likes failed".to_string(),
            });
        }
        let mut data = self.data.lock();
        let count = data.counts.entry((kind, item_id)).or_insert(0);
        *count = (*count - 1).max(0);
        let count = *count;
        with_item(&mut data, kind, item_id, |item| item.set_likes_count(count));
        Ok(())
    }

    async fn insert_comment(
        &self,
        kind: ItemKind,
        item_id: i64,
        user_name: &str,
        content: &str,
    ) -> Result<Comment> {
        self.comment_insert_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_insert_comment.load(Ordering::SeqCst) {
            return Err(CoreError::Store {
                status: 500,
                message: "insert failed".to_string(),
            });
        }

        let delay = self.comment_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        let mut data = self.data.lock();
        data.next_comment_id += 1;
        let comment = Comment {
            id: data.next_comment_id - 1,
            user_name: user_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let stored = comment.clone();
        with_item(&mut data, kind, item_id, move |item| {
            item.comments_mut().push(stored)
        });
        Ok(comment)
    }

    async fn update_comment(
        &self,
        kind: ItemKind,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let mut data = self.data.lock();
        for comments in all_comments_mut(&mut data, kind) {
            if let Some(slot) = comments.iter_mut().find(|c| c.id == comment_id) {
                slot.content = content.to_string();
                slot.updated_at = Some(Utc::now());
                return Ok(slot.clone());
            }
        }
        Err(CoreError::NotFound(format!("comment {comment_id}")))
    }

    async fn delete_comment(&self, kind: ItemKind, comment_id: i64) -> Result<()> {
        let mut data = self.data.lock();
        for comments in all_comments_mut(&mut data, kind) {
            comments.retain(|c| c.id != comment_id);
        }
        Ok(())
    }

    async fn insert_visit(&self, ip: &str, page: &str) -> Result<VisitRow> {
        let now = Utc::now();
        let mut data = self.data.lock();
        data.next_visit_id += 1;
        let row = VisitRow {
            id: data.next_visit_id - 1,
            ip_address: ip.to_string(),
            page_visited: page.to_string(),
            visit_time: now,
            visit_date: now.date_naive(),
            exit_time: None,
            duration: None,
        };
        data.visits.push(row.clone());
        Ok(row)
    }

    async fn latest_open_visit(&self, ip: &str) -> Result<Option<VisitRow>> {
        let data = self.data.lock();
        Ok(data
            .visits
            .iter()
            .filter(|v| v.ip_address == ip && v.exit_time.is_none())
            .max_by_key(|v| v.visit_time)
            .cloned())
    }

    async fn close_visit(
        &self,
        visit_id: i64,
        exit_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<()> {
        let mut data = self.data.lock();
        let row = data
            .visits
            .iter_mut()
            .find(|v| v.id == visit_id)
            .ok_or_else(|| CoreError::NotFound(format!("visit {visit_id}")))?;
        row.exit_time = Some(exit_time);
        row.duration = Some(duration_secs);
        Ok(())
    }

    async fn count_visits_on(&self, date: NaiveDate) -> Result<u64> {
        let data = self.data.lock();
        Ok(data.visits.iter().filter(|v| v.visit_date == date).count() as u64)
    }

    async fn recent_durations(&self, limit: u32) -> Result<Vec<i64>> {
        let data = self.data.lock();
        let mut closed: Vec<&VisitRow> = data.visits.iter().filter(|v| v.duration.is_some()).collect();
        closed.sort_by_key(|v| std::cmp::Reverse(v.visit_time));
        Ok(closed
            .into_iter()
            .take(limit as usize)
            .filter_map(|v| v.duration)
            .collect())
    }

    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let data = self.data.lock();
        Ok(data
            .visits
            .iter()
            .filter(|v| v.visit_time > cutoff && v.exit_time.is_none())
            .count() as u64)
    }
}
