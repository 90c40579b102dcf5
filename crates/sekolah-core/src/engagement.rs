//! Like toggling and comment CRUD against the shared home state.
//!
//! The home state holds two list caches (agendas and informasi) plus an
//! optional detail projection of the item currently open. Every mutation
//! lands on all copies of the touched item in one lock acquisition, so
//! readers never observe the list and the detail view disagreeing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{CoreError, Result};
use crate::ip::IpResolver;
use crate::models::{Agenda, Comment, Engageable, Informasi, ItemKind, SelectedItem};
use crate::store::ContentStore;

/// Rows shown per section on the home page.
pub const HOME_LIMIT: u32 = 3;

/// Result of a like toggle, reflecting the state after the mutation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub new_count: i64,
}

/// Snapshot caches backing the home page and the detail view.
#[derive(Debug, Default, Clone)]
pub struct HomeState {
    pub agendas: Vec<Agenda>,
    pub informasi: Vec<Informasi>,
    pub selected: Option<SelectedItem>,
}

impl HomeState {
    /// Run `f` on every cached copy of the item: the list entry and, when
    /// the same item is open in the detail view, the projection too.
    /// Returns whether any copy was touched.
    fn apply_item(
        &mut self,
        kind: ItemKind,
        item_id: i64,
        mut f: impl FnMut(&mut dyn Engageable),
    ) -> bool {
        let mut touched = false;
        if let Some(sel) = self.selected.as_mut() {
            if sel.kind() == kind && sel.id() == item_id {
                f(sel.record_mut());
                touched = true;
            }
        }
        match kind {
            ItemKind::Agenda => {
                if let Some(row) = self.agendas.iter_mut().find(|a| a.id == item_id) {
                    f(row);
                    touched = true;
                }
            }
            ItemKind::Informasi => {
                if let Some(row) = self.informasi.iter_mut().find(|i| i.id == item_id) {
                    f(row);
                    touched = true;
                }
            }
        }
        touched
    }

    /// Run `f` on the comment list of every cached item of `kind`. Used
    /// when only the comment id is known, not which item owns it.
    fn apply_comments(&mut self, kind: ItemKind, mut f: impl FnMut(&mut Vec<Comment>)) {
        if let Some(sel) = self.selected.as_mut() {
            if sel.kind() == kind {
                f(sel.record_mut().comments_mut());
            }
        }
        match kind {
            ItemKind::Agenda => {
                for row in &mut self.agendas {
                    f(&mut row.comments);
                }
            }
            ItemKind::Informasi => {
                for row in &mut self.informasi {
                    f(&mut row.comments);
                }
            }
        }
    }

    /// Cached `likes_count`, preferring the detail projection.
    fn cached_likes(&self, kind: ItemKind, item_id: i64) -> Option<i64> {
        if let Some(sel) = &self.selected {
            if sel.kind() == kind && sel.id() == item_id {
                return Some(sel.record().likes_count());
            }
        }
        match kind {
            ItemKind::Agenda => self
                .agendas
                .iter()
                .find(|a| a.id == item_id)
                .map(|a| a.likes_count),
            ItemKind::Informasi => self
                .informasi
                .iter()
                .find(|i| i.id == item_id)
                .map(|i| i.likes_count),
        }
    }
}

/// Engagement operations over a content store and an IP resolver.
pub struct EngagementStore<S, I> {
    store: Arc<S>,
    ip: Arc<I>,
    state: Arc<RwLock<HomeState>>,
    comment_in_flight: AtomicBool,
}

impl<S: ContentStore, I: IpResolver> EngagementStore<S, I> {
    pub fn new(store: Arc<S>, ip: Arc<I>) -> Self {
        Self {
            store,
            ip,
            state: Arc::new(RwLock::new(HomeState::default())),
            comment_in_flight: AtomicBool::new(false),
        }
    }

    // ===== Snapshots =====

    pub fn agendas(&self) -> Vec<Agenda> {
        self.state.read().agendas.clone()
    }

    pub fn informasi(&self) -> Vec<Informasi> {
        self.state.read().informasi.clone()
    }

    pub fn selected(&self) -> Option<SelectedItem> {
        self.state.read().selected.clone()
    }

    // ===== Detail view =====

    /// Open the detail projection for a cached item. Returns false when
    /// the item is not in the matching list cache.
    pub fn open_detail(&self, kind: ItemKind, item_id: i64) -> bool {
        let mut state = self.state.write();
        let selected = match kind {
            ItemKind::Agenda => state
                .agendas
                .iter()
                .find(|a| a.id == item_id)
                .cloned()
                .map(SelectedItem::Agenda),
            ItemKind::Informasi => state
                .informasi
                .iter()
                .find(|i| i.id == item_id)
                .cloned()
                .map(SelectedItem::Informasi),
        };
        let opened = selected.is_some();
        if opened {
            state.selected = selected;
        }
        opened
    }

    pub fn close_detail(&self) {
        self.state.write().selected = None;
    }

    // ===== Fetching =====

    /// Fetch both home sections and replace the list caches. The detail
    /// projection, if open, is re-synced from the fresh rows; its local
    /// liked flag is kept because the store never reports it.
    pub async fn refresh_home(&self) -> Result<()> {
        let fetched = tokio::try_join!(
            self.store.fetch_agendas(HOME_LIMIT),
            self.store.fetch_informasi(HOME_LIMIT),
        );
        let (agendas, informasi) = match fetched {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "home fetch failed, keeping prior state");
                return Err(e);
            }
        };

        let mut state = self.state.write();
        state.agendas = agendas;
        state.informasi = informasi;
        resync_selected(&mut state);
        Ok(())
    }

    /// Re-fetch one section after a partial write failure, so the caches
    /// go back to server truth instead of guessing.
    async fn reconcile(&self, kind: ItemKind) {
        let result = match kind {
            ItemKind::Agenda => self
                .store
                .fetch_agendas(HOME_LIMIT)
                .await
                .map(|rows| self.state.write().agendas = rows),
            ItemKind::Informasi => self
                .store
                .fetch_informasi(HOME_LIMIT)
                .await
                .map(|rows| self.state.write().informasi = rows),
        };
        match result {
            Ok(()) => resync_selected(&mut self.state.write()),
            Err(e) => error!(table = %kind, error = %e, "reconciliation fetch failed"),
        }
    }

    // ===== Likes =====

    /// Toggle the visitor's like on an item. The visitor is identified by
    /// public IP; when that cannot be resolved the operation aborts
    /// before any store call.
    pub async fn toggle_like(&self, kind: ItemKind, item_id: i64) -> Result<LikeOutcome> {
        let ip = match self.ip.resolve().await {
            Ok(ip) if !ip.trim().is_empty() => ip,
            Ok(_) => {
                warn!(table = %kind, item_id, "ip service returned a blank address");
                return Err(CoreError::IpResolve("blank address".to_string()));
            }
            Err(e) => {
                warn!(table = %kind, item_id, error = %e, "could not resolve visitor ip");
                return Err(e);
            }
        };

        let existing = self.store.find_like(kind, item_id, &ip).await?;
        let liked = existing.is_none();

        if liked {
            self.store.insert_like(kind, item_id, &ip).await?;
            if let Err(e) = self.store.increment_likes(kind, item_id).await {
                error!(table = %kind, item_id, error = %e, "counter increment failed after like insert");
                self.reconcile(kind).await;
                return Err(e);
            }
        } else {
            self.store.delete_like(kind, item_id, &ip).await?;
            if let Err(e) = self.store.decrement_likes(kind, item_id).await {
                error!(table = %kind, item_id, error = %e, "counter decrement failed after like delete");
                self.reconcile(kind).await;
                return Err(e);
            }
        }

        // Compute the post-toggle count once, then apply the same value to
        // every cached copy. Items absent from the caches fall back to the
        // authoritative counter.
        let cached = self.state.read().cached_likes(kind, item_id);
        let new_count = match cached {
            Some(count) if liked => count + 1,
            Some(count) => (count - 1).max(0),
            None => self.store.fetch_likes_count(kind, item_id).await?,
        };

        self.state.write().apply_item(kind, item_id, |item| {
            item.set_likes_count(new_count);
            item.set_liked(liked);
        });

        debug!(table = %kind, item_id, liked, new_count, "like toggled");
        Ok(LikeOutcome { liked, new_count })
    }

    // ===== Comments =====

    /// Submit a comment. Name and content are trimmed and must be
    /// non-empty; at most one submission may be in flight at a time.
    pub async fn add_comment(
        &self,
        kind: ItemKind,
        item_id: i64,
        user_name: &str,
        content: &str,
    ) -> Result<Comment> {
        let name = user_name.trim();
        let text = content.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("name must not be empty"));
        }
        if text.is_empty() {
            return Err(CoreError::Validation("comment must not be empty"));
        }

        if self.comment_in_flight.swap(true, Ordering::SeqCst) {
            return Err(CoreError::Busy);
        }
        let inserted = self.store.insert_comment(kind, item_id, name, text).await;
        self.comment_in_flight.store(false, Ordering::SeqCst);
        let comment = inserted?;

        self.state.write().apply_item(kind, item_id, |item| {
            item.comments_mut().push(comment.clone());
        });

        debug!(table = %kind, item_id, comment_id = comment.id, "comment added");
        Ok(comment)
    }

    /// Replace a comment's content, keeping its position in the thread.
    pub async fn edit_comment(
        &self,
        kind: ItemKind,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let text = content.trim();
        if text.is_empty() {
            return Err(CoreError::Validation("comment must not be empty"));
        }

        let updated = self.store.update_comment(kind, comment_id, text).await?;

        self.state.write().apply_comments(kind, |comments| {
            if let Some(slot) = comments.iter_mut().find(|c| c.id == comment_id) {
                *slot = updated.clone();
            }
        });

        Ok(updated)
    }

    /// Delete a comment, drop it from the caches, and re-fetch the home
    /// sections as a backstop against drift.
    pub async fn delete_comment(&self, kind: ItemKind, comment_id: i64) -> Result<()> {
        self.store.delete_comment(kind, comment_id).await?;

        self.state.write().apply_comments(kind, |comments| {
            comments.retain(|c| c.id != comment_id);
        });

        if let Err(e) = self.refresh_home().await {
            // The delete itself succeeded; a failed backstop fetch only
            // leaves the caches one step behind.
            warn!(table = %kind, comment_id, error = %e, "post-delete refresh failed");
        }
        Ok(())
    }
}

/// Re-sync the detail projection from the fresh list rows, keeping the
/// local-only liked flag.
fn resync_selected(state: &mut HomeState) {
    let Some(sel) = &state.selected else {
        return;
    };
    let liked = sel.record().is_liked();
    let fresh = match sel {
        SelectedItem::Agenda(a) => state
            .agendas
            .iter()
            .find(|row| row.id == a.id)
            .cloned()
            .map(SelectedItem::Agenda),
        SelectedItem::Informasi(i) => state
            .informasi
            .iter()
            .find(|row| row.id == i.id)
            .cloned()
            .map(SelectedItem::Informasi),
    };
    if let Some(mut fresh) = fresh {
        fresh.record_mut().set_liked(liked);
        state.selected = Some(fresh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::StaticIpResolver;
    use crate::store::MockStore;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FailingIp;

    #[async_trait]
    impl IpResolver for FailingIp {
        async fn resolve(&self) -> Result<String> {
            Err(CoreError::IpResolve("connection refused".to_string()))
        }
    }

    fn comment(id: i64, user_name: &str, content: &str) -> Comment {
        Comment {
            id,
            user_name: user_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn agenda(id: i64, likes_count: i64, comments: Vec<Comment>) -> Agenda {
        Agenda {
            id,
            judul: format!("Agenda {id}"),
            tanggal: "2025-06-01".parse().unwrap(),
            waktu: None,
            lokasi: None,
            deskripsi: None,
            likes_count,
            is_liked: false,
            comments,
            post: None,
        }
    }

    fn engagement(store: MockStore) -> EngagementStore<MockStore, StaticIpResolver> {
        EngagementStore::new(Arc::new(store), Arc::new(StaticIpResolver::new("203.0.113.9")))
    }

    fn likes_in_both_caches(
        eng: &EngagementStore<MockStore, StaticIpResolver>,
        id: i64,
    ) -> (i64, i64) {
        let list = eng
            .agendas()
            .into_iter()
            .find(|a| a.id == id)
            .map(|a| a.likes_count)
            .unwrap();
        let detail = eng.selected().map(|s| s.record().likes_count()).unwrap();
        (list, detail)
    }

    #[tokio::test]
    async fn test_toggle_like_then_unlike() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 3, vec![])]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        assert!(eng.open_detail(ItemKind::Agenda, 1));

        let outcome = eng.toggle_like(ItemKind::Agenda, 1).await.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.new_count, 4);
        assert_eq!(likes_in_both_caches(&eng, 1), (4, 4));

        let outcome = eng.toggle_like(ItemKind::Agenda, 1).await.unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.new_count, 3);
        assert_eq!(likes_in_both_caches(&eng, 1), (3, 3));
    }

    #[tokio::test]
    async fn test_unlike_floors_at_zero() {
        // A stale counter of 0 alongside an existing like marker.
        let store = MockStore::new()
            .with_agendas(vec![agenda(1, 0, vec![])])
            .with_like(ItemKind::Agenda, 1, "203.0.113.9");
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();

        let outcome = eng.toggle_like(ItemKind::Agenda, 1).await.unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.new_count, 0);
    }

    #[tokio::test]
    async fn test_toggle_like_on_uncached_item_uses_authoritative_count() {
        let store = MockStore::new().with_count(ItemKind::Informasi, 99, 10);
        let eng = engagement(store);

        let outcome = eng.toggle_like(ItemKind::Informasi, 99).await.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.new_count, 11);
        assert!(eng.informasi().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_aborts_when_ip_unresolvable() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 3, vec![])]);
        let eng = EngagementStore::new(Arc::new(store), Arc::new(FailingIp));
        eng.refresh_home().await.unwrap();

        let err = eng.toggle_like(ItemKind::Agenda, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::IpResolve(_)));
        assert_eq!(eng.store.like_lookup_count(), 0);
        assert_eq!(eng.agendas()[0].likes_count, 3);
    }

    #[tokio::test]
    async fn test_increment_failure_reconciles_from_store() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 3, vec![])]);
        store.set_fail_increment(true);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        let fetches_before = eng.store.list_fetch_count();

        let err = eng.toggle_like(ItemKind::Agenda, 1).await.unwrap_err();
        assert!(matches!(err, CoreError::Store { .. }));
        // The join row was written before the counter call failed.
        assert!(eng.store.has_like(ItemKind::Agenda, 1, "203.0.113.9"));
        // One extra fetch for the reconciliation pass.
        assert_eq!(eng.store.list_fetch_count(), fetches_before + 1);
        assert_eq!(eng.agendas()[0].likes_count, 3);
    }

    #[tokio::test]
    async fn test_add_comment_appends_to_both_caches() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 0, vec![comment(1, "Ani", "Halo")])]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        assert!(eng.open_detail(ItemKind::Agenda, 1));

        let added = eng
            .add_comment(ItemKind::Agenda, 1, "  Budi ", " Selamat! ")
            .await
            .unwrap();
        assert_eq!(added.user_name, "Budi");
        assert_eq!(added.content, "Selamat!");

        let list = eng.agendas().remove(0);
        let detail = eng.selected().unwrap();
        assert_eq!(list.comments.len(), 2);
        assert_eq!(detail.record().comments().len(), 2);
        assert_eq!(list.comments[1].id, detail.record().comments()[1].id);
    }

    #[tokio::test]
    async fn test_add_comment_rejects_blank_fields_without_store_call() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 0, vec![])]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();

        let err = eng.add_comment(ItemKind::Agenda, 1, "   ", "Halo").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = eng.add_comment(ItemKind::Agenda, 1, "Ani", "  ").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(eng.store.comment_insert_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_comment_submissions_one_rejected_busy() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 0, vec![])]);
        store.set_comment_delay_ms(50);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();

        let (a, b) = tokio::join!(
            eng.add_comment(ItemKind::Agenda, 1, "Ani", "pertama"),
            eng.add_comment(ItemKind::Agenda, 1, "Budi", "kedua"),
        );
        let busy = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(CoreError::Busy)))
            .count();
        assert_eq!(busy, 1);
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(eng.agendas()[0].comments.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_comment_preserves_position() {
        let comments = vec![
            comment(1, "Ani", "satu"),
            comment(2, "Budi", "dua"),
            comment(3, "Citra", "tiga"),
        ];
        let store = MockStore::new().with_agendas(vec![agenda(1, 0, comments)]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        assert!(eng.open_detail(ItemKind::Agenda, 1));

        let updated = eng
            .edit_comment(ItemKind::Agenda, 2, "dua (revisi)")
            .await
            .unwrap();
        assert_eq!(updated.content, "dua (revisi)");
        assert!(updated.updated_at.is_some());

        let list = eng.agendas().remove(0);
        let ids: Vec<i64> = list.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(list.comments[1].content, "dua (revisi)");
        assert_eq!(list.comments[1].user_name, "Budi");

        let detail = eng.selected().unwrap();
        assert_eq!(detail.record().comments()[1].content, "dua (revisi)");
    }

    #[tokio::test]
    async fn test_delete_comment_removes_and_refetches() {
        let store = MockStore::new()
            .with_agendas(vec![agenda(1, 0, vec![comment(1, "Ani", "satu"), comment(2, "Budi", "dua")])]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        assert!(eng.open_detail(ItemKind::Agenda, 1));
        let fetches_before = eng.store.list_fetch_count();

        eng.delete_comment(ItemKind::Agenda, 1).await.unwrap();

        let list = eng.agendas().remove(0);
        assert_eq!(list.comments.len(), 1);
        assert_eq!(list.comments[0].id, 2);
        let detail = eng.selected().unwrap();
        assert_eq!(detail.record().comments().len(), 1);
        // The backstop refresh fetches both sections.
        assert_eq!(eng.store.list_fetch_count(), fetches_before + 2);
    }

    #[tokio::test]
    async fn test_refresh_resyncs_open_detail_but_keeps_liked_flag() {
        let store = MockStore::new().with_agendas(vec![agenda(1, 3, vec![])]);
        let eng = engagement(store);
        eng.refresh_home().await.unwrap();
        assert!(eng.open_detail(ItemKind::Agenda, 1));
        eng.toggle_like(ItemKind::Agenda, 1).await.unwrap();

        eng.refresh_home().await.unwrap();
        let detail = eng.selected().unwrap();
        assert_eq!(detail.record().likes_count(), 4);
        assert!(detail.record().is_liked());
    }
}
