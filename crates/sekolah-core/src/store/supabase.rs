//! PostgREST-style client for the hosted Supabase backend.
//!
//! Every request carries the project anon key; nested relations are
//! resolved server-side through `select=` embeddings, and row counts use
//! `Prefer: count=exact` with the `Content-Range` response header.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::ContentStore;
use crate::config::CoreConfig;
use crate::error::{CoreError, Result};
use crate::models::{Agenda, Comment, Informasi, ItemKind, LikeRecord, VisitRow};

/// Accept header that makes PostgREST return a single JSON object
/// instead of a one-element array.
const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct SupabaseStore {
    base: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseStore {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            base: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn rpc_url(&self, proc: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base, proc)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(CoreError::Store {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_items<T: DeserializeOwned>(&self, kind: ItemKind, limit: u32) -> Result<Vec<T>> {
        let response = self
            .authed(self.client.get(self.rest_url(kind.table())))
            .query(&[
                ("select", item_select(kind)),
                ("status", "eq.aktif".to_string()),
                ("order", home_order(kind).to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn adjust_likes(&self, proc: &str, kind: ItemKind, item_id: i64) -> Result<()> {
        let response = self
            .authed(self.client.post(self.rpc_url(proc)))
            .json(&json!({ "table_name": kind.table(), "row_id": item_id }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    /// Exact row count for `table` under the given PostgREST filters.
    pub(crate) async fn count(&self, table: &str, filters: &[(&str, String)]) -> Result<u64> {
        let response = self
            .authed(self.client.get(self.rest_url(table)))
            .query(&[("select", "id")])
            .query(filters)
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await?;

        let response = Self::check(response).await?;
        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        parse_content_range(&range)
            .ok_or_else(|| CoreError::Serialization(format!("bad content-range header: {range:?}")))
    }
}

/// Embedded select clause for the home listing: the item row itself, its
/// comments (oldest first as stored), and the nested post media used for
/// the thumbnail.
fn item_select(kind: ItemKind) -> String {
    format!(
        "*,likes_count,comments:{}(id,user_name,content,created_at),post:post_id(galery(foto(file)))",
        kind.comments_table()
    )
}

fn home_order(kind: ItemKind) -> &'static str {
    match kind {
        // Upcoming events first; announcements newest first.
        ItemKind::Agenda => "tanggal.asc",
        ItemKind::Informasi => "tanggal.desc",
    }
}

/// `Content-Range` arrives as `0-0/42` (or `*/42` for empty ranges);
/// the part after the slash is the exact count.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[derive(Deserialize)]
struct LikesCountRow {
    likes_count: i64,
}

#[derive(Deserialize)]
struct DurationRow {
    duration: i64,
}

#[async_trait]
impl ContentStore for SupabaseStore {
    async fn fetch_agendas(&self, limit: u32) -> Result<Vec<Agenda>> {
        self.fetch_items(ItemKind::Agenda, limit).await
    }

    async fn fetch_informasi(&self, limit: u32) -> Result<Vec<Informasi>> {
        self.fetch_items(ItemKind::Informasi, limit).await
    }

    async fn fetch_likes_count(&self, kind: ItemKind, item_id: i64) -> Result<i64> {
        let response = self
            .authed(self.client.get(self.rest_url(kind.table())))
            .query(&[
                ("select", "likes_count".to_string()),
                ("id", format!("eq.{item_id}")),
            ])
            .header("Accept", PGRST_OBJECT)
            .send()
            .await?;

        let response = Self::check(response).await?;
        let row: LikesCountRow = response.json().await?;
        Ok(row.likes_count.max(0))
    }

    async fn find_like(
        &self,
        kind: ItemKind,
        item_id: i64,
        ip: &str,
    ) -> Result<Option<LikeRecord>> {
        let select = format!("id,ip_address,item_id:{}", kind.fk_column());
        let response = self
            .authed(self.client.get(self.rest_url(kind.likes_table())))
            .query(&[
                ("select", select),
                (kind.fk_column(), format!("eq.{item_id}")),
                ("ip_address", format!("eq.{ip}")),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let response = Self::check(response).await?;
        let mut rows: Vec<LikeRecord> = response.json().await?;
        Ok(rows.pop())
    }

    async fn insert_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()> {
        let mut body = serde_json::Map::new();
        body.insert(kind.fk_column().to_string(), json!(item_id));
        body.insert("ip_address".to_string(), json!(ip));

        let response = self
            .authed(self.client.post(self.rest_url(kind.likes_table())))
            .json(&body)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn delete_like(&self, kind: ItemKind, item_id: i64, ip: &str) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.rest_url(kind.likes_table())))
            .query(&[
                (kind.fk_column(), format!("eq.{item_id}")),
                ("ip_address", format!("eq.{ip}")),
            ])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn increment_likes(&self, kind: ItemKind, item_id: i64) -> Result<()> {
        self.adjust_likes("increment_likes", kind, item_id).await
    }

    async fn decrement_likes(&self, kind: ItemKind, item_id: i64) -> Result<()> {
        self.adjust_likes("decrement_likes", kind, item_id).await
    }

    async fn insert_comment(
        &self,
        kind: ItemKind,
        item_id: i64,
        user_name: &str,
        content: &str,
    ) -> Result<Comment> {
        let mut body = serde_json::Map::new();
        body.insert(kind.fk_column().to_string(), json!(item_id));
        body.insert("user_name".to_string(), json!(user_name));
        body.insert("content".to_string(), json!(content));

        let response = self
            .authed(self.client.post(self.rest_url(kind.comments_table())))
            .header("Prefer", "return=representation")
            .header("Accept", PGRST_OBJECT)
            .json(&body)
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn update_comment(
        &self,
        kind: ItemKind,
        comment_id: i64,
        content: &str,
    ) -> Result<Comment> {
        let response = self
            .authed(self.client.patch(self.rest_url(kind.comments_table())))
            .query(&[("id", format!("eq.{comment_id}"))])
            .header("Prefer", "return=representation")
            .header("Accept", PGRST_OBJECT)
            .json(&json!({
                "content": content,
                "updated_at": Utc::now().to_rfc3339(),
            }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_comment(&self, kind: ItemKind, comment_id: i64) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.rest_url(kind.comments_table())))
            .query(&[("id", format!("eq.{comment_id}"))])
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn insert_visit(&self, ip: &str, page: &str) -> Result<VisitRow> {
        let response = self
            .authed(self.client.post(self.rest_url("visitor_stats")))
            .header("Prefer", "return=representation")
            .header("Accept", PGRST_OBJECT)
            .json(&json!({ "ip_address": ip, "page_visited": page }))
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn latest_open_visit(&self, ip: &str) -> Result<Option<VisitRow>> {
        let response = self
            .authed(self.client.get(self.rest_url("visitor_stats")))
            .query(&[
                ("select", "*".to_string()),
                ("ip_address", format!("eq.{ip}")),
                ("exit_time", "is.null".to_string()),
                ("order", "visit_time.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let response = Self::check(response).await?;
        let mut rows: Vec<VisitRow> = response.json().await?;
        Ok(rows.pop())
    }

    async fn close_visit(
        &self,
        visit_id: i64,
        exit_time: DateTime<Utc>,
        duration_secs: i64,
    ) -> Result<()> {
        let response = self
            .authed(self.client.patch(self.rest_url("visitor_stats")))
            .query(&[("id", format!("eq.{visit_id}"))])
            .json(&json!({
                "exit_time": exit_time.to_rfc3339(),
                "duration": duration_secs,
            }))
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn count_visits_on(&self, date: NaiveDate) -> Result<u64> {
        self.count("visitor_stats", &[("visit_date", format!("eq.{date}"))])
            .await
    }

    async fn recent_durations(&self, limit: u32) -> Result<Vec<i64>> {
        let response = self
            .authed(self.client.get(self.rest_url("visitor_stats")))
            .query(&[
                ("select", "duration".to_string()),
                ("duration", "not.is.null".to_string()),
                ("order", "visit_time.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let response = Self::check(response).await?;
        let rows: Vec<DurationRow> = response.json().await?;
        Ok(rows.into_iter().map(|r| r.duration).collect())
    }

    async fn count_active_since(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.count(
            "visitor_stats",
            &[
                ("visit_time", format!("gt.{}", cutoff.to_rfc3339())),
                ("exit_time", "is.null".to_string()),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_select_embeds_kind_tables() {
        let select = item_select(ItemKind::Agenda);
        assert!(select.contains("comments:agenda_comments(id,user_name,content,created_at)"));
        assert!(select.contains("post:post_id(galery(foto(file)))"));

        let select = item_select(ItemKind::Informasi);
        assert!(select.contains("comments:informasi_comments("));
    }

    #[test]
    fn test_home_order_per_kind() {
        assert_eq!(home_order(ItemKind::Agenda), "tanggal.asc");
        assert_eq!(home_order(ItemKind::Informasi), "tanggal.desc");
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range("0-0/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range("0-0/*"), None);
        assert_eq!(parse_content_range(""), None);
    }

    #[test]
    fn test_rest_url_trims_trailing_slash() {
        let config = CoreConfig::new("https://xyz.supabase.co/", "anon");
        let store = SupabaseStore::new(&config);
        assert_eq!(store.rest_url("agenda"), "https://xyz.supabase.co/rest/v1/agenda");
        assert_eq!(
            store.rpc_url("increment_likes"),
            "https://xyz.supabase.co/rest/v1/rpc/increment_likes"
        );
    }
}
