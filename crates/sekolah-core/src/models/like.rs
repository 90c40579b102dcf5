use serde::{Deserialize, Serialize};

/// One per-visitor like marker. At most one row exists per
/// (kind, item, ip) triple, enforced by lookup-before-write rather
/// than a database constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub id: i64,
    pub item_id: i64,
    pub ip_address: String,
}
