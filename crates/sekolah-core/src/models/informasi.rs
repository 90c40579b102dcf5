use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Comment, Engageable, PostMedia};

/// A school announcement. `keterangan` is the badge category shown on
/// the landing page ("penting", "pengumuman", or free text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Informasi {
    pub id: i64,
    pub judul: String,
    pub isi: String,
    pub tanggal: NaiveDate,
    #[serde(default)]
    pub keterangan: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub post: Option<PostMedia>,
}

impl Informasi {
    pub fn first_photo(&self) -> Option<&str> {
        self.post.as_ref().and_then(PostMedia::first_file)
    }
}

impl Engageable for Informasi {
    fn id(&self) -> i64 {
        self.id
    }

    fn likes_count(&self) -> i64 {
        self.likes_count
    }

    fn set_likes_count(&mut self, count: i64) {
        self.likes_count = count.max(0);
    }

    fn is_liked(&self) -> bool {
        self.is_liked
    }

    fn set_liked(&mut self, liked: bool) {
        self.is_liked = liked;
    }

    fn comments(&self) -> &[Comment] {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }
}
