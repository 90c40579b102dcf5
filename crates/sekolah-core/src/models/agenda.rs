use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Comment, Engageable, PostMedia};

/// A school agenda entry (event with a date, time, and location).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agenda {
    pub id: i64,
    pub judul: String,
    pub tanggal: NaiveDate,
    #[serde(default)]
    pub waktu: Option<String>,
    #[serde(default)]
    pub lokasi: Option<String>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    /// Denormalized counter maintained through the increment/decrement RPCs.
    #[serde(default)]
    pub likes_count: i64,
    /// Local-only flag; the store never reports it, so a fresh fetch
    /// always resets it to false.
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub post: Option<PostMedia>,
}

impl Agenda {
    /// URL of the thumbnail photo, when the linked post carries one.
    pub fn first_photo(&self) -> Option<&str> {
        self.post.as_ref().and_then(PostMedia::first_file)
    }
}

impl Engageable for Agenda {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_embedded_row() {
        let json = r#"{
            "id": 7,
            "judul": "Lomba Kompetensi Siswa",
            "tanggal": "2025-03-12",
            "waktu": "08:00",
            "lokasi": "Aula",
            "deskripsi": "Seleksi tingkat kota",
            "status": "aktif",
            "likes_count": 3,
            "comments": [
                {"id": 1, "user_name": "Ani", "content": "Selamat!", "created_at": "2025-03-01T09:30:00+00:00"}
            ],
            "post": {"galery": [{"foto": [{"file": "https://cdn.example/foto.jpg"}]}]}
        }"#;

        let agenda: Agenda = serde_json::from_str(json).unwrap();
        assert_eq!(agenda.id, 7);
        assert_eq!(agenda.likes_count, 3);
        assert!(!agenda.is_liked);
        assert_eq!(agenda.comments.len(), 1);
        assert_eq!(agenda.comments[0].user_name, "Ani");
        assert_eq!(agenda.first_photo(), Some("https://cdn.example/foto.jpg"));
    }

    #[test]
    fn test_deserialize_without_media_or_comments() {
        let json = r#"{"id": 1, "judul": "Rapat", "tanggal": "2025-01-05"}"#;
        let agenda: Agenda = serde_json::from_str(json).unwrap();
        assert_eq!(agenda.likes_count, 0);
        assert!(agenda.comments.is_empty());
        assert_eq!(agenda.first_photo(), None);
    }

    #[test]
    fn test_likes_count_floors_at_zero() {
        let json = r#"{"id": 1, "judul": "Rapat", "tanggal": "2025-01-05"}"#;
        let mut agenda: Agenda = serde_json::from_str(json).unwrap();
        agenda.set_likes_count(-3);
        assert_eq!(agenda.likes_count, 0);
    }
}
