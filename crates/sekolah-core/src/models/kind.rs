use std::fmt;

/// The two content kinds that support likes and comments.
///
/// The kinds differ only in table and foreign-key names, never in control
/// flow, so every engagement operation is parameterized by this descriptor
/// instead of duplicating per-kind code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Agenda,
    Informasi,
}

impl ItemKind {
    /// Main content table holding the denormalized `likes_count`.
    pub fn table(self) -> &'static str {
        match self {
            ItemKind::Agenda => "agenda",
            ItemKind::Informasi => "informasi",
        }
    }

    /// Join table holding one row per (item, ip) like marker.
    pub fn likes_table(self) -> &'static str {
        match self {
            ItemKind::Agenda => "agenda_likes",
            ItemKind::Informasi => "informasi_likes",
        }
    }

    pub fn comments_table(self) -> &'static str {
        match self {
            ItemKind::Agenda => "agenda_comments",
            ItemKind::Informasi => "informasi_comments",
        }
    }

    /// Foreign-key column used by both the likes and comments tables.
    pub fn fk_column(self) -> &'static str {
        match self {
            ItemKind::Agenda => "agenda_id",
            ItemKind::Informasi => "informasi_id",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agenda_descriptor() {
        let kind = ItemKind::Agenda;
        assert_eq!(kind.table(), "agenda");
        assert_eq!(kind.likes_table(), "agenda_likes");
        assert_eq!(kind.comments_table(), "agenda_comments");
        assert_eq!(kind.fk_column(), "agenda_id");
    }

    #[test]
    fn test_informasi_descriptor() {
        let kind = ItemKind::Informasi;
        assert_eq!(kind.table(), "informasi");
        assert_eq!(kind.likes_table(), "informasi_likes");
        assert_eq!(kind.comments_table(), "informasi_comments");
        assert_eq!(kind.fk_column(), "informasi_id");
    }
}
