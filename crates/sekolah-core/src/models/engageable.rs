use super::{Agenda, Comment, Informasi, ItemKind};

/// Uniform access to the mutable engagement fields of an item. The two
/// kinds carry different content columns but identical engagement state,
/// so every cache mutation goes through this trait instead of per-kind
/// code paths.
pub trait Engageable {
    fn id(&self) -> i64;
    fn likes_count(&self) -> i64;
    /// Floors at 0; the counter is never allowed to go negative even if
    /// the remote counter and local deletions disagree.
    fn set_likes_count(&mut self, count: i64);
    fn is_liked(&self) -> bool;
    fn set_liked(&mut self, liked: bool);
    fn comments(&self) -> &[Comment];
    fn comments_mut(&mut self) -> &mut Vec<Comment>;
}

/// The detail projection: a full copy of the one item currently open in
/// an expanded view. Exists only while the view is open and must stay in
/// lockstep with the matching list-cache entry after every mutation.
#[derive(Debug, Clone)]
pub enum SelectedItem {
    Agenda(Agenda),
    Informasi(Informasi),
}

impl SelectedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            SelectedItem::Agenda(_) => ItemKind::Agenda,
            SelectedItem::Informasi(_) => ItemKind::Informasi,
        }
    }

    pub fn id(&self) -> i64 {
        self.record().id()
    }

    pub fn record(&self) -> &dyn Engageable {
        match self {
            SelectedItem::Agenda(a) => a,
            SelectedItem::Informasi(i) => i,
        }
    }

    pub fn record_mut(&mut self) -> &mut dyn Engageable {
        match self {
            SelectedItem::Agenda(a) => a,
            SelectedItem::Informasi(i) => i,
        }
    }
}
