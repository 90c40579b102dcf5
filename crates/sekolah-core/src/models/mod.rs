mod agenda;
mod comment;
mod engageable;
mod informasi;
mod kind;
mod like;
mod media;
mod visit;

pub use agenda::Agenda;
pub use comment::Comment;
pub use engageable::{Engageable, SelectedItem};
pub use informasi::Informasi;
pub use kind::ItemKind;
pub use like::LikeRecord;
pub use media::{FotoFile, GaleryMedia, PostMedia};
pub use visit::VisitRow;
