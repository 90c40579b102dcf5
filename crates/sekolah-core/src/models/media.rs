use serde::{Deserialize, Serialize};

/// Nested post -> galery -> foto embedding returned by the store.
/// Only the file URL of the first photo is ever rendered (the list
/// thumbnail), so the structs stay minimal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostMedia {
    #[serde(default)]
    pub galery: Vec<GaleryMedia>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaleryMedia {
    #[serde(default)]
    pub foto: Vec<FotoFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FotoFile {
    pub file: String,
}

impl PostMedia {
    pub fn first_file(&self) -> Option<&str> {
        self.galery
            .first()
            .and_then(|g| g.foto.first())
            .map(|f| f.file.as_str())
    }
}
