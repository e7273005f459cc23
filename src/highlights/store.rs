use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::model::Highlight;

/// Highlights for every document this instance has seen, keyed by the
/// source identity string. File-backed stores save after every mutation;
/// a failed save keeps the in-memory state and logs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HighlightStore {
    documents: HashMap<String, Vec<Highlight>>,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl HighlightStore {
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            documents: HashMap::new(),
            file_path: Some(path.into()),
        }
    }

    pub fn load_or_ephemeral(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|err| {
                log::error!("failed to load highlights from {}: {err}", path.display());
                Self::with_file(path)
            }),
            None => Self::ephemeral(),
        }
    }

    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::with_file(path));
        }
        let content = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to read highlights: {}", path.display()),
            )
        })?;
        let mut store: Self = serde_json::from_str(&content)
            .map_err(|source| AppError::config(source, format!("parsing {}", path.display())))?;
        store.file_path = Some(path.to_path_buf());
        Ok(store)
    }

    pub fn save(&self) -> AppResult<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| {
                AppError::io_with_context(
                    source,
                    format!("failed to create store directory: {}", parent.display()),
                )
            })?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|source| AppError::config(source, "serializing highlights"))?;
        fs::write(path, content).map_err(|source| {
            AppError::io_with_context(
                source,
                format!("failed to write highlights: {}", path.display()),
            )
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn highlights(&self, key: &str) -> &[Highlight] {
        self.documents.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, key: &str, id: &str) -> Option<&Highlight> {
        self.highlights(key).iter().find(|h| h.id == id)
    }

    pub fn position(&self, key: &str, id: &str) -> Option<usize> {
        self.highlights(key).iter().position(|h| h.id == id)
    }

    /// Newest first, matching how entries are browsed.
    pub fn add(&mut self, key: &str, highlight: Highlight) {
        self.documents
            .entry(key.to_string())
            .or_default()
            .insert(0, highlight);
        self.autosave();
    }

    pub fn edit_comment(&mut self, key: &str, id: &str, comment: impl Into<String>) -> bool {
        let Some(entry) = self
            .documents
            .get_mut(key)
            .and_then(|list| list.iter_mut().find(|h| h.id == id))
        else {
            return false;
        };
        entry.comment = comment.into();
        self.autosave();
        true
    }

    pub fn remove(&mut self, key: &str, id: &str) -> bool {
        let Some(list) = self.documents.get_mut(key) else {
            return false;
        };
        let before = list.len();
        list.retain(|h| h.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.documents.remove(key);
        }
        if removed {
            self.autosave();
        }
        removed
    }

    pub fn clear(&mut self, key: &str) -> usize {
        let removed = self.documents.remove(key).map(|list| list.len()).unwrap_or(0);
        if removed > 0 {
            self.autosave();
        }
        removed
    }

    fn autosave(&self) {
        if self.file_path.is_none() {
            return;
        }
        if let Err(err) = self.save() {
            log::error!("failed to save highlights: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::process;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::super::model::{Highlight, Region};
    use super::HighlightStore;

    const DOC: &str = "https://example.com/a.pdf";

    fn unique_temp_path(suffix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("mgl_store_{suffix}_{}_{}", process::id(), nanos));
        path
    }

    #[test]
    fn add_prepends_newest_first() {
        let mut store = HighlightStore::ephemeral();
        store.add(DOC, Highlight::new(1, "first"));
        store.add(DOC, Highlight::new(2, "second"));

        let list = store.highlights(DOC);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].comment, "second");
        assert_eq!(list[1].comment, "first");
    }

    #[test]
    fn edit_remove_and_find_work_by_id() {
        let mut store = HighlightStore::ephemeral();
        let highlight = Highlight::new(3, "draft");
        let id = highlight.id.clone();
        store.add(DOC, highlight);

        assert!(store.edit_comment(DOC, &id, "final"));
        assert_eq!(store.find(DOC, &id).map(|h| h.comment.as_str()), Some("final"));
        assert_eq!(store.position(DOC, &id), Some(0));

        assert!(store.remove(DOC, &id));
        assert!(store.find(DOC, &id).is_none());
        assert!(!store.remove(DOC, &id));
        assert!(!store.edit_comment(DOC, &id, "gone"));
    }

    #[test]
    fn clear_only_touches_the_keyed_document() {
        let mut store = HighlightStore::ephemeral();
        store.add(DOC, Highlight::new(1, "keep me not"));
        store.add("bytes:00ff", Highlight::new(1, "other doc"));

        assert_eq!(store.clear(DOC), 1);
        assert!(store.highlights(DOC).is_empty());
        assert_eq!(store.highlights("bytes:00ff").len(), 1);
        assert_eq!(store.clear(DOC), 0);
    }

    #[test]
    fn file_round_trip_preserves_highlights() {
        let path = unique_temp_path("roundtrip.json");
        let mut store = HighlightStore::with_file(&path);
        let highlight = Highlight::new(4, "note").with_region(Region {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 12.0,
        });
        let id = highlight.id.clone();
        store.add(DOC, highlight);

        let reloaded = HighlightStore::load_from_file(&path).expect("store should reload");
        let found = reloaded.find(DOC, &id).expect("highlight should persist");
        assert_eq!(found.comment, "note");
        assert_eq!(found.page, 4);
        assert!(found.region.is_some());

        fs::remove_file(&path).expect("store file should be removed");
    }

    #[test]
    fn missing_file_loads_an_empty_file_backed_store() {
        let path = unique_temp_path("missing.json");
        let store = HighlightStore::load_from_file(&path).expect("missing file should be fine");
        assert!(store.highlights(DOC).is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn ephemeral_stores_never_touch_disk() {
        let mut store = HighlightStore::ephemeral();
        store.add(DOC, Highlight::new(1, "memory only"));
        store.save().expect("ephemeral save should be a no-op");
    }
}
