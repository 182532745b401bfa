use gainrpg_game::{ContentError, ContentProvider, DEFAULT_THEME_KEY, ThemeBundle};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeLoadError {
    #[error("failed to read theme {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("theme {path} is malformed: {source}")]
    Content {
        path: PathBuf,
        #[source]
        source: ContentError,
    },
}

/// Loads `<key>.json` bundles from a directory, with the embedded default
/// always available under its own key.
#[derive(Debug, Clone)]
pub struct DirectoryContent {
    root: Option<PathBuf>,
}

impl DirectoryContent {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn theme_path(root: &Path, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| root.join(format!("{key}.json")))
    }
}

impl ContentProvider for DirectoryContent {
    type Error = ThemeLoadError;

    fn load_theme(&self, key: &str) -> Result<Option<ThemeBundle>, Self::Error> {
        if let Some(path) = self
            .root
            .as_deref()
            .and_then(|root| Self::theme_path(root, key))
            && path.is_file()
        {
            let text = std::fs::read_to_string(&path).map_err(|source| ThemeLoadError::Io {
                path: path.clone(),
                source,
            })?;
            let bundle = ThemeBundle::from_json(&text)
                .map_err(|source| ThemeLoadError::Content { path, source })?;
            return Ok(Some(bundle));
        }
        if key == DEFAULT_THEME_KEY {
            return Ok(Some(ThemeBundle::default_bundle()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gainrpg-tester-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_key_needs_no_directory() {
        let content = DirectoryContent::new(None);
        assert!(content.load_theme(DEFAULT_THEME_KEY).unwrap().is_some());
        assert!(content.load_theme("space_station").unwrap().is_none());
    }

    #[test]
    fn loads_bundles_from_disk() {
        let dir = scratch_dir("load");
        std::fs::write(
            dir.join("tiny.json"),
            r#"{"key":"tiny","threats":{"1":[{"name":"Rat"}]}}"#,
        )
        .unwrap();
        let content = DirectoryContent::new(Some(dir.clone()));
        let bundle = content.load_theme("tiny").unwrap().unwrap();
        assert_eq!(bundle.threat_table(1, false)[0].name, "Rat");
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn malformed_bundle_is_an_error_and_paths_are_confined() {
        let dir = scratch_dir("bad");
        std::fs::write(dir.join("broken.json"), "{").unwrap();
        let content = DirectoryContent::new(Some(dir.clone()));
        assert!(matches!(
            content.load_theme("broken"),
            Err(ThemeLoadError::Content { .. })
        ));
        assert!(content.load_theme("../etc/passwd").unwrap().is_none());
        std::fs::remove_dir_all(dir).ok();
    }
}
