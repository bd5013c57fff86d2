//! Filesystem-backed [`StoragePort`].
//!
//! Writes are atomic: content goes to a hidden temp file next to the target
//! (`.{name}.kea.{nanos}.tmp`), is flushed to disk, then renamed over the target. A reader never
//! observes a half-written document, and the file watcher sees a single change.

use crate::error::RenameError;
use kea_core::{OpenedDocument, SavedAs, StorageError, StoragePort};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extensions recognised as markdown by [`is_markdown_file`].
pub const MARKDOWN_EXTENSIONS: [&str; 4] = ["md", "markdown", "mdown", "mkd"];

/// Returns `true` if `path` has a markdown extension (case-insensitive).
pub fn is_markdown_file(path: &Path) -> bool {
    has_extension(path, MARKDOWN_EXTENSIONS)
}

fn has_extension<'a>(path: &Path, extensions: impl IntoIterator<Item = &'a str>) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .into_iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Native file dialogs, supplied by the host UI.
pub trait PathPicker {
    /// Ask for a file to open. `None` means the dialog was dismissed.
    fn pick_open(&mut self) -> Option<PathBuf>;

    /// Ask for a location to save to, pre-filled with `suggested_name`. `None` means the dialog
    /// was dismissed.
    fn pick_save(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

/// Tunables for [`FsStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStorageOptions {
    /// Extensions [`FsStorageOptions::is_markdown`] accepts, without the dot.
    pub markdown_extensions: Vec<String>,
    /// Extension appended on save-as when the chosen path has none.
    pub default_extension: String,
    /// Name suggested by the save-as dialog.
    pub suggested_name: String,
}

impl Default for FsStorageOptions {
    fn default() -> Self {
        Self {
            markdown_extensions: MARKDOWN_EXTENSIONS.map(str::to_string).to_vec(),
            default_extension: "md".to_string(),
            suggested_name: "Untitled.md".to_string(),
        }
    }
}

impl FsStorageOptions {
    /// Returns `true` if `path` has one of the configured extensions (case-insensitive).
    pub fn is_markdown(&self, path: &Path) -> bool {
        has_extension(path, self.markdown_extensions.iter().map(String::as_str))
    }
}

/// [`StoragePort`] over `std::fs`.
pub struct FsStorage {
    picker: Option<Box<dyn PathPicker + Send>>,
    options: FsStorageOptions,
}

impl std::fmt::Debug for FsStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStorage")
            .field("picker", &self.picker.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FsStorage {
    /// Create a storage without dialogs: picker calls report [`StorageError::Cancelled`].
    pub fn new() -> Self {
        Self {
            picker: None,
            options: FsStorageOptions::default(),
        }
    }

    /// Install the dialog provider.
    pub fn with_picker<P>(mut self, picker: P) -> Self
    where
        P: PathPicker + Send + 'static,
    {
        self.picker = Some(Box::new(picker));
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: FsStorageOptions) -> Self {
        self.options = options;
        self
    }

    /// Current options.
    pub fn options(&self) -> &FsStorageOptions {
        &self.options
    }

    fn read(path: &Path) -> Result<OpenedDocument, StorageError> {
        let path_str = path_to_string(path)?;
        let content = fs::read_to_string(path).map_err(|err| StorageError::from_io(&path_str, err))?;
        Ok(OpenedDocument {
            name: file_name_or(path, "Untitled"),
            path: path_str,
            content,
        })
    }
}

impl StoragePort for FsStorage {
    fn read_file(&mut self, path: &str) -> Result<OpenedDocument, StorageError> {
        Self::read(Path::new(path))
    }

    fn open_file_picker(&mut self) -> Result<OpenedDocument, StorageError> {
        let picked = self
            .picker
            .as_mut()
            .and_then(|picker| picker.pick_open())
            .ok_or(StorageError::Cancelled)?;
        Self::read(&picked)
    }

    fn save_file(&mut self, path: &str, content: &str) -> Result<(), StorageError> {
        atomic_write(Path::new(path), content)
    }

    fn save_file_as(&mut self, content: &str) -> Result<SavedAs, StorageError> {
        let suggested = self.options.suggested_name.as_str();
        let mut path = self
            .picker
            .as_mut()
            .and_then(|picker| picker.pick_save(suggested))
            .ok_or(StorageError::Cancelled)?;

        if path.extension().is_none() && !self.options.default_extension.is_empty() {
            path.set_extension(&self.options.default_extension);
        }

        atomic_write(&path, content)?;
        Ok(SavedAs {
            name: file_name_or(&path, &self.options.suggested_name),
            path: path_to_string(&path)?,
        })
    }
}

/// Write `content` to `path` through a synced temp file and a rename.
///
/// Missing parent directories are created. If the rename fails (some platforms refuse to
/// rename over an existing file) the target is removed and the rename retried. The temp file
/// never outlives a failed write.
pub fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
    let target = path.display().to_string();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| StorageError::from_io(&target, err))?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0);
    let temp_path = parent.join(format!(".{file_name}.kea.{nanos}.tmp"));

    let cleanup = |err: std::io::Error| {
        let _ = fs::remove_file(&temp_path);
        StorageError::Io {
            path: target.clone(),
            source: err,
        }
    };

    write_synced(&temp_path, content).map_err(cleanup)?;

    if fs::rename(&temp_path, path).is_ok() {
        return Ok(());
    }
    if path.exists() {
        fs::remove_file(path).map_err(cleanup)?;
    }
    fs::rename(&temp_path, path).map_err(cleanup)?;
    tracing::debug!(path = %target, "replaced file after direct rename failed");
    Ok(())
}

fn write_synced(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Rename a file or directory within its parent directory. Returns the new path.
///
/// `new_name` must be a plain name: not empty, not `.`/`..`, and without separators.
pub fn rename_item(old_path: &Path, new_name: &str) -> Result<PathBuf, RenameError> {
    if !old_path.exists() {
        return Err(RenameError::NotFound(old_path.to_path_buf()));
    }
    if new_name.is_empty()
        || new_name == "."
        || new_name == ".."
        || new_name.contains(['/', '\\'])
    {
        return Err(RenameError::InvalidName(new_name.to_string()));
    }

    let parent = old_path
        .parent()
        .ok_or_else(|| RenameError::NoParent(old_path.to_path_buf()))?;
    let new_path = parent.join(new_name);
    if new_path.exists() {
        return Err(RenameError::AlreadyExists(new_path));
    }

    fs::rename(old_path, &new_path).map_err(|source| RenameError::Io {
        path: old_path.to_path_buf(),
        source,
    })?;
    tracing::info!(from = %old_path.display(), to = %new_path.display(), "renamed item");
    Ok(new_path)
}

fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(fallback)
        .to_string()
}

fn path_to_string(path: &Path) -> Result<String, StorageError> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| StorageError::Other(format!("invalid path encoding: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(Path::new("notes/a.md")));
        assert!(is_markdown_file(Path::new("A.MARKDOWN")));
        assert!(is_markdown_file(Path::new("x.mdown")));
        assert!(is_markdown_file(Path::new("x.mkd")));
        assert!(!is_markdown_file(Path::new("x.txt")));
        assert!(!is_markdown_file(Path::new("md")));
    }

    #[test]
    fn test_options_extensions_are_configurable() {
        let mut options = FsStorageOptions::default();
        assert!(options.is_markdown(Path::new("a.MD")));
        assert!(!options.is_markdown(Path::new("a.txt")));

        options.markdown_extensions = vec!["txt".to_string()];
        assert!(options.is_markdown(Path::new("a.txt")));
        assert!(!options.is_markdown(Path::new("a.md")));
    }

    #[test]
    fn test_rename_rejects_bad_names_before_io() {
        let here = Path::new(".");
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                rename_item(here, name),
                Err(RenameError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_missing_item_is_not_found() {
        let err = rename_item(Path::new("/definitely/not/here.md"), "x.md").unwrap_err();
        assert!(matches!(err, RenameError::NotFound(_)));
    }
}
