use crate::{
    config::Config,
    error::{QcError, QcResult},
    render::RenderedDocument,
    util::{format_rfc3339, now_unix_millis, unix_millis},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use time::OffsetDateTime;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-_.]").expect("static regex"));
static UNDERSCORE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("static regex"));
static COLLISION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    /// File name including extension.
    pub name: String,
    /// Name without extension or collision suffix.
    pub display_name: String,
    pub path: PathBuf,
    pub size_in_bytes: u64,
    /// Unix milliseconds.
    pub modified_timestamp: u64,
    pub size: String,
    pub modified: String,
}

/// Directory of rendered report documents.
///
/// Saving two reports with the same batch id at the same moment can still
/// race: the collision check retries once with a millisecond suffix and the
/// second attempt is not re-checked.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
    extension: String,
    normalize_unicode: bool,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            normalize_unicode: true,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.paths.reports_dir, &cfg.store.extension)
            .with_unicode_normalization(cfg.store.normalize_unicode)
    }

    pub fn with_unicode_normalization(mut self, on: bool) -> Self {
        self.normalize_unicode = on;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn save(&self, doc: &RenderedDocument, batch_id: &str) -> QcResult<StoredReport> {
        self.save_bytes(doc.as_bytes(), batch_id)
    }

    pub fn save_bytes(&self, bytes: &[u8], batch_id: &str) -> QcResult<StoredReport> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| QcError::store(format!("create {}", self.dir.display()), e))?;

        let mut base = sanitize_filename(batch_id, self.normalize_unicode);
        if base.chars().all(|c| c == '.') {
            base = format!("report_{}", now_unix_millis());
        }

        let primary = self.dir.join(format!("{base}.{}", self.extension));
        let path = match OpenOptions::new().write(true).create_new(true).open(&primary) {
            Ok(mut f) => {
                f.write_all(bytes)
                    .map_err(|e| QcError::store(format!("write {}", primary.display()), e))?;
                primary
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let unique = self
                    .dir
                    .join(format!("{base}_{}.{}", now_unix_millis(), self.extension));
                fs::write(&unique, bytes)
                    .map_err(|e| QcError::store(format!("write {}", unique.display()), e))?;
                info!("name taken, saved with unique name {}", unique.display());
                unique
            }
            Err(e) => return Err(QcError::store(format!("create {}", primary.display()), e)),
        };

        info!("report saved: {}", path.display());
        self.describe(&path)
    }

    /// Stored documents, newest first. An unreadable directory yields an
    /// empty list.
    pub fn list(&self) -> Vec<StoredReport> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read reports dir {}: {e}", self.dir.display());
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {e}", self.dir.display());
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() || !self.has_extension(&path) {
                continue;
            }
            match self.describe(&path) {
                Ok(r) => out.push(r),
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }

        out.sort_by(|a, b| {
            b.modified_timestamp
                .cmp(&a.modified_timestamp)
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    /// Looks up one stored document, e.g. to hand it to a viewer.
    pub fn open(&self, name: &str) -> QcResult<StoredReport> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(QcError::NotFound(format!("report {name}")));
        }
        self.describe(&path)
    }

    pub fn delete(&self, name: &str) -> QcResult<bool> {
        let path = self.resolve(name)?;
        if !path.is_file() {
            return Err(QcError::NotFound(format!("report {name}")));
        }
        remove_stored(&path, name)?;
        info!("report deleted: {}", path.display());
        Ok(true)
    }

    fn resolve(&self, name: &str) -> QcResult<PathBuf> {
        let name = name.trim();
        if !is_plain_file_name(name) {
            return Err(QcError::Validation(format!("invalid report name: {name:?}")));
        }
        let path = self.dir.join(name);
        if self.has_extension(&path) {
            Ok(path)
        } else {
            Ok(self.dir.join(format!("{name}.{}", self.extension)))
        }
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    fn describe(&self, path: &Path) -> QcResult<StoredReport> {
        let meta = fs::metadata(path)
            .map_err(|e| QcError::store(format!("stat {}", path.display()), e))?;
        let modified = meta
            .modified()
            .map_err(|e| QcError::store(format!("mtime {}", path.display()), e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(StoredReport {
            display_name: COLLISION_SUFFIX.replace(&stem, "").into_owned(),
            name,
            path: path.to_path_buf(),
            size_in_bytes: meta.len(),
            modified_timestamp: unix_millis(modified),
            size: format!("{:.2} KB", meta.len() as f64 / 1024.0),
            modified: format_rfc3339(OffsetDateTime::from(modified)),
        })
    }
}

/// A single normal path component: no separators, not `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    let mut parts = Path::new(name).components();
    matches!(
        (parts.next(), parts.next()),
        (Some(Component::Normal(_)), None)
    )
}

// The file may vanish between the existence check and the unlink.
fn remove_stored(path: &Path, name: &str) -> QcResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(QcError::NotFound(format!("report {name}")))
        }
        Err(e) => Err(QcError::store(format!("remove {}", path.display()), e)),
    }
}

/// Maps a batch id onto `[a-zA-Z0-9-_.]`, collapsing `_` runs and trimming
/// leading/trailing `_`.
pub fn sanitize_filename(raw: &str, normalize_unicode: bool) -> String {
    let raw: String = if normalize_unicode {
        raw.nfkc().collect()
    } else {
        raw.to_string()
    };
    let replaced = DISALLOWED.replace_all(&raw, "_");
    let collapsed = UNDERSCORE_RUN.replace_all(&replaced, "_");
    collapsed.trim_matches('_').to_string()
}
