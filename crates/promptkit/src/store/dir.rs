//! Directory-backed prompt store.
//!
//! Layout, for the default configuration:
//!
//! ```text
//! prompts/
//!   greet.prompt            -> prompt "greet"
//!   greet.formal.prompt     -> prompt "greet", variant "formal"
//!   support/triage.prompt   -> prompt "support/triage"
//!   _footer.prompt          -> partial "footer"
//! ```
//!
//! The part of the file stem before the first `.` is the name; the rest is
//! the variant. Subdirectories become `/`-separated name prefixes.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, trace};

use super::{
    ListOptions, LoadOptions, PaginatedList, PromptStore, StoreFuture, paginate, source_version,
    versioned,
};
use crate::error::{PromptError, Result};
use crate::prompt::{PartialData, PartialRef, PromptData, PromptRef};

/// Default file extension for prompt sources.
pub const DEFAULT_EXTENSION: &str = "prompt";
/// Default file-name prefix marking a partial.
pub const DEFAULT_PARTIAL_PREFIX: &str = "_";

/// Configuration for a [`DirStore`].
///
/// ```
/// use promptkit::store::DirStoreConfig;
///
/// let config = DirStoreConfig::new("./prompts").with_extension("hbs");
/// assert_eq!(config.extension, "hbs");
/// assert_eq!(config.partial_prefix, "_");
/// ```
#[derive(Debug, Clone)]
pub struct DirStoreConfig {
    /// Root directory. Default: `prompts`.
    pub directory: PathBuf,
    /// File extension without the dot. Default: `prompt`.
    pub extension: String,
    /// File-name prefix of partials. Default: `_`.
    pub partial_prefix: String,
}

impl Default for DirStoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("prompts"),
            extension: DEFAULT_EXTENSION.to_string(),
            partial_prefix: DEFAULT_PARTIAL_PREFIX.to_string(),
        }
    }
}

impl DirStoreConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_partial_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.partial_prefix = prefix.into();
        self
    }
}

/// A file found while scanning the store directory.
#[derive(Debug)]
struct Entry {
    prompt_ref: PromptRef,
    partial: bool,
    path: PathBuf,
}

/// A [`PromptStore`] over a directory of prompt files.
#[derive(Debug, Clone)]
pub struct DirStore {
    config: DirStoreConfig,
}

impl DirStore {
    pub fn new(config: DirStoreConfig) -> Self {
        Self { config }
    }

    /// Shorthand for a store with default settings rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>) -> Self {
        Self::new(DirStoreConfig::new(directory))
    }

    pub fn config(&self) -> &DirStoreConfig {
        &self.config
    }

    /// Map a name and variant to the file that holds it.
    fn path_for(&self, name: &str, variant: Option<&str>, partial: bool) -> Result<PathBuf> {
        let invalid = || PromptError::InvalidName(name.to_string());
        let segments: Vec<&str> = name.split('/').collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(invalid());
        }
        let (base, dirs) = segments.split_last().ok_or_else(invalid)?;
        let prefix = &self.config.partial_prefix;
        if base.contains('.') || (!prefix.is_empty() && base.starts_with(prefix.as_str())) {
            return Err(invalid());
        }
        if let Some(variant) = variant
            && (variant.is_empty() || variant.contains(['/', '\\']))
        {
            return Err(invalid());
        }

        let mut file_name = String::new();
        if partial {
            file_name.push_str(&self.config.partial_prefix);
        }
        file_name.push_str(base);
        if let Some(variant) = variant {
            file_name.push('.');
            file_name.push_str(variant);
        }
        file_name.push('.');
        file_name.push_str(&self.config.extension);

        let mut path = self.config.directory.clone();
        path.extend(dirs);
        path.push(file_name);
        Ok(path)
    }

    /// Parse a file name found under `dirs` into a reference.
    fn parse_file_name(&self, file_name: &str, dirs: &[String]) -> Option<(PromptRef, bool)> {
        let stem = file_name.strip_suffix(&format!(".{}", self.config.extension))?;
        let (stem, partial) = match stem.strip_prefix(&self.config.partial_prefix) {
            Some(rest) if !self.config.partial_prefix.is_empty() => (rest, true),
            _ => (stem, false),
        };
        let (base, variant) = match stem.split_once('.') {
            Some((base, variant)) => (base, Some(variant.to_string())),
            None => (stem, None),
        };
        if base.is_empty() || variant.as_deref() == Some("") {
            return None;
        }

        let mut name = dirs.join("/");
        if !name.is_empty() {
            name.push('/');
        }
        name.push_str(base);
        Some((
            PromptRef {
                name,
                variant,
                version: None,
            },
            partial,
        ))
    }

    /// Walk the directory tree and collect every prompt and partial file.
    async fn scan(&self) -> Result<Vec<Entry>> {
        let mut found = Vec::new();
        let mut stack: Vec<(PathBuf, Vec<String>)> =
            vec![(self.config.directory.clone(), Vec::new())];

        while let Some((dir, dirs)) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound && dirs.is_empty() => {
                    debug!("Prompt directory {} does not exist", dir.display());
                    return Ok(found);
                }
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let file_name = file_name.to_string();
                if entry.file_type().await?.is_dir() {
                    let mut sub = dirs.clone();
                    sub.push(file_name);
                    stack.push((path, sub));
                    continue;
                }
                let Some((prompt_ref, partial)) = self.parse_file_name(&file_name, &dirs) else {
                    trace!("Skipping {}", path.display());
                    continue;
                };
                // Follows symlinks: dangling links and linked directories are skipped.
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.is_file() => found.push(Entry {
                        prompt_ref,
                        partial,
                        path,
                    }),
                    Ok(_) => trace!("Skipping non-file {}", path.display()),
                    Err(e) => trace!("Skipping unreadable {}: {e}", path.display()),
                }
            }
        }
        Ok(found)
    }

    async fn list_kind(
        &self,
        partial: bool,
        options: ListOptions,
    ) -> Result<PaginatedList<PromptRef>> {
        let mut refs = Vec::new();
        for entry in self.scan().await?.into_iter().filter(|e| e.partial == partial) {
            let source = match tokio::fs::read_to_string(&entry.path).await {
                Ok(source) => source,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    trace!("{} disappeared while listing", entry.path.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            refs.push(entry.prompt_ref.with_version(source_version(&source)));
        }
        refs.sort_by(|a, b| (&a.name, &a.variant).cmp(&(&b.name, &b.variant)));
        debug!(
            "Listed {} {} in {}",
            refs.len(),
            if partial { "partial(s)" } else { "prompt(s)" },
            self.config.directory.display()
        );
        paginate(refs, &options)
    }

    async fn load_kind(
        &self,
        name: &str,
        options: LoadOptions,
        partial: bool,
    ) -> Result<PromptData> {
        let path = self.path_for(name, options.variant.as_deref(), partial)?;
        let mut prompt_ref = PromptRef::new(name);
        prompt_ref.variant = options.variant.clone();
        trace!("Loading {}", path.display());

        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let label = prompt_ref.to_string();
                return Err(if partial {
                    PromptError::PartialNotFound(label)
                } else {
                    PromptError::PromptNotFound(label)
                });
            }
            Err(e) => return Err(e.into()),
        };
        versioned(prompt_ref, source, options.version.as_deref())
    }
}

impl PromptStore for DirStore {
    fn list(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PromptRef>> {
        Box::pin(self.list_kind(false, options))
    }

    fn list_partials(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PartialRef>> {
        Box::pin(self.list_kind(true, options))
    }

    fn load<'a>(&'a self, name: &'a str, options: LoadOptions) -> StoreFuture<'a, PromptData> {
        Box::pin(self.load_kind(name, options, false))
    }

    fn load_partial<'a>(
        &'a self,
        name: &'a str,
        options: LoadOptions,
    ) -> StoreFuture<'a, PartialData> {
        Box::pin(self.load_kind(name, options, true))
    }

    fn save(&self, prompt: PromptData) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let path = self.path_for(
                &prompt.prompt_ref.name,
                prompt.prompt_ref.variant.as_deref(),
                false,
            )?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            debug!("Saving prompt {} to {}", prompt.prompt_ref, path.display());
            tokio::fs::write(&path, prompt.source.as_bytes()).await?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, name: &'a str, variant: Option<&'a str>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(name, variant, false)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Deleted {}", path.display());
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    let mut prompt_ref = PromptRef::new(name);
                    prompt_ref.variant = variant.map(str::to_string);
                    Err(PromptError::PromptNotFound(prompt_ref.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}
