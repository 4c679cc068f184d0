//! In-memory prompt store.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use super::{
    ListOptions, LoadOptions, PaginatedList, PromptStore, StoreFuture, paginate, versioned,
};
use crate::error::PromptError;
use crate::prompt::{PartialData, PartialRef, PromptData, PromptRef};

type Key = (String, Option<String>);

/// A [`PromptStore`] kept in process memory.
///
/// Entries are ordered by `(name, variant)`, so listings come out sorted
/// with the default variant first.
#[derive(Debug, Default)]
pub struct MemoryStore {
    prompts: RwLock<BTreeMap<Key, String>>,
    partials: RwLock<BTreeMap<Key, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a prompt (builder pattern).
    pub fn with_prompt(
        self,
        name: impl Into<String>,
        variant: Option<&str>,
        source: impl Into<String>,
    ) -> Self {
        self.prompts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name.into(), variant.map(str::to_string)), source.into());
        self
    }

    /// Seed a partial (builder pattern).
    pub fn with_partial(self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.partials
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((name.into(), None), source.into());
        self
    }

    fn list_from(map: &RwLock<BTreeMap<Key, String>>) -> Vec<PromptRef> {
        map.read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|((name, variant), source)| PromptRef {
                name: name.clone(),
                variant: variant.clone(),
                version: Some(super::source_version(source)),
            })
            .collect()
    }

    fn get_from(
        map: &RwLock<BTreeMap<Key, String>>,
        name: &str,
        variant: Option<&str>,
    ) -> Option<String> {
        map.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(name.to_string(), variant.map(str::to_string)))
            .cloned()
    }
}

impl PromptStore for MemoryStore {
    fn list(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PromptRef>> {
        let result = paginate(Self::list_from(&self.prompts), &options);
        Box::pin(async move { result })
    }

    fn list_partials(&self, options: ListOptions) -> StoreFuture<'_, PaginatedList<PartialRef>> {
        let result = paginate(Self::list_from(&self.partials), &options);
        Box::pin(async move { result })
    }

    fn load<'a>(&'a self, name: &'a str, options: LoadOptions) -> StoreFuture<'a, PromptData> {
        Box::pin(async move {
            let variant = options.variant.as_deref();
            let mut prompt_ref = PromptRef::new(name);
            prompt_ref.variant = options.variant.clone();
            let source = Self::get_from(&self.prompts, name, variant)
                .ok_or_else(|| PromptError::PromptNotFound(prompt_ref.to_string()))?;
            versioned(prompt_ref, source, options.version.as_deref())
        })
    }

    fn load_partial<'a>(
        &'a self,
        name: &'a str,
        options: LoadOptions,
    ) -> StoreFuture<'a, PartialData> {
        Box::pin(async move {
            let mut partial_ref = PartialRef::new(name);
            partial_ref.variant = options.variant.clone();
            let source = Self::get_from(&self.partials, name, options.variant.as_deref())
                .ok_or_else(|| PromptError::PartialNotFound(partial_ref.to_string()))?;
            versioned(partial_ref, source, options.version.as_deref())
        })
    }

    fn save(&self, prompt: PromptData) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            debug!("Saving prompt {} to memory store", prompt.prompt_ref);
            let PromptData { prompt_ref, source } = prompt;
            self.prompts
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert((prompt_ref.name, prompt_ref.variant), source);
            Ok(())
        })
    }

    fn delete<'a>(&'a self, name: &'a str, variant: Option<&'a str>) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let removed = self
                .prompts
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&(name.to_string(), variant.map(str::to_string)));
            match removed {
                Some(_) => Ok(()),
                None => {
                    let mut prompt_ref = PromptRef::new(name);
                    prompt_ref.variant = variant.map(str::to_string);
                    Err(PromptError::PromptNotFound(prompt_ref.to_string()))
                }
            }
        })
    }
}
