//! Typed convenience layer: one method per cachetool command.

use crate::dispatcher::Dispatcher;
use crate::interpret;
use bytes::Bytes;
use cachectl_config::Config;
use cachectl_core::{
    constants::DEFAULT_STREAM_INDEX, BackendKind, CommandDescriptor, CommandKind,
    DuplicateRecord, OutputMode, Result, StreamContent,
};

/// The cache a command operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTarget {
    path: String,
    backend: Option<BackendKind>,
}

impl CacheTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            backend: None,
        }
    }

    /// Override the client's default backend for this cache
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl From<&str> for CacheTarget {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// High-level client over a [`Dispatcher`]
#[derive(Debug, Clone)]
pub struct CacheTool {
    dispatcher: Dispatcher,
    default_backend: BackendKind,
    quiet: bool,
}

impl CacheTool {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            default_backend: BackendKind::default(),
            quiet: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            dispatcher: Dispatcher::from_config(config),
            default_backend: config.default_backend,
            quiet: config.quiet,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn default_backend(mut self, backend: BackendKind) -> Self {
        self.default_backend = backend;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn descriptor(
        &self,
        target: &CacheTarget,
        command: CommandKind,
    ) -> cachectl_core::CommandDescriptorBuilder {
        CommandDescriptor::builder(target.path.clone(), command)
            .backend(target.backend.unwrap_or(self.default_backend))
            .quiet(self.quiet)
    }

    /// Remove `key` and all its streams
    pub async fn delete_key(&self, target: &CacheTarget, key: &str) -> Result<()> {
        let descriptor = self
            .descriptor(target, CommandKind::DeleteKey)
            .arg(key)
            .build()?;
        self.dispatcher.dispatch(&descriptor).await?;
        Ok(())
    }

    /// Remove one stream of `key`; stream 0 when `index` is `None`
    pub async fn delete_stream(
        &self,
        target: &CacheTarget,
        key: &str,
        index: Option<u32>,
    ) -> Result<()> {
        let descriptor = self
            .descriptor(target, CommandKind::DeleteStream)
            .arg(key)
            .arg(index.unwrap_or(DEFAULT_STREAM_INDEX).to_string())
            .build()?;
        self.dispatcher.dispatch(&descriptor).await?;
        Ok(())
    }

    /// Total size of the cache in bytes
    pub async fn get_size(&self, target: &CacheTarget) -> Result<u64> {
        let descriptor = self.descriptor(target, CommandKind::GetSize).build()?;
        let result = self.dispatcher.dispatch(&descriptor).await?;
        interpret::parse_size(&result.stdout.into_lines())
    }

    /// Read one stream of `key`.
    ///
    /// Stream 0 (the default) comes back as raw chunks; any other stream
    /// comes back as text with its line breaks intact.
    pub async fn get_stream(
        &self,
        target: &CacheTarget,
        key: &str,
        index: Option<u32>,
    ) -> Result<StreamContent> {
        let index = index.unwrap_or(DEFAULT_STREAM_INDEX);
        let descriptor = self
            .descriptor(target, CommandKind::GetStream)
            .arg(key)
            .arg(index.to_string())
            .output_mode(OutputMode::for_stream_index(index))
            .build()?;
        let result = self.dispatcher.dispatch(&descriptor).await?;
        Ok(interpret::stream_content(result.stdout, index))
    }

    pub async fn list_keys(&self, target: &CacheTarget) -> Result<Vec<String>> {
        let descriptor = self.descriptor(target, CommandKind::ListKeys).build()?;
        let result = self.dispatcher.dispatch(&descriptor).await?;
        Ok(interpret::key_list(result.stdout.into_lines()))
    }

    /// Entries whose bodies are duplicated elsewhere in the cache
    pub async fn list_dups(&self, target: &CacheTarget) -> Result<Vec<DuplicateRecord>> {
        let descriptor = self.descriptor(target, CommandKind::ListDups).build()?;
        let result = self.dispatcher.dispatch(&descriptor).await?;
        interpret::parse_duplicates(&result.stdout.into_lines())
    }

    /// Replace the raw response headers of `key`
    pub async fn update_raw_headers(
        &self,
        target: &CacheTarget,
        key: &str,
        headers: impl Into<Bytes>,
    ) -> Result<()> {
        let descriptor = self
            .descriptor(target, CommandKind::UpdateRawHeaders)
            .arg(key)
            .stdin(headers)
            .build()?;
        self.dispatcher.dispatch(&descriptor).await?;
        Ok(())
    }

    /// Open the cache and exit, confirming it exists with the expected backend
    pub async fn verify(&self, target: &CacheTarget) -> Result<()> {
        let descriptor = self.descriptor(target, CommandKind::Stop).build()?;
        self.dispatcher.dispatch(&descriptor).await?;
        Ok(())
    }

    /// Feed a serialized command script to the tool's batch mode
    pub async fn batch(&self, target: &CacheTarget, script: impl Into<Bytes>) -> Result<Vec<String>> {
        let descriptor = self
            .descriptor(target, CommandKind::Batch)
            .stdin(script)
            .build()?;
        let result = self.dispatcher.dispatch(&descriptor).await?;
        Ok(result.stdout.into_lines())
    }
}
