//! Single-shot loading of a scene description and its buffers.
//!
//! Progress is counted in items: the description is one item and every
//! external buffer is another. Buffers are registered before the
//! description item finishes, so the total is known before any event can
//! report a full ratio.

use std::collections::HashMap;
use std::sync::Arc;

use roomview_decode::{DecoderRegistry, SceneGraph, document};
use web_time::Instant;

use crate::error::Result;
use crate::fetch::{Fetch, resolve_relative};
use crate::progress::{LoadEvent, ProgressSink};

/// What to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Path of the scene description, relative to the fetcher's root.
    /// Also the `source_id` of every progress event.
    pub url: String,
}

impl SourceDescriptor {
    /// Describe a scene at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Fetches and decodes one scene.
#[derive(Clone)]
pub struct SceneLoader {
    fetcher: Arc<dyn Fetch>,
    decoders: Arc<DecoderRegistry>,
}

impl std::fmt::Debug for SceneLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoader")
            .field("decoders", &self.decoders)
            .finish_non_exhaustive()
    }
}

impl SceneLoader {
    /// Create a loader reading through `fetcher`.
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetch>, decoders: DecoderRegistry) -> Self {
        Self {
            fetcher,
            decoders: Arc::new(decoders),
        }
    }

    /// The decoder registry used for compressed geometry.
    #[must_use]
    pub fn decoders(&self) -> &DecoderRegistry {
        &self.decoders
    }

    /// Load the scene described by `source`.
    ///
    /// Emits one [`LoadEvent`] per finished item. The last event is only
    /// emitted once the graph has been built, so a failed load never reports
    /// a full ratio.
    ///
    /// # Errors
    ///
    /// Returns the first fetch, parse or decode failure. Nothing is retried.
    pub async fn load(
        &self,
        source: &SourceDescriptor,
        sink: &dyn ProgressSink,
    ) -> Result<SceneGraph> {
        let start = Instant::now();
        let mut items = ItemCounter::new(&source.url, sink);
        items.register(1);

        tracing::debug!(url = %source.url, "fetching scene description");
        let bytes = self.fetcher.fetch(&source.url).await?;
        let parsed = document::parse(&bytes, &self.decoders)?;

        let external = parsed.external_buffers();
        items.register(external.len());
        items.finish(&source.url);

        let mut buffers = HashMap::with_capacity(external.len());
        for (index, uri) in external {
            let path = resolve_relative(&source.url, &uri);
            tracing::debug!(index, %path, "fetching buffer");
            let data = self.fetcher.fetch(&path).await?;
            items.finish(&path);
            buffers.insert(index, data);
        }

        let graph = parsed.into_scene(buffers, &self.decoders)?;
        items.complete();

        tracing::info!(
            url = %source.url,
            nodes = graph.len(),
            meshes = graph.meshes().len(),
            elapsed = ?start.elapsed(),
            "scene loaded"
        );
        Ok(graph)
    }
}

/// Counts finished items and reports them to the sink.
struct ItemCounter<'a> {
    source_id: &'a str,
    sink: &'a dyn ProgressSink,
    loaded: u64,
    total: u64,
    /// The final item, held back until the graph is built.
    deferred: Option<String>,
}

impl<'a> ItemCounter<'a> {
    fn new(source_id: &'a str, sink: &'a dyn ProgressSink) -> Self {
        Self {
            source_id,
            sink,
            loaded: 0,
            total: 0,
            deferred: None,
        }
    }

    fn register(&mut self, count: usize) {
        self.total += count as u64;
    }

    fn finish(&mut self, item: &str) {
        if self.loaded + 1 >= self.total {
            self.deferred = Some(item.to_string());
            return;
        }
        self.emit(item.to_string());
    }

    fn complete(&mut self) {
        if let Some(item) = self.deferred.take() {
            self.emit(item);
        }
    }

    fn emit(&mut self, item: String) {
        self.loaded += 1;
        tracing::debug!(item = %item, loaded = self.loaded, total = self.total, "item finished");
        self.sink.emit(LoadEvent {
            source_id: self.source_id.to_string(),
            item: Some(item),
            loaded: self.loaded,
            total: self.total,
        });
    }
}
