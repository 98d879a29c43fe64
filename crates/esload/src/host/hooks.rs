//! Hook registries plugins tap into.
//!
//! Callbacks are kept as `Arc`s and cloned out before they run, so no lock is
//! held while an async tap is suspended.

use super::compilation::{Chunk, ChunkHasher, Compilation};
use super::stats::StatsPrinter;
use crate::Result;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::sync::Arc;

/// A registered callback.
pub struct Tap<F: ?Sized> {
    pub name: String,
    pub stage: i32,
    pub callback: Arc<F>,
}

/// An ordered list of taps, sorted by stage then registration order.
pub struct Hook<F: ?Sized> {
    taps: RwLock<Vec<Tap<F>>>,
}

impl<F: ?Sized> Hook<F> {
    pub fn new() -> Self {
        Self {
            taps: RwLock::new(Vec::new()),
        }
    }

    /// Register `callback` at stage 0.
    pub fn tap(&self, name: impl Into<String>, callback: Arc<F>) {
        self.tap_with_stage(name, 0, callback);
    }

    pub fn tap_with_stage(&self, name: impl Into<String>, stage: i32, callback: Arc<F>) {
        let mut taps = self.taps.write();
        let index = taps.partition_point(|tap| tap.stage <= stage);
        taps.insert(
            index,
            Tap {
                name: name.into(),
                stage,
                callback,
            },
        );
    }

    /// Snapshot of the callbacks in call order.
    pub fn callbacks(&self) -> Vec<Arc<F>> {
        self.taps.read().iter().map(|tap| tap.callback.clone()).collect()
    }

    /// Names of the registered taps in call order.
    pub fn names(&self) -> Vec<String> {
        self.taps.read().iter().map(|tap| tap.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.taps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.read().is_empty()
    }
}

impl<F: ?Sized> Default for Hook<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for Hook<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("taps", &self.names()).finish()
    }
}

/// Fired once per new compilation.
pub type CompilationFn = dyn Fn(&Compilation) -> Result<()> + Send + Sync;
pub type CompilationHook = Hook<CompilationFn>;

/// Contributes to a chunk's content hash.
pub type ChunkHashFn = dyn Fn(&Chunk, &mut ChunkHasher) + Send + Sync;
pub type ChunkHashHook = Hook<ChunkHashFn>;

/// Staged asset processing; receives the names of all assets.
pub type ProcessAssetsFn =
    dyn for<'a> Fn(&'a Compilation, Vec<String>) -> BoxFuture<'a, Result<()>> + Send + Sync;
pub type ProcessAssetsHook = Hook<ProcessAssetsFn>;

/// Legacy chunk-asset optimization; receives the chunks.
pub type OptimizeChunkAssetsFn =
    dyn for<'a> Fn(&'a Compilation, Vec<Chunk>) -> BoxFuture<'a, Result<()>> + Send + Sync;
pub type OptimizeChunkAssetsHook = Hook<OptimizeChunkAssetsFn>;

/// Lets plugins register printers for build reports.
pub type StatsPrinterFn = dyn Fn(&mut StatsPrinter) + Send + Sync;
pub type StatsPrinterHook = Hook<StatsPrinterFn>;

// The helpers below pin closure signatures (including the higher-ranked
// lifetime of async taps) so callers can write plain closures.

pub fn compilation_fn<F>(f: F) -> Arc<CompilationFn>
where
    F: Fn(&Compilation) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn chunk_hash_fn<F>(f: F) -> Arc<ChunkHashFn>
where
    F: Fn(&Chunk, &mut ChunkHasher) + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn process_assets_fn<F>(f: F) -> Arc<ProcessAssetsFn>
where
    F: for<'a> Fn(&'a Compilation, Vec<String>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

pub fn optimize_chunk_assets_fn<F>(f: F) -> Arc<OptimizeChunkAssetsFn>
where
    F: for<'a> Fn(&'a Compilation, Vec<Chunk>) -> BoxFuture<'a, Result<()>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

pub fn stats_printer_fn<F>(f: F) -> Arc<StatsPrinterFn>
where
    F: Fn(&mut StatsPrinter) + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    type NoteFn = dyn Fn(&mut Vec<&'static str>) + Send + Sync;

    fn note(label: &'static str) -> Arc<NoteFn> {
        Arc::new(move |log: &mut Vec<&'static str>| log.push(label))
    }

    #[test]
    fn taps_run_in_stage_then_registration_order() {
        let hook: Hook<NoteFn> = Hook::new();
        hook.tap_with_stage("late", 100, note("late"));
        hook.tap("first", note("first"));
        hook.tap("second", note("second"));
        hook.tap_with_stage("early", -10, note("early"));

        let mut log = Vec::new();
        for callback in hook.callbacks() {
            callback(&mut log);
        }

        assert_eq!(log, vec!["early", "first", "second", "late"]);
        assert_eq!(hook.names(), vec!["early", "first", "second", "late"]);
        assert_eq!(hook.len(), 4);
    }

    #[test]
    fn new_hook_is_empty() {
        let hook: Hook<NoteFn> = Hook::default();
        assert!(hook.is_empty());
    }
}
