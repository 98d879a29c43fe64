//! A single build: its chunks, asset store and per-build hooks.

use super::compiler::{Compiler, HookGeneration};
use super::hooks::{ChunkHashHook, OptimizeChunkAssetsHook, ProcessAssetsHook, StatsPrinterHook};
use super::stats::{PrintContext, StatsPrinter};
use crate::source::Source;
use crate::{Error, Result};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Stage at which size-reducing asset transforms run.
pub const PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE: i32 = 400;

/// A chunk and the files it emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub name: Option<String>,
    pub files: Vec<String>,
}

impl Chunk {
    pub fn new(name: impl Into<String>, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: Some(name.into()),
            files: files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Metadata attached to an asset. Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub development: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named entry of the asset store.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub source: Source,
    pub info: AssetInfo,
}

/// Accumulates the input of a chunk's content hash.
pub struct ChunkHasher(Sha256);

impl ChunkHasher {
    fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        self.0.update(data.as_ref());
    }

    fn finish(self) -> String {
        format!("{:x}", self.0.finalize())
    }
}

/// Hooks of the older API: only a coarse per-chunk optimization hook.
#[derive(Debug, Default)]
pub struct LegacyAssetHooks {
    pub optimize_chunk_assets: OptimizeChunkAssetsHook,
}

/// Hooks of the newer API: staged asset processing plus report printing.
#[derive(Debug, Default)]
pub struct StagedAssetHooks {
    pub process_assets: ProcessAssetsHook,
    pub stats_printer: StatsPrinterHook,
}

/// The asset hooks a host exposes; exactly one generation is available.
#[derive(Debug)]
pub enum AssetHooks {
    Legacy(LegacyAssetHooks),
    Staged(StagedAssetHooks),
}

impl AssetHooks {
    fn for_generation(generation: HookGeneration) -> Self {
        match generation {
            HookGeneration::Legacy => AssetHooks::Legacy(LegacyAssetHooks::default()),
            HookGeneration::Staged => AssetHooks::Staged(StagedAssetHooks::default()),
        }
    }

    pub fn generation(&self) -> HookGeneration {
        match self {
            AssetHooks::Legacy(_) => HookGeneration::Legacy,
            AssetHooks::Staged(_) => HookGeneration::Staged,
        }
    }
}

#[derive(Debug)]
pub struct CompilationHooks {
    pub chunk_hash: ChunkHashHook,
    pub assets: AssetHooks,
}

pub struct Compilation {
    compiler: Compiler,
    hooks: CompilationHooks,
    assets: RwLock<IndexMap<String, Asset>>,
    chunks: Vec<Chunk>,
}

impl Compilation {
    pub(crate) fn new(compiler: Compiler, chunks: Vec<Chunk>) -> Self {
        let generation = compiler.options().hook_generation;
        Self {
            compiler,
            hooks: CompilationHooks {
                chunk_hash: ChunkHashHook::new(),
                assets: AssetHooks::for_generation(generation),
            },
            assets: RwLock::new(IndexMap::new()),
            chunks,
        }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn hooks(&self) -> &CompilationHooks {
        &self.hooks
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Asset names in emission order.
    pub fn asset_names(&self) -> Vec<String> {
        self.assets.read().keys().cloned().collect()
    }

    pub fn get_asset(&self, name: &str) -> Option<Asset> {
        self.assets.read().get(name).cloned()
    }

    pub fn emit_asset(&self, name: impl Into<String>, source: impl Into<Source>, info: AssetInfo) {
        let name = name.into();
        let asset = Asset {
            name: name.clone(),
            source: source.into(),
            info,
        };
        self.assets.write().insert(name, asset);
    }

    /// Replace an existing asset's source; `info` derives the new metadata from the old.
    pub fn update_asset(
        &self,
        name: &str,
        source: impl Into<Source>,
        info: impl FnOnce(&AssetInfo) -> AssetInfo,
    ) -> Result<()> {
        let mut assets = self.assets.write();
        let asset = assets
            .get_mut(name)
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))?;
        let info = info(&asset.info);
        *asset = Asset {
            name: name.to_string(),
            source: source.into(),
            info,
        };
        Ok(())
    }

    /// Run the asset optimization phase through whichever hook generation is present.
    pub async fn optimize_assets(&self) -> Result<()> {
        match &self.hooks.assets {
            AssetHooks::Staged(hooks) => {
                for callback in hooks.process_assets.callbacks() {
                    callback(self, self.asset_names()).await?;
                }
            }
            AssetHooks::Legacy(hooks) => {
                for callback in hooks.optimize_chunk_assets.callbacks() {
                    callback(self, self.chunks.clone()).await?;
                }
            }
        }
        Ok(())
    }

    /// Content hash of `chunk`, including every `chunk_hash` tap's input.
    pub fn chunk_hash(&self, chunk: &Chunk) -> String {
        let mut hasher = ChunkHasher::new();
        if let Some(name) = &chunk.name {
            hasher.update(name);
        }
        for file in &chunk.files {
            hasher.update(file);
            if let Some(asset) = self.assets.read().get(file) {
                hasher.update(asset.source.source());
            }
        }
        for callback in self.hooks.chunk_hash.callbacks() {
            callback(chunk, &mut hasher);
        }
        hasher.finish()
    }

    /// A stats printer with every plugin's printers registered.
    pub fn stats_printer(&self) -> StatsPrinter {
        let mut printer = StatsPrinter::new();
        if let AssetHooks::Staged(hooks) = &self.hooks.assets {
            for callback in hooks.stats_printer.callbacks() {
                callback(&mut printer);
            }
        }
        printer
    }

    /// Rendered report flags for an asset's metadata, e.g. `["[minimized]"]`.
    pub fn asset_flags(&self, name: &str) -> Vec<String> {
        let Some(asset) = self.get_asset(name) else {
            return Vec::new();
        };
        let Ok(Value::Object(fields)) = serde_json::to_value(&asset.info) else {
            return Vec::new();
        };

        let printer = self.stats_printer();
        let ctx = PrintContext::new(self.compiler.options().colors);
        fields
            .iter()
            .filter_map(|(key, value)| printer.print(&format!("asset.info.{key}"), value, &ctx))
            .collect()
    }
}

impl std::fmt::Debug for Compilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compilation")
            .field("generation", &self.hooks.assets.generation())
            .field("assets", &self.asset_names())
            .field("chunks", &self.chunks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CompilerOptions;
    use crate::host::hooks::{chunk_hash_fn, process_assets_fn, stats_printer_fn};
    use crate::source::RawSource;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn compilation(generation: HookGeneration) -> Compilation {
        let compiler = Compiler::new(CompilerOptions::default().hook_generation(generation));
        compiler
            .compilation(
                [
                    ("main.js".to_string(), RawSource::new("main()").into()),
                    ("main.css".to_string(), RawSource::new("a{}").into()),
                ],
                vec![Chunk::new("main", ["main.js", "main.css"])],
            )
            .unwrap()
    }

    #[test]
    fn update_asset_replaces_source_and_derives_info() {
        let compilation = compilation(HookGeneration::Staged);
        let mut info = AssetInfo::default();
        info.extra.insert("hotModuleReplacement".into(), json!(true));
        compilation.emit_asset("hot.js", RawSource::new("x"), info);

        compilation
            .update_asset("hot.js", RawSource::new("y"), |old| AssetInfo {
                minimized: true,
                ..old.clone()
            })
            .unwrap();

        let asset = compilation.get_asset("hot.js").unwrap();
        assert_eq!(asset.source.source(), "y");
        assert!(asset.info.minimized);
        assert_eq!(asset.info.extra["hotModuleReplacement"], json!(true));
    }

    #[test]
    fn update_missing_asset_fails() {
        let compilation = compilation(HookGeneration::Staged);
        let err = compilation
            .update_asset("nope.js", RawSource::new(""), Clone::clone)
            .unwrap_err();
        assert!(matches!(err, Error::AssetNotFound(name) if name == "nope.js"));
    }

    #[tokio::test]
    async fn staged_hooks_receive_all_asset_names() {
        let compilation = compilation(HookGeneration::Staged);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let AssetHooks::Staged(hooks) = &compilation.hooks().assets else {
            panic!("expected staged hooks");
        };
        let sink = seen.clone();
        hooks.process_assets.tap_with_stage(
            "test",
            PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE,
            process_assets_fn(move |_, names| {
                sink.lock().extend(names);
                async { Ok(()) }.boxed()
            }),
        );

        compilation.optimize_assets().await.unwrap();
        assert_eq!(*seen.lock(), vec!["main.js", "main.css"]);
    }

    #[test]
    fn chunk_hash_includes_tap_input() {
        let compilation = compilation(HookGeneration::Legacy);
        let chunk = compilation.chunks()[0].clone();
        let before = compilation.chunk_hash(&chunk);
        assert_eq!(before, compilation.chunk_hash(&chunk));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        compilation.hooks().chunk_hash.tap(
            "test",
            chunk_hash_fn(move |_, hasher| {
                counter.fetch_add(1, Ordering::SeqCst);
                hasher.update("extra");
            }),
        );

        let after = compilation.chunk_hash(&chunk);
        assert_ne!(before, after);
        assert_eq!(after.len(), 64);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn asset_flags_use_registered_printers() {
        let compilation = compilation(HookGeneration::Staged);
        let AssetHooks::Staged(hooks) = &compilation.hooks().assets else {
            panic!("expected staged hooks");
        };
        hooks.stats_printer.tap(
            "test",
            stats_printer_fn(|printer| {
                printer.print_for("asset.info.immutable", "test", |value, ctx| {
                    (value == &json!(true)).then(|| ctx.format_flag("immutable"))
                });
            }),
        );

        assert!(compilation.asset_flags("main.js").is_empty());
        compilation
            .update_asset("main.js", RawSource::new("main()"), |old| AssetInfo {
                immutable: true,
                ..old.clone()
            })
            .unwrap();
        assert_eq!(compilation.asset_flags("main.js"), vec!["[immutable]"]);
    }

    #[test]
    fn legacy_compilations_have_no_printers() {
        let compilation = compilation(HookGeneration::Legacy);
        assert_eq!(compilation.hooks().assets.generation(), HookGeneration::Legacy);
        assert!(!compilation.stats_printer().has_printer("asset.info.minimized"));
    }
}
