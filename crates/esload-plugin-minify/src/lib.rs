//! esbuild minify plugin
//!
//! Rewrites every selected `.js` asset of a compilation with the output of the
//! esbuild service's `transform` call, during the size-optimization stage.
//!
//! ## Hook generations
//!
//! ```text
//! staged  -> process_assets @ PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE (asset names)
//!            + stats printer for `asset.info.minimized`
//! legacy  -> optimize_chunk_assets (chunk files, flattened and de-duplicated)
//! ```
//!
//! Both paths end in [`EsbuildMinifyPlugin::transform_assets`]. All transforms of
//! one batch run concurrently and are committed only when every one succeeded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use esload::{Compiler, CompilerOptions, EsbuildProcess, EsbuildServicePlugin, MinifyPluginOptions};
//! use esload_plugin_minify::EsbuildMinifyPlugin;
//! use std::sync::Arc;
//!
//! let compiler = Compiler::new(CompilerOptions::default().devtool("source-map"));
//! compiler.apply(&EsbuildServicePlugin::new(Arc::new(EsbuildProcess::new("esbuild"))));
//! compiler.apply(&EsbuildMinifyPlugin::new(
//!     MinifyPluginOptions::new().exclude("vendor"),
//! ));
//! ```

use esload::host::hooks::{
    chunk_hash_fn, compilation_fn, optimize_chunk_assets_fn, process_assets_fn,
    stats_printer_fn,
};
use esload::{
    AssetHooks, AssetInfo, Chunk, Compilation, Compiler, CompilerOptions, Error,
    MinifyPluginOptions, PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE, Plugin, RawSource, Result, Source,
    SourceMapSource,
};
use futures::FutureExt;
use futures::future::try_join_all;
use rustc_hash::FxHashSet;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "esbuild-minify";

/// Stats key the plugin renders as `[minimized]`.
pub const MINIMIZED_STATS_KEY: &str = "asset.info.minimized";

/// Minifies JavaScript assets through the compiler's esbuild service.
#[derive(Debug, Clone)]
pub struct EsbuildMinifyPlugin {
    options: Arc<MinifyPluginOptions>,
    identity: Arc<str>,
}

impl EsbuildMinifyPlugin {
    /// Create the plugin. Without any `minify*` option, full minification is enabled.
    pub fn new(options: MinifyPluginOptions) -> Self {
        let options = if options.has_minify_option() {
            options
        } else {
            options.minify(true)
        };
        let identity = json!({
            "name": esload::NAME,
            "version": esload::VERSION,
            "options": options,
        })
        .to_string();

        Self {
            options: Arc::new(options),
            identity: identity.into(),
        }
    }

    pub fn options(&self) -> &MinifyPluginOptions {
        &self.options
    }

    /// Blob mixed into every chunk hash so cache keys follow the plugin configuration.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether assets get source maps for this compiler.
    pub fn effective_sourcemap(&self, compiler_options: &CompilerOptions) -> bool {
        self.options
            .sourcemap
            .unwrap_or_else(|| compiler_options.wants_source_maps())
    }

    /// Whether `name` is selected by the `.js` suffix and include/exclude rules.
    pub fn should_process(&self, name: &str) -> bool {
        is_js_asset(name)
            && esload::host::match_object(
                self.options.include.as_ref(),
                self.options.exclude.as_ref(),
                name,
            )
    }

    fn on_compilation(&self, compilation: &Compilation) -> Result<()> {
        compilation.compiler().require_service()?;

        let identity = self.identity.clone();
        compilation.hooks().chunk_hash.tap(
            PLUGIN_NAME,
            chunk_hash_fn(move |_chunk, hasher| hasher.update(identity.as_bytes())),
        );

        match &compilation.hooks().assets {
            AssetHooks::Staged(hooks) => {
                let plugin = self.clone();
                hooks.process_assets.tap_with_stage(
                    PLUGIN_NAME,
                    PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE,
                    process_assets_fn(move |compilation, names| {
                        let plugin = plugin.clone();
                        async move { plugin.transform_assets(compilation, names).await }.boxed()
                    }),
                );
                hooks.stats_printer.tap(
                    PLUGIN_NAME,
                    stats_printer_fn(|printer| {
                        printer.print_for(MINIMIZED_STATS_KEY, PLUGIN_NAME, |value, ctx| {
                            value
                                .as_bool()
                                .filter(|minimized| *minimized)
                                .map(|_| ctx.green(&ctx.format_flag("minimized")))
                        });
                    }),
                );
            }
            AssetHooks::Legacy(hooks) => {
                let plugin = self.clone();
                hooks.optimize_chunk_assets.tap(
                    PLUGIN_NAME,
                    optimize_chunk_assets_fn(move |compilation, chunks| {
                        let plugin = plugin.clone();
                        async move {
                            plugin
                                .transform_assets(compilation, chunk_files(&chunks))
                                .await
                        }
                        .boxed()
                    }),
                );
            }
        }
        Ok(())
    }

    /// Minify the selected assets among `names`.
    ///
    /// Every transform is awaited before any asset is replaced; if one fails,
    /// the error is returned and the asset store is left as it was.
    pub async fn transform_assets(
        &self,
        compilation: &Compilation,
        names: Vec<String>,
    ) -> Result<()> {
        let service = compilation.compiler().require_service()?;
        let sourcemap = self.effective_sourcemap(compilation.compiler().options());

        let mut pending = Vec::new();
        for name in names.into_iter().filter(|name| self.should_process(name)) {
            let asset = compilation
                .get_asset(&name)
                .ok_or_else(|| Error::AssetNotFound(name.clone()))?;
            let (code, map) = if sourcemap {
                let (code, map) = asset.source.source_and_map()?;
                (code.to_string(), map)
            } else {
                (asset.source.source().to_string(), None)
            };
            pending.push((name, code, map));
        }
        if pending.is_empty() {
            return Ok(());
        }

        tracing::debug!(assets = pending.len(), sourcemap, "minifying assets");
        let results = try_join_all(pending.iter().map(|(name, code, _)| {
            service.transform(code, self.options.transform_options(sourcemap, name))
        }))
        .await?;

        for ((name, original, inner_map), result) in pending.into_iter().zip(results) {
            for warning in &result.warnings {
                tracing::warn!(asset = %name, "{warning}");
            }
            tracing::trace!(
                asset = %name,
                before = original.len(),
                after = result.code.len(),
                "asset minified"
            );

            let source: Source = if sourcemap {
                SourceMapSource::new(result.code, name.clone(), result.map)
                    .with_original(original, inner_map)
                    .remove_original_source(true)
                    .into()
            } else {
                RawSource::new(result.code).into()
            };
            compilation.update_asset(&name, source, |info| AssetInfo {
                minimized: true,
                ..info.clone()
            })?;
        }
        Ok(())
    }
}

impl Plugin for EsbuildMinifyPlugin {
    fn name(&self) -> Cow<'static, str> {
        PLUGIN_NAME.into()
    }

    fn apply(&self, compiler: &Compiler) {
        let plugin = self.clone();
        compiler.hooks().compilation.tap(
            PLUGIN_NAME,
            compilation_fn(move |compilation| plugin.on_compilation(compilation)),
        );
    }
}

/// Case-insensitive `.js` suffix check.
pub fn is_js_asset(name: &str) -> bool {
    name.len()
        .checked_sub(3)
        .and_then(|start| name.get(start..))
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case(".js"))
}

/// Files of all chunks, first occurrence wins.
fn chunk_files(chunks: &[Chunk]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    chunks
        .iter()
        .flat_map(|chunk| chunk.files.iter())
        .filter(|file| seen.insert(file.as_str()))
        .cloned()
        .collect()
}
