//! The build host: options, plugin application and the attached service.

use super::compilation::{Chunk, Compilation};
use super::hooks::CompilationHook;
use crate::service::ServiceHandle;
use crate::source::Source;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::sync::Arc;

/// Which asset-hook API the host exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookGeneration {
    /// `optimize_chunk_assets` only, receiving chunks.
    Legacy,
    /// Staged `process_assets` plus `stats_printer`.
    #[default]
    Staged,
}

#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Devtool setting, e.g. `"source-map"` or `"eval"`.
    pub devtool: Option<String>,
    pub hook_generation: HookGeneration,
    /// Colorize report output.
    pub colors: bool,
}

impl CompilerOptions {
    pub fn devtool(mut self, devtool: impl Into<String>) -> Self {
        self.devtool = Some(devtool.into());
        self
    }

    pub fn hook_generation(mut self, generation: HookGeneration) -> Self {
        self.hook_generation = generation;
        self
    }

    pub fn colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Whether the devtool setting asks for source maps.
    pub fn wants_source_maps(&self) -> bool {
        self.devtool
            .as_deref()
            .is_some_and(|devtool| devtool.contains("source-map"))
    }
}

#[derive(Debug, Default)]
pub struct CompilerHooks {
    pub compilation: CompilationHook,
}

/// A plugin applied to a compiler.
pub trait Plugin: Send + Sync {
    fn name(&self) -> Cow<'static, str>;

    /// Register hooks on `compiler`.
    fn apply(&self, compiler: &Compiler);
}

/// Host build instance. Cloning shares the same compiler.
#[derive(Clone)]
pub struct Compiler {
    inner: Arc<CompilerInner>,
}

struct CompilerInner {
    options: CompilerOptions,
    hooks: CompilerHooks,
    service: RwLock<Option<ServiceHandle>>,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            inner: Arc::new(CompilerInner {
                options,
                hooks: CompilerHooks::default(),
                service: RwLock::new(None),
            }),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.inner.options
    }

    pub fn hooks(&self) -> &CompilerHooks {
        &self.inner.hooks
    }

    /// Attach the transform service used by the loader and minify plugin.
    pub fn install_service(&self, service: ServiceHandle) {
        *self.inner.service.write() = Some(service);
    }

    pub fn service(&self) -> Option<ServiceHandle> {
        self.inner.service.read().clone()
    }

    /// The attached service, or [`Error::MissingService`].
    pub fn require_service(&self) -> Result<ServiceHandle> {
        self.service().ok_or(Error::MissingService)
    }

    pub fn apply(&self, plugin: &dyn Plugin) {
        tracing::debug!(plugin = %plugin.name(), "applying plugin");
        plugin.apply(self);
    }

    /// Start a compilation with the given assets and chunks and fire `compilation` taps.
    pub fn compilation(
        &self,
        assets: impl IntoIterator<Item = (String, Source)>,
        chunks: Vec<Chunk>,
    ) -> Result<Compilation> {
        let compilation = Compilation::new(self.clone(), chunks);
        for (name, source) in assets {
            compilation.emit_asset(name, source, Default::default());
        }
        for callback in self.hooks().compilation.callbacks() {
            callback(&compilation)?;
        }
        Ok(compilation)
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.inner.options)
            .field("hooks", &self.inner.hooks)
            .field("service", &self.inner.service.read().is_some())
            .finish()
    }
}

/// Attaches a service to the compiler when applied.
#[derive(Debug, Clone)]
pub struct EsbuildServicePlugin {
    service: ServiceHandle,
}

impl EsbuildServicePlugin {
    pub fn new(service: ServiceHandle) -> Self {
        Self { service }
    }
}

impl Plugin for EsbuildServicePlugin {
    fn name(&self) -> Cow<'static, str> {
        "esbuild-service".into()
    }

    fn apply(&self, compiler: &Compiler) {
        compiler.install_service(self.service.clone());
    }
}
