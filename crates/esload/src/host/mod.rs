//! Bundler host model.
//!
//! The adapters never reach into a concrete bundler; they talk to a [`Compiler`]
//! (options, attached service, plugin application) and to the [`Compilation`]s
//! it starts (asset store, chunks, per-build hooks). The host exposes one of two
//! asset-hook generations, see [`AssetHooks`].

pub mod compilation;
pub mod compiler;
pub mod hooks;
pub mod loader;
pub mod rules;
pub mod stats;

pub use compilation::{
    Asset, AssetHooks, AssetInfo, Chunk, ChunkHasher, Compilation, CompilationHooks,
    LegacyAssetHooks, PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE, StagedAssetHooks,
};
pub use compiler::{
    Compiler, CompilerHooks, CompilerOptions, EsbuildServicePlugin, HookGeneration, Plugin,
};
pub use hooks::{Hook, Tap};
pub use loader::{Completion, Loader, LoaderCallback, LoaderContext, LoaderOutput, run_loader};
pub use rules::{Rule, Rules, match_object};
pub use stats::{PrintContext, StatsPrinter};
