#![cfg_attr(docsrs, feature(doc_cfg))]

//! # esload
//!
//! Foundation crate for delegating a bundler's per-file transforms and asset
//! minification to an external esbuild service.
//!
//! The crate provides:
//!
//! - [`service`]: the [`TransformService`] seam (`build` / `transform`), its option
//!   types, and [`EsbuildProcess`], a service backed by the `esbuild` binary.
//! - [`host`]: the bundler host model the adapters plug into: [`Compiler`],
//!   [`Compilation`], hook registries for both asset-hook generations, the
//!   stats printer and loader plumbing.
//! - [`source`]: asset contents ([`RawSource`], [`SourceMapSource`]) and source-map
//!   composition.
//! - [`config`]: option types and figment-based configuration loading.
//!
//! The adapters themselves live in `esload-loader` and `esload-plugin-minify`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use esload::{Compiler, CompilerOptions, EsbuildProcess};
//! use std::sync::Arc;
//!
//! let compiler = Compiler::new(CompilerOptions::default().devtool("source-map"));
//! compiler.install_service(Arc::new(EsbuildProcess::new("esbuild")));
//! assert!(compiler.service().is_some());
//! ```

pub mod config;
pub mod error;
pub mod fs;
pub mod host;
pub mod service;
pub mod source;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{EsloadConfig, LoaderOptions, MinifyPluginOptions};
pub use error::{Error, Result, ServiceError, ServiceResult};
pub use fs::{InputFileSystem, MemoryFileSystem, NativeFileSystem};
pub use host::{
    Asset, AssetHooks, AssetInfo, Chunk, Compilation, Compiler, CompilerOptions,
    EsbuildServicePlugin, HookGeneration, Loader, LoaderCallback, LoaderContext, LoaderOutput,
    Plugin, Rule, Rules, PROCESS_ASSETS_STAGE_OPTIMIZE_SIZE,
};
pub use service::{
    BuildOptions, BuildResult, EsbuildProcess, Format, OutputFile, ServiceHandle, Sourcemap,
    StdinOptions, Target, TransformOptions, TransformResult, TransformService,
};
pub use source::{RawSource, Source, SourceMapSource};

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

/// Name mixed into chunk hashes and used as the log/message prefix.
pub const NAME: &str = "esload";

/// Crate version, mixed into chunk hashes alongside [`NAME`].
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
