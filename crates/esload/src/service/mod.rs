//! The transform service seam.
//!
//! Both adapters talk to esbuild only through [`TransformService`]. A handle is
//! attached to the [`Compiler`](crate::Compiler) once, before any adapter runs,
//! and shared read-only for the compiler's lifetime.

mod options;
mod process;

pub use options::{
    BuildOptions, BuildResult, Format, OutputFile, Sourcemap, StdinOptions, Target,
    TransformOptions, TransformResult,
};
pub use process::EsbuildProcess;

use crate::ServiceResult;
use async_trait::async_trait;
use std::sync::Arc;

/// External transpiler service.
///
/// Both calls may suspend until the service answers and may fail; callers
/// propagate failures unchanged and never retry.
#[async_trait]
pub trait TransformService: Send + Sync + std::fmt::Debug {
    /// Build one file (or stdin input) and return the in-memory outputs.
    async fn build(&self, options: BuildOptions) -> ServiceResult<BuildResult>;

    /// Transform a string of source text.
    async fn transform(
        &self,
        input: &str,
        options: TransformOptions,
    ) -> ServiceResult<TransformResult>;
}

/// Shared handle to the service attached to a compiler.
pub type ServiceHandle = Arc<dyn TransformService>;
