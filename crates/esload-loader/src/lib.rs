//! esbuild loader
//!
//! Transforms one module per call by forwarding it to the compiler's esbuild
//! service and returning the service's output text.
//!
//! ## Request shape
//!
//! ```text
//! resource exists on disk?
//!   yes -> entryPoints: [resource_path]           (esbuild reads the file itself)
//!   no  -> stdin: { contents, sourcefile, "js" }  (in-memory source)
//! + loader { ".esnext": "js" }, target es2015, write false, format cjs, sourcemap
//! + user buildOptions on top (user keys always win)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use esload::{Compiler, CompilerOptions, EsbuildProcess, LoaderContext};
//! use esload::host::run_loader;
//! use esload_loader::EsbuildLoader;
//! use std::sync::Arc;
//!
//! # async fn example() -> esload::Result<()> {
//! let compiler = Compiler::new(CompilerOptions::default());
//! compiler.install_service(Arc::new(EsbuildProcess::new("esbuild")));
//!
//! let ctx = LoaderContext::new(compiler, "src/index.esnext");
//! let output = run_loader(&EsbuildLoader::new(), &ctx, "export default 1".into()).await?;
//! println!("{}", output.code);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use esload::service::{BuildOptions, Format, StdinOptions};
use esload::{Error, Loader, LoaderCallback, LoaderContext, LoaderOutput, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Language level of the loader's output unless overridden.
pub const BASE_TARGET: &str = "es2015";

/// Loader forwarding each module to the esbuild service.
#[derive(Debug, Clone, Copy, Default)]
pub struct EsbuildLoader;

impl EsbuildLoader {
    pub fn new() -> Self {
        Self
    }

    /// Request sent for `resource_path` before user options are applied.
    pub fn base_options(
        resource_path: &Path,
        source: &str,
        file_exists: bool,
        source_map: bool,
    ) -> BuildOptions {
        let path = resource_path.to_string_lossy().into_owned();
        let (entry_points, stdin) = if file_exists {
            (Some(vec![path]), None)
        } else {
            let stdin = StdinOptions {
                contents: source.to_string(),
                sourcefile: Some(path),
                loader: Some("js".to_string()),
                resolve_dir: None,
            };
            (None, Some(stdin))
        };

        BuildOptions {
            entry_points,
            stdin,
            loader: Some(BTreeMap::from([(".esnext".to_string(), "js".to_string())])),
            target: Some(BASE_TARGET.into()),
            write: Some(false),
            format: Some(Format::Cjs),
            sourcemap: Some(source_map.into()),
            ..Default::default()
        }
    }

    /// The merged request for one module.
    pub fn build_request(ctx: &LoaderContext, source: &str) -> BuildOptions {
        let file_exists = ctx.fs.exists(&ctx.resource_path);
        Self::base_options(&ctx.resource_path, source, file_exists, ctx.source_map)
            .merge(ctx.options.build_options.clone())
    }

    /// Transform one module.
    pub async fn transform(&self, ctx: &LoaderContext, source: &str) -> Result<LoaderOutput> {
        let service = ctx.compiler.require_service()?;
        let request = Self::build_request(ctx, source);
        tracing::trace!(path = %ctx.resource_path.display(), ?request, "esbuild build request");

        let result = service.build(request).await?;
        let code = result.first_text().ok_or_else(|| Error::NoOutput {
            path: ctx.resource_path.clone(),
        })?;

        tracing::debug!(
            path = %ctx.resource_path.display(),
            input = source.len(),
            output = code.len(),
            "esbuild loader transformed module"
        );

        Ok(LoaderOutput {
            code: code.to_string(),
            map: result.source_map_text().map(str::to_string),
        })
    }
}

#[async_trait]
impl Loader for EsbuildLoader {
    fn name(&self) -> &'static str {
        "esbuild-loader"
    }

    async fn run(&self, ctx: &LoaderContext, source: String, done: LoaderCallback) {
        done.done(self.transform(ctx, &source).await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esload::service::{Sourcemap, Target};

    #[test]
    fn existing_files_are_entry_points() {
        let options = EsbuildLoader::base_options(Path::new("/src/a.js"), "a()", true, false);
        assert_eq!(options.entry_points, Some(vec!["/src/a.js".to_string()]));
        assert!(options.stdin.is_none());
    }

    #[test]
    fn missing_files_go_through_stdin_verbatim() {
        let source = "export const x = 1;\n// keep me\n";
        let options = EsbuildLoader::base_options(Path::new("virtual.js"), source, false, true);

        let stdin = options.stdin.expect("stdin input");
        assert_eq!(stdin.contents, source);
        assert_eq!(stdin.sourcefile.as_deref(), Some("virtual.js"));
        assert_eq!(stdin.loader.as_deref(), Some("js"));
        assert!(options.entry_points.is_none());
    }

    #[test]
    fn base_request_fields() {
        let options = EsbuildLoader::base_options(Path::new("/a.js"), "", true, true);
        assert_eq!(options.loader.unwrap()[".esnext"], "js");
        assert_eq!(options.target, Some(Target::from(BASE_TARGET)));
        assert_eq!(options.write, Some(false));
        assert_eq!(options.format, Some(Format::Cjs));
        assert_eq!(options.sourcemap, Some(Sourcemap::Enabled(true)));
    }

    #[test]
    fn loader_name() {
        assert_eq!(EsbuildLoader::new().name(), "esbuild-loader");
    }
}
