//! Per-file loader plumbing.
//!
//! A loader reports its result through a [`LoaderCallback`] exactly once:
//! `done` consumes the callback, and a callback dropped without reporting
//! resolves the waiting side with [`Error::LoaderDropped`].

use super::compiler::Compiler;
use crate::config::LoaderOptions;
use crate::fs::{InputFileSystem, NativeFileSystem};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;

/// What the host knows about the file being loaded.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    pub resource_path: PathBuf,
    /// Whether the host wants a source map for this file.
    pub source_map: bool,
    pub options: LoaderOptions,
    pub compiler: Compiler,
    pub fs: Arc<dyn InputFileSystem>,
}

impl LoaderContext {
    pub fn new(compiler: Compiler, resource_path: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            source_map: false,
            options: LoaderOptions::default(),
            compiler,
            fs: Arc::new(NativeFileSystem),
        }
    }

    pub fn source_map(mut self, source_map: bool) -> Self {
        self.source_map = source_map;
        self
    }

    pub fn options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn fs(mut self, fs: Arc<dyn InputFileSystem>) -> Self {
        self.fs = fs;
        self
    }
}

/// Replacement text for a loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderOutput {
    pub code: String,
    pub map: Option<String>,
}

/// Completion handle given to a loader.
#[derive(Debug)]
pub struct LoaderCallback {
    sender: oneshot::Sender<Result<LoaderOutput>>,
}

/// Waiting side of a [`LoaderCallback`].
#[derive(Debug)]
pub struct Completion {
    receiver: oneshot::Receiver<Result<LoaderOutput>>,
    resource_path: PathBuf,
}

impl LoaderCallback {
    pub fn channel(resource_path: impl Into<PathBuf>) -> (LoaderCallback, Completion) {
        let (sender, receiver) = oneshot::channel();
        (
            LoaderCallback { sender },
            Completion {
                receiver,
                resource_path: resource_path.into(),
            },
        )
    }

    /// Report the loader's result.
    pub fn done(self, result: Result<LoaderOutput>) {
        // The host may have stopped waiting; nothing else can observe the result then.
        let _ = self.sender.send(result);
    }
}

impl Completion {
    pub async fn wait(self) -> Result<LoaderOutput> {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(Error::LoaderDropped {
                path: self.resource_path,
            }),
        }
    }
}

/// A per-file transform invoked by the host.
#[async_trait]
pub trait Loader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform `source` and report through `done`.
    async fn run(&self, ctx: &LoaderContext, source: String, done: LoaderCallback);
}

/// Run `loader` on one file and wait for its reported result.
pub async fn run_loader(
    loader: &dyn Loader,
    ctx: &LoaderContext,
    source: String,
) -> Result<LoaderOutput> {
    let (callback, completion) = LoaderCallback::channel(&ctx.resource_path);
    loader.run(ctx, source, callback).await;
    completion.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CompilerOptions;

    struct Upper;

    #[async_trait]
    impl Loader for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn run(&self, _ctx: &LoaderContext, source: String, done: LoaderCallback) {
            done.done(Ok(LoaderOutput {
                code: source.to_uppercase(),
                map: None,
            }));
        }
    }

    struct Forgetful;

    #[async_trait]
    impl Loader for Forgetful {
        fn name(&self) -> &'static str {
            "forgetful"
        }

        async fn run(&self, _ctx: &LoaderContext, _source: String, _done: LoaderCallback) {}
    }

    fn ctx() -> LoaderContext {
        LoaderContext::new(Compiler::new(CompilerOptions::default()), "/src/a.js")
    }

    #[tokio::test]
    async fn reported_result_is_returned() {
        let output = run_loader(&Upper, &ctx(), "abc".into()).await.unwrap();
        assert_eq!(output.code, "ABC");
    }

    #[tokio::test]
    async fn dropped_callback_is_an_error() {
        let err = run_loader(&Forgetful, &ctx(), "abc".into())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LoaderDropped { path } if path == PathBuf::from("/src/a.js")));
    }

    #[tokio::test]
    async fn completion_sees_errors() {
        let (callback, completion) = LoaderCallback::channel("/src/b.js");
        callback.done(Err(Error::MissingService));
        assert!(matches!(
            completion.wait().await,
            Err(Error::MissingService)
        ));
    }
}
