//! Shared test utilities for esload-loader tests

#![allow(dead_code)]

use esload::test_utils::RecordingService;
use esload::{Compiler, CompilerOptions, LoaderContext, LoaderOptions, MemoryFileSystem};
use std::path::Path;
use std::sync::Arc;

/// A compiler with a recording service attached.
pub fn compiler_with_service() -> (Compiler, Arc<RecordingService>) {
    compiler_with(RecordingService::new())
}

pub fn compiler_with(service: RecordingService) -> (Compiler, Arc<RecordingService>) {
    let compiler = Compiler::new(CompilerOptions::default());
    let service = Arc::new(service);
    compiler.install_service(service.clone());
    (compiler, service)
}

/// Loader context whose filesystem contains only `files`.
pub fn context_with_files(
    compiler: Compiler,
    resource: impl AsRef<Path>,
    files: &[&str],
) -> LoaderContext {
    let fs = MemoryFileSystem::new("/project");
    for file in files {
        fs.add_file(*file, b"".to_vec());
    }
    LoaderContext::new(compiler, resource.as_ref())
        .fs(Arc::new(fs))
        .options(LoaderOptions::default())
}
