//! Shared test utilities for esload-plugin-minify tests

#![allow(dead_code)]

use esload::test_utils::RecordingService;
use esload::{Compiler, CompilerOptions, MinifyPluginOptions, RawSource, Source};
use esload_plugin_minify::EsbuildMinifyPlugin;
use std::sync::Arc;

/// A compiler with a recording service and the minify plugin applied.
pub fn minify_compiler(
    compiler_options: CompilerOptions,
    options: MinifyPluginOptions,
    service: RecordingService,
) -> (Compiler, Arc<RecordingService>) {
    let compiler = Compiler::new(compiler_options);
    let service = Arc::new(service);
    compiler.install_service(service.clone());
    compiler.apply(&EsbuildMinifyPlugin::new(options));
    (compiler, service)
}

/// Named raw assets.
pub fn assets(entries: &[(&str, &str)]) -> Vec<(String, Source)> {
    entries
        .iter()
        .map(|(name, code)| (name.to_string(), RawSource::new(*code).into()))
        .collect()
}

/// Source text of an asset, panicking if it is missing.
pub fn text(compilation: &esload::Compilation, name: &str) -> String {
    compilation
        .get_asset(name)
        .unwrap_or_else(|| panic!("asset {name} missing"))
        .source
        .source()
        .to_string()
}
