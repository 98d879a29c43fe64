//! Test utilities
//!
//! `RecordingService` stands in for esbuild in adapter tests: it records every
//! request, tracks how many calls overlap, and can be told to fail.

use crate::service::{
    BuildOptions, BuildResult, OutputFile, Sourcemap, TransformOptions, TransformResult,
    TransformService,
};
use crate::{ServiceError, ServiceResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RecordingService {
    builds: Mutex<Vec<BuildOptions>>,
    transforms: Mutex<Vec<(String, TransformOptions)>>,
    fail_on: Option<String>,
    without_output: bool,
    map_file: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail transforms whose `sourcefile` is `name`, and builds whose input mentions it.
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.fail_on = Some(name.into());
        self
    }

    /// Answer builds with no output payload.
    pub fn without_output(mut self) -> Self {
        self.without_output = true;
        self
    }

    /// Answer builds with a second `.map` output file after the code.
    pub fn with_map_file(mut self) -> Self {
        self.map_file = true;
        self
    }

    pub fn builds(&self) -> Vec<BuildOptions> {
        self.builds.lock().clone()
    }

    pub fn transforms(&self) -> Vec<(String, TransformOptions)> {
        self.transforms.lock().clone()
    }

    /// `sourcefile` of every transform call, in call order.
    pub fn transformed_files(&self) -> Vec<String> {
        self.transforms
            .lock()
            .iter()
            .filter_map(|(_, options)| options.sourcefile.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.builds.lock().len() + self.transforms.lock().len()
    }

    /// Highest number of calls that were in progress at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        // Give sibling calls a chance to start before this one finishes.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Collapse whitespace, standing in for minification.
pub fn squeeze(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl TransformService for RecordingService {
    async fn build(&self, options: BuildOptions) -> ServiceResult<BuildResult> {
        self.builds.lock().push(options.clone());
        self.enter().await;
        self.exit();

        let input = match (&options.stdin, &options.entry_points) {
            (Some(stdin), _) => stdin.contents.clone(),
            (None, Some(entries)) => format!("entry:{}", entries.join(",")),
            (None, None) => String::new(),
        };
        if let Some(name) = &self.fail_on {
            let source = options.stdin.as_ref().and_then(|s| s.sourcefile.as_deref());
            if input.contains(name.as_str()) || source == Some(name.as_str()) {
                return Err(ServiceError::failed(format!("Could not build {name}")));
            }
        }

        if self.without_output {
            return Ok(BuildResult::default());
        }
        let mut output_files = vec![OutputFile {
            path: "<stdout>".to_string(),
            text: format!("/* built */ {}", squeeze(&input)),
        }];
        if self.map_file {
            let source = options
                .stdin
                .as_ref()
                .and_then(|stdin| stdin.sourcefile.clone())
                .or_else(|| options.entry_points.as_ref()?.first().cloned())
                .unwrap_or_default();
            output_files.push(OutputFile {
                path: "<stdout>.map".to_string(),
                text: serde_json::json!({
                    "version": 3,
                    "sources": [source],
                    "names": [],
                    "mappings": "AAAA",
                })
                .to_string(),
            });
        }
        Ok(BuildResult {
            output_files: Some(output_files),
            warnings: Vec::new(),
        })
    }

    async fn transform(
        &self,
        input: &str,
        options: TransformOptions,
    ) -> ServiceResult<TransformResult> {
        self.transforms
            .lock()
            .push((input.to_string(), options.clone()));
        self.enter().await;
        self.exit();

        let sourcefile = options.sourcefile.clone().unwrap_or_default();
        if self.fail_on.as_deref() == Some(sourcefile.as_str()) {
            return Err(ServiceError::failed(format!(
                "Transform failed for {sourcefile}"
            )));
        }

        let map = (options.sourcemap.as_ref().is_some_and(Sourcemap::is_enabled)).then(|| {
            serde_json::json!({
                "version": 3,
                "sources": [sourcefile],
                "names": [],
                "mappings": "AAAA",
            })
            .to_string()
        });

        Ok(TransformResult {
            code: squeeze(input),
            map,
            warnings: Vec::new(),
        })
    }
}
