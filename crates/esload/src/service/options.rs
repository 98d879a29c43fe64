//! Request and response types exchanged with a [`TransformService`](super::TransformService).
//!
//! Field names serialize in esbuild's camelCase so user configuration can use the
//! same keys esbuild documents. Keys esload does not model are kept in `extra`
//! and forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Iife,
    Cjs,
    Esm,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Iife => "iife",
            Format::Cjs => "cjs",
            Format::Esm => "esm",
        }
    }
}

/// Language level: one target or a list such as `["es2020", "chrome80"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    One(String),
    Many(Vec<String>),
}

impl Target {
    /// Comma-separated form used on the esbuild command line.
    pub fn to_arg(&self) -> String {
        match self {
            Target::One(target) => target.clone(),
            Target::Many(targets) => targets.join(","),
        }
    }
}

impl From<&str> for Target {
    fn from(target: &str) -> Self {
        Target::One(target.to_string())
    }
}

impl From<String> for Target {
    fn from(target: String) -> Self {
        Target::One(target)
    }
}

/// Source map request: a switch or one of esbuild's modes
/// (`"inline"`, `"external"`, `"linked"`, `"both"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sourcemap {
    Enabled(bool),
    Mode(String),
}

impl Sourcemap {
    pub fn is_enabled(&self) -> bool {
        match self {
            Sourcemap::Enabled(enabled) => *enabled,
            Sourcemap::Mode(_) => true,
        }
    }

    /// The `--sourcemap` flag, or `None` when maps are off.
    ///
    /// A plain `true` asks for an inline map, which services split back out.
    pub fn to_flag(&self) -> Option<String> {
        match self {
            Sourcemap::Enabled(true) => Some("--sourcemap=inline".to_string()),
            Sourcemap::Enabled(false) => None,
            Sourcemap::Mode(mode) => Some(format!("--sourcemap={mode}")),
        }
    }
}

impl From<bool> for Sourcemap {
    fn from(enabled: bool) -> Self {
        Sourcemap::Enabled(enabled)
    }
}

/// In-memory input for a build, used when the resource has no file on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdinOptions {
    pub contents: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcefile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_dir: Option<String>,
}

/// Options for a whole-file `build` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_points: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<StdinOptions>,

    /// Extension to loader mapping, e.g. `".esnext" -> "js"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<Sourcemap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    /// Pass-through options forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildOptions {
    /// Layer `overrides` on top of `self`; every field set in `overrides` wins.
    pub fn merge(mut self, overrides: BuildOptions) -> BuildOptions {
        self.extra.extend(overrides.extra);
        BuildOptions {
            entry_points: overrides.entry_points.or(self.entry_points),
            stdin: overrides.stdin.or(self.stdin),
            loader: overrides.loader.or(self.loader),
            target: overrides.target.or(self.target),
            write: overrides.write.or(self.write),
            format: overrides.format.or(self.format),
            sourcemap: overrides.sourcemap.or(self.sourcemap),
            minify: overrides.minify.or(self.minify),
            extra: self.extra,
        }
    }
}

/// Options for an in-memory `transform` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loader: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify_whitespace: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify_identifiers: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify_syntax: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<Sourcemap>,

    /// Logical file name used in diagnostics and source maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcefile: Option<String>,

    /// Pass-through options forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One in-memory output of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: String,
    pub text: String,
}

/// Result of a `build` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    /// `None` when the service produced no in-memory payload (e.g. `write: true`).
    pub output_files: Option<Vec<OutputFile>>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl BuildResult {
    /// Text of the first output payload.
    pub fn first_text(&self) -> Option<&str> {
        self.output_files
            .as_ref()?
            .first()
            .map(|file| file.text.as_str())
    }

    /// Text of a `.map` payload, if the build emitted one separately.
    pub fn source_map_text(&self) -> Option<&str> {
        self.output_files
            .as_ref()?
            .iter()
            .skip(1)
            .find(|file| file.path.ends_with(".map"))
            .map(|file| file.text.as_str())
    }
}

/// Result of a `transform` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub code: String,
    /// Source map JSON, present when `sourcemap` was requested.
    pub map: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
