//! Adapter options and configuration loading.
//!
//! Options use esbuild's camelCase keys. Configuration is layered with figment:
//! defaults, then `esload.toml` / `esload.json` (or an explicit file), then
//! `ESLOAD_`-prefixed environment variables with `__` separating nested keys
//! (e.g. `ESLOAD_MINIFY__SOURCEMAP=true`).

use crate::Result;
use crate::host::Rules;
use crate::service::{BuildOptions, Target, TransformOptions};
use figment::Figment;
use figment::providers::{Env, Format as _, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Options of the esbuild loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// Layered over the loader's base request; every field set here wins.
    #[serde(alias = "buildoptions")]
    pub build_options: BuildOptions,
}

impl LoaderOptions {
    pub fn new(build_options: BuildOptions) -> Self {
        Self { build_options }
    }
}

/// Options of the esbuild minify plugin.
///
/// `include` / `exclude` select assets and are not forwarded; everything else is
/// passed to the service's `transform` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinifyPluginOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Rules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Rules>,

    /// Emit source maps; inferred from the compiler's devtool when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcemap: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    #[serde(
        default,
        alias = "minifywhitespace",
        skip_serializing_if = "Option::is_none"
    )]
    pub minify_whitespace: Option<bool>,

    #[serde(
        default,
        alias = "minifyidentifiers",
        skip_serializing_if = "Option::is_none"
    )]
    pub minify_identifiers: Option<bool>,

    #[serde(default, alias = "minifysyntax", skip_serializing_if = "Option::is_none")]
    pub minify_syntax: Option<bool>,

    /// Pass-through transform options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MinifyPluginOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, rules: impl Into<Rules>) -> Self {
        self.include = Some(rules.into());
        self
    }

    pub fn exclude(mut self, rules: impl Into<Rules>) -> Self {
        self.exclude = Some(rules.into());
        self
    }

    pub fn sourcemap(mut self, sourcemap: bool) -> Self {
        self.sourcemap = Some(sourcemap);
        self
    }

    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = Some(minify);
        self
    }

    pub fn minify_whitespace(mut self, enabled: bool) -> Self {
        self.minify_whitespace = Some(enabled);
        self
    }

    pub fn minify_identifiers(mut self, enabled: bool) -> Self {
        self.minify_identifiers = Some(enabled);
        self
    }

    pub fn minify_syntax(mut self, enabled: bool) -> Self {
        self.minify_syntax = Some(enabled);
        self
    }

    /// Add a pass-through transform option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether any `minify*` option was given.
    pub fn has_minify_option(&self) -> bool {
        self.minify.is_some()
            || self.minify_whitespace.is_some()
            || self.minify_identifiers.is_some()
            || self.minify_syntax.is_some()
            || self.extra.keys().any(|key| key.starts_with("minify"))
    }

    /// Transform request for one asset.
    ///
    /// A pass-through `target` (string or list) becomes the typed field so
    /// services see a single language level list.
    pub fn transform_options(&self, sourcemap: bool, sourcefile: &str) -> TransformOptions {
        let mut extra = self.extra.clone();
        let target = extra
            .remove("target")
            .and_then(|value| match serde_json::from_value::<Target>(value.clone()) {
                Ok(target) => Some(target),
                Err(_) => {
                    extra.insert("target".to_string(), value);
                    None
                }
            });

        TransformOptions {
            target,
            minify: self.minify,
            minify_whitespace: self.minify_whitespace,
            minify_identifiers: self.minify_identifiers,
            minify_syntax: self.minify_syntax,
            sourcemap: Some(sourcemap.into()),
            sourcefile: Some(sourcefile.to_string()),
            extra,
            ..Default::default()
        }
    }
}

/// Configuration for both adapters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsloadConfig {
    pub loader: LoaderOptions,
    pub minify: MinifyPluginOptions,
}

impl EsloadConfig {
    /// Files looked up in the working directory when no path is given.
    pub const FILE_NAMES: [&'static str; 2] = ["esload.toml", "esload.json"];

    /// Layered configuration sources, lowest priority first.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(Path::to_path_buf).or_else(|| {
            Self::FILE_NAMES
                .iter()
                .map(Path::new)
                .find(|path| path.exists())
                .map(Path::to_path_buf)
        });

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading esload configuration");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }

        figment.merge(Env::prefixed("ESLOAD_").split("__"))
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Ok(Self::figment(config_path).extract()?)
    }
}
