//! Asset contents.
//!
//! A [`Source`] is either plain text or text plus a source map. Sources are
//! immutable and cheap to clone; replacing an asset means storing a new source.

mod remap;

use crate::Result;
use std::sync::Arc;

/// Content of an asset in the compilation's asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Raw(RawSource),
    Map(SourceMapSource),
}

impl Source {
    /// The asset text.
    pub fn source(&self) -> &str {
        match self {
            Source::Raw(raw) => raw.source(),
            Source::Map(mapped) => mapped.source(),
        }
    }

    /// Source map JSON describing this text, if any.
    pub fn map(&self) -> Result<Option<String>> {
        match self {
            Source::Raw(_) => Ok(None),
            Source::Map(mapped) => mapped.map().map(Some),
        }
    }

    pub fn source_and_map(&self) -> Result<(&str, Option<String>)> {
        Ok((self.source(), self.map()?))
    }

    /// Size of the text in bytes.
    pub fn size(&self) -> usize {
        self.source().len()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Source::Map(_))
    }
}

impl From<RawSource> for Source {
    fn from(source: RawSource) -> Self {
        Source::Raw(source)
    }
}

impl From<SourceMapSource> for Source {
    fn from(source: SourceMapSource) -> Self {
        Source::Map(source)
    }
}

/// Text without a source map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource {
    code: Arc<str>,
}

impl RawSource {
    pub fn new(code: impl Into<Arc<str>>) -> Self {
        Self { code: code.into() }
    }

    pub fn source(&self) -> &str {
        &self.code
    }
}

/// Generated text with a map back to an intermediate text, optionally chained
/// to that intermediate text's own map.
///
/// `map` describes `code` in terms of `name`, whose content is `original_source`.
/// When `inner_source_map` is present (it describes `original_source`), the two
/// maps are composed so the result points at the inner map's sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapSource {
    code: Arc<str>,
    name: String,
    map: Option<Arc<str>>,
    original_source: Option<Arc<str>>,
    inner_source_map: Option<Arc<str>>,
    remove_original_source: bool,
}

impl SourceMapSource {
    pub fn new(code: impl Into<Arc<str>>, name: impl Into<String>, map: Option<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            map: map.map(Into::into),
            original_source: None,
            inner_source_map: None,
            remove_original_source: false,
        }
    }

    /// Attach the text `map` was generated from and that text's own map.
    pub fn with_original(
        mut self,
        original_source: impl Into<Arc<str>>,
        inner_source_map: Option<String>,
    ) -> Self {
        self.original_source = Some(original_source.into());
        self.inner_source_map = inner_source_map.map(Into::into);
        self
    }

    /// Drop mappings into the intermediate text that the inner map cannot resolve.
    pub fn remove_original_source(mut self, remove: bool) -> Self {
        self.remove_original_source = remove;
        self
    }

    pub fn source(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original_source(&self) -> Option<&str> {
        self.original_source.as_deref()
    }

    pub fn inner_source_map(&self) -> Option<&str> {
        self.inner_source_map.as_deref()
    }

    /// The combined source map as JSON.
    pub fn map(&self) -> Result<String> {
        match &self.map {
            Some(map) => remap::combine(
                map,
                &self.name,
                self.original_source.as_deref(),
                self.inner_source_map.as_deref(),
                self.remove_original_source,
            ),
            // No new map: the inner map still describes the untouched text.
            None => match &self.inner_source_map {
                Some(inner) => Ok(inner.to_string()),
                None => Ok(remap::identity(&self.name, &self.code)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_source_has_no_map() {
        let source = Source::from(RawSource::new("a();"));
        assert_eq!(source.source(), "a();");
        assert_eq!(source.size(), 4);
        assert!(source.map().unwrap().is_none());
        assert!(!source.is_mapped());
    }

    #[test]
    fn mapped_source_without_maps_gets_identity_map() {
        let source = SourceMapSource::new("a();\nb();", "main.js", None);
        let map: serde_json::Value = serde_json::from_str(&source.map().unwrap()).unwrap();
        assert_eq!(map["sources"][0], "main.js");
        assert_eq!(map["sourcesContent"][0], "a();\nb();");
    }

    #[test]
    fn mapped_source_without_new_map_keeps_inner_map() {
        let inner = r#"{"version":3,"sources":["src/a.ts"],"names":[],"mappings":"AAAA"}"#;
        let source = SourceMapSource::new("a();", "main.js", None)
            .with_original("a();", Some(inner.to_string()));
        assert_eq!(source.map().unwrap(), inner);
    }
}
