//! Source map composition for [`SourceMapSource`](super::SourceMapSource).

use crate::{Error, Result};
use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use rustc_hash::FxHashMap;

/// Compose `map` (generated -> `name`) with `inner_map` (`name` -> originals).
pub(super) fn combine(
    map: &str,
    name: &str,
    original_source: Option<&str>,
    inner_map: Option<&str>,
    remove_original_source: bool,
) -> Result<String> {
    let outer = parse(map)?;
    let inner = inner_map.map(parse).transpose()?;
    let inner_table = inner.as_ref().map(|inner| inner.generate_lookup_table());

    let mut out = Composer::default();

    for token in outer.get_tokens() {
        let Some(src_id) = token.get_source_id() else {
            continue;
        };
        let source_name = outer.get_source(src_id).map(|s| s.to_string());
        let outer_name = token
            .get_name_id()
            .and_then(|id| outer.get_name(id))
            .map(|s| s.to_string());
        let is_intermediate = source_name.as_deref() == Some(name);

        if is_intermediate {
            if let (Some(inner), Some(table)) = (&inner, &inner_table) {
                let original = inner.lookup_token(table, token.get_src_line(), token.get_src_col());
                let resolved = original.and_then(|original| {
                    let inner_src = original.get_source_id()?;
                    let inner_name = original
                        .get_name_id()
                        .and_then(|id| inner.get_name(id))
                        .map(|s| s.to_string());
                    Some((
                        inner_src,
                        original.get_src_line(),
                        original.get_src_col(),
                        inner_name,
                    ))
                });

                if let Some((inner_src, src_line, src_col, inner_name)) = resolved {
                    let source = inner
                        .get_source(inner_src)
                        .map(|s| s.to_string())
                        .unwrap_or_default();
                    let content = inner.get_source_content(inner_src).map(|c| c.to_string());
                    let source_id = out.source(&source, content.as_deref());
                    let name_id = inner_name.or(outer_name).map(|n| out.name(&n));
                    out.builder.add_token(
                        token.get_dst_line(),
                        token.get_dst_col(),
                        src_line,
                        src_col,
                        Some(source_id),
                        name_id,
                    );
                    continue;
                }

                if remove_original_source {
                    continue;
                }
            }
        }

        let source = source_name.unwrap_or_default();
        let content = if is_intermediate {
            original_source.map(str::to_string)
        } else {
            outer.get_source_content(src_id).map(|c| c.to_string())
        };
        let source_id = out.source(&source, content.as_deref());
        let name_id = outer_name.map(|n| out.name(&n));
        out.builder.add_token(
            token.get_dst_line(),
            token.get_dst_col(),
            token.get_src_line(),
            token.get_src_col(),
            Some(source_id),
            name_id,
        );
    }

    Ok(out.builder.into_sourcemap().to_json_string())
}

/// Line-by-line map of `code` onto itself.
pub(super) fn identity(name: &str, code: &str) -> String {
    let mut builder = SourceMapBuilder::default();
    let source_id = builder.add_source_and_content(name, code);
    for line in 0..code.lines().count() {
        let line = line as u32;
        builder.add_token(line, 0, line, 0, Some(source_id), None);
    }
    builder.into_sourcemap().to_json_string()
}

fn parse(json: &str) -> Result<SourceMap> {
    SourceMap::from_json_string(json).map_err(|e| Error::SourceMap(format!("{e:?}")))
}

#[derive(Default)]
struct Composer {
    builder: SourceMapBuilder,
    sources: FxHashMap<String, u32>,
    names: FxHashMap<String, u32>,
}

impl Composer {
    fn source(&mut self, source: &str, content: Option<&str>) -> u32 {
        if let Some(id) = self.sources.get(source) {
            return *id;
        }
        let id = self
            .builder
            .add_source_and_content(source, content.unwrap_or_default());
        self.sources.insert(source.to_string(), id);
        id
    }

    fn name(&mut self, name: &str) -> u32 {
        if let Some(id) = self.names.get(name) {
            return *id;
        }
        let id = self.builder.add_name(name);
        self.names.insert(name.to_string(), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn json(map: &str) -> Value {
        serde_json::from_str(map).unwrap()
    }

    const OUTER: &str =
        r#"{"version":3,"sources":["main.js"],"names":[],"mappings":"AAAA,KAAK"}"#;

    #[test]
    fn without_inner_map_references_intermediate_text() {
        let combined = combine(OUTER, "main.js", Some("let  a = 1;"), None, true).unwrap();
        let map = json(&combined);
        assert_eq!(map["sources"][0], "main.js");
        assert_eq!(map["sourcesContent"][0], "let  a = 1;");
    }

    #[test]
    fn inner_map_sources_replace_intermediate() {
        let inner = r#"{"version":3,"sources":["src/main.ts"],"sourcesContent":["const a: number = 1;"],"names":[],"mappings":"AAAA"}"#;
        let combined = combine(OUTER, "main.js", Some("let a = 1;"), Some(inner), true).unwrap();
        let map = json(&combined);
        assert_eq!(map["sources"][0], "src/main.ts");
        assert_eq!(map["sourcesContent"][0], "const a: number = 1;");
    }

    #[test]
    fn invalid_map_is_reported() {
        let err = combine("not json", "main.js", None, None, true).unwrap_err();
        assert!(matches!(err, Error::SourceMap(_)));
    }

    #[test]
    fn identity_maps_every_line() {
        let map = json(&identity("a.js", "a();\nb();\n"));
        assert_eq!(map["sources"][0], "a.js");
        assert_eq!(map["mappings"], "AAAA;AACA");
    }
}
