//! [`TransformService`] backed by the `esbuild` command line binary.

use super::{
    BuildOptions, BuildResult, OutputFile, Sourcemap, TransformOptions, TransformResult,
};
use super::TransformService;
use crate::{ServiceError, ServiceResult};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const INLINE_MAP_MARKER: &str = "//# sourceMappingURL=data:application/json;base64,";

/// Runs one `esbuild` process per call.
///
/// Builds print to stdout unless `write` is set, in which case esbuild writes the
/// files named by `outfile`/`outdir` itself and the result carries no payload.
/// A plain `sourcemap: true` is requested inline and split back out of the
/// output; explicit modes are passed through untouched.
#[derive(Debug, Clone)]
pub struct EsbuildProcess {
    binary: PathBuf,
    cwd: Option<PathBuf>,
}

impl EsbuildProcess {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cwd: None,
        }
    }

    /// Run esbuild from `cwd` instead of the current directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Command line arguments for a build call.
    pub fn build_args(options: &BuildOptions) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(entries) = &options.entry_points {
            args.extend(entries.iter().cloned());
        }
        if let Some(stdin) = &options.stdin {
            if let Some(sourcefile) = &stdin.sourcefile {
                args.push(format!("--sourcefile={sourcefile}"));
            }
            if let Some(loader) = &stdin.loader {
                args.push(format!("--loader={loader}"));
            }
        }
        if let Some(loaders) = &options.loader {
            for (ext, loader) in loaders {
                args.push(format!("--loader:{ext}={loader}"));
            }
        }
        if let Some(target) = &options.target {
            args.push(format!("--target={}", target.to_arg()));
        }
        if let Some(format) = options.format {
            args.push(format!("--format={}", format.as_str()));
        }
        if let Some(flag) = options.sourcemap.as_ref().and_then(Sourcemap::to_flag) {
            args.push(flag);
        }
        if options.minify == Some(true) {
            args.push("--minify".to_string());
        }
        push_extra_flags(&mut args, &options.extra);
        args
    }

    /// Command line arguments for a transform call.
    pub fn transform_args(options: &TransformOptions) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(loader) = &options.loader {
            args.push(format!("--loader={loader}"));
        }
        if let Some(target) = &options.target {
            args.push(format!("--target={}", target.to_arg()));
        }
        if let Some(format) = options.format {
            args.push(format!("--format={}", format.as_str()));
        }
        for (flag, enabled) in [
            ("--minify", options.minify),
            ("--minify-whitespace", options.minify_whitespace),
            ("--minify-identifiers", options.minify_identifiers),
            ("--minify-syntax", options.minify_syntax),
        ] {
            if enabled == Some(true) {
                args.push(flag.to_string());
            }
        }
        if let Some(flag) = options.sourcemap.as_ref().and_then(Sourcemap::to_flag) {
            args.push(flag);
        }
        if let Some(sourcefile) = &options.sourcefile {
            args.push(format!("--sourcefile={sourcefile}"));
        }
        push_extra_flags(&mut args, &options.extra);
        args
    }

    async fn run(&self, args: Vec<String>, input: Option<&str>) -> ServiceResult<String> {
        let mut command = Command::new(&self.binary);
        command
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        tracing::trace!(binary = %self.binary.display(), ?args, "spawning esbuild");
        let mut child = command.spawn().map_err(ServiceError::Spawn)?;

        // esbuild reads stdin to EOF before writing, so closing it here cannot deadlock
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(input) = input {
                stdin.write_all(input.as_bytes()).await?;
            }
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::failed(stderr.trim()));
        }

        String::from_utf8(output.stdout).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TransformService for EsbuildProcess {
    async fn build(&self, options: BuildOptions) -> ServiceResult<BuildResult> {
        let args = Self::build_args(&options);
        let input = options.stdin.as_ref().map(|stdin| stdin.contents.as_str());
        let text = self.run(args, input).await?;
        Ok(build_result(options.write, text))
    }

    async fn transform(
        &self,
        input: &str,
        options: TransformOptions,
    ) -> ServiceResult<TransformResult> {
        let wants_map = options.sourcemap == Some(Sourcemap::Enabled(true));
        let text = self.run(Self::transform_args(&options), Some(input)).await?;

        let (code, map) = if wants_map {
            split_inline_map(&text)?
        } else {
            (text, None)
        };

        Ok(TransformResult {
            code,
            map,
            warnings: Vec::new(),
        })
    }
}

/// esbuild only returns output files when it did not write them to disk.
fn build_result(write: Option<bool>, stdout: String) -> BuildResult {
    let output_files = (write != Some(true)).then(|| {
        vec![OutputFile {
            path: "<stdout>".to_string(),
            text: stdout,
        }]
    });
    BuildResult {
        output_files,
        warnings: Vec::new(),
    }
}

/// Split a trailing inline `sourceMappingURL` comment into code and map JSON.
fn split_inline_map(text: &str) -> ServiceResult<(String, Option<String>)> {
    let Some(index) = text.rfind(INLINE_MAP_MARKER) else {
        return Ok((text.to_string(), None));
    };

    let encoded = text[index + INLINE_MAP_MARKER.len()..].trim();
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| ServiceError::Decode(e.to_string()))?;
    let map = String::from_utf8(decoded).map_err(|e| ServiceError::Decode(e.to_string()))?;

    Ok((text[..index].to_string(), Some(map)))
}

/// Render pass-through options as esbuild flags (`keepNames` -> `--keep-names`).
fn push_extra_flags(args: &mut Vec<String>, extra: &Map<String, Value>) {
    for (key, value) in extra {
        let flag = format!("--{}", kebab_case(key));
        match value {
            Value::Null => {}
            Value::Bool(true) => args.push(flag),
            Value::Bool(false) => args.push(format!("{flag}=false")),
            Value::String(s) => args.push(format!("{flag}={s}")),
            Value::Number(n) => args.push(format!("{flag}={n}")),
            Value::Array(items) => {
                for item in items {
                    args.push(format!("{flag}={}", scalar(item)));
                }
            }
            Value::Object(entries) => {
                for (name, item) in entries {
                    args.push(format!("{flag}:{name}={}", scalar(item)));
                }
            }
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Format, StdinOptions};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn build_args_for_entry_point() {
        let options = BuildOptions {
            entry_points: Some(vec!["/src/app.js".into()]),
            loader: Some(BTreeMap::from([(".esnext".to_string(), "js".to_string())])),
            target: Some("es2015".into()),
            write: Some(false),
            format: Some(Format::Cjs),
            sourcemap: Some(true.into()),
            ..Default::default()
        };

        assert_eq!(
            EsbuildProcess::build_args(&options),
            vec![
                "/src/app.js",
                "--loader:.esnext=js",
                "--target=es2015",
                "--format=cjs",
                "--sourcemap=inline",
            ]
        );
    }

    #[test]
    fn build_args_for_stdin() {
        let options = BuildOptions {
            stdin: Some(StdinOptions {
                contents: "export default 1".into(),
                sourcefile: Some("virtual.js".into()),
                loader: Some("js".into()),
                resolve_dir: None,
            }),
            ..Default::default()
        };

        let args = EsbuildProcess::build_args(&options);
        assert_eq!(args, vec!["--sourcefile=virtual.js", "--loader=js"]);
    }

    #[test]
    fn target_lists_and_sourcemap_modes_reach_the_command_line() {
        let options: BuildOptions = serde_json::from_value(json!({
            "entryPoints": ["/src/app.js"],
            "target": ["es2020", "chrome80"],
            "sourcemap": "external"
        }))
        .unwrap();
        assert_eq!(
            EsbuildProcess::build_args(&options),
            vec!["/src/app.js", "--target=es2020,chrome80", "--sourcemap=external"]
        );

        let options = TransformOptions {
            target: Some("node18".into()),
            sourcemap: Some(false.into()),
            ..Default::default()
        };
        assert_eq!(EsbuildProcess::transform_args(&options), vec!["--target=node18"]);
    }

    #[test]
    fn written_builds_have_no_payload() {
        let written = build_result(Some(true), String::new());
        assert!(written.output_files.is_none());
        assert_eq!(written.first_text(), None);

        let in_memory = build_result(Some(false), "a();".into());
        assert_eq!(in_memory.first_text(), Some("a();"));
        assert_eq!(build_result(None, "b();".into()).first_text(), Some("b();"));
    }

    #[test]
    fn transform_args_include_minify_flags_and_extras() {
        let mut options = TransformOptions {
            minify_whitespace: Some(true),
            minify_syntax: Some(false),
            sourcefile: Some("main.js".into()),
            ..Default::default()
        };
        options.extra.insert("keepNames".into(), json!(true));
        options.extra.insert("define".into(), json!({ "DEBUG": "false" }));
        options.extra.insert("pure".into(), json!(["console.log"]));

        let args = EsbuildProcess::transform_args(&options);
        assert!(args.contains(&"--minify-whitespace".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--minify-syntax")));
        assert!(args.contains(&"--sourcefile=main.js".to_string()));
        assert!(args.contains(&"--keep-names".to_string()));
        assert!(args.contains(&"--define:DEBUG=false".to_string()));
        assert!(args.contains(&"--pure=console.log".to_string()));
    }

    #[test]
    fn splits_inline_source_map() {
        let map = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA"}"#;
        let text = format!("a();\n{}{}\n", INLINE_MAP_MARKER, STANDARD.encode(map));

        let (code, extracted) = split_inline_map(&text).unwrap();
        assert_eq!(code, "a();\n");
        assert_eq!(extracted.as_deref(), Some(map));
    }

    #[test]
    fn text_without_inline_map_is_kept() {
        let (code, map) = split_inline_map("a();\n").unwrap();
        assert_eq!(code, "a();\n");
        assert!(map.is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let service = EsbuildProcess::new("/nonexistent/esbuild-binary");
        let err = service
            .transform("a()", TransformOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Spawn(_)));
    }
}
