//! Build report printing.
//!
//! Plugins register printers for keys such as `asset.info.minimized`; the first
//! printer returning `Some` decides how the value is rendered.

use owo_colors::OwoColorize;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Formatting helpers passed to printers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintContext {
    pub colors: bool,
}

impl PrintContext {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    pub fn green(&self, text: &str) -> String {
        if self.colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn format_flag(&self, flag: &str) -> String {
        format!("[{flag}]")
    }
}

pub type PrintFn = dyn Fn(&Value, &PrintContext) -> Option<String> + Send + Sync;

#[derive(Default)]
pub struct StatsPrinter {
    printers: FxHashMap<String, Vec<(String, Arc<PrintFn>)>>,
}

impl StatsPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a printer for `key` under the plugin `name`.
    pub fn print_for<F>(&mut self, key: impl Into<String>, name: impl Into<String>, printer: F)
    where
        F: Fn(&Value, &PrintContext) -> Option<String> + Send + Sync + 'static,
    {
        self.printers
            .entry(key.into())
            .or_default()
            .push((name.into(), Arc::new(printer)));
    }

    pub fn print(&self, key: &str, value: &Value, ctx: &PrintContext) -> Option<String> {
        self.printers
            .get(key)?
            .iter()
            .find_map(|(_, printer)| printer(value, ctx))
    }

    pub fn has_printer(&self, key: &str) -> bool {
        self.printers.get(key).is_some_and(|p| !p.is_empty())
    }
}

impl std::fmt::Debug for StatsPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.printers.keys().collect();
        keys.sort();
        f.debug_struct("StatsPrinter").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_some_wins() {
        let mut printer = StatsPrinter::new();
        printer.print_for("asset.info.size", "a", |_, _| None);
        printer.print_for("asset.info.size", "b", |v, _| Some(format!("{v} bytes")));
        printer.print_for("asset.info.size", "c", |_, _| Some("never".into()));

        let ctx = PrintContext::default();
        assert_eq!(
            printer.print("asset.info.size", &json!(10), &ctx).as_deref(),
            Some("10 bytes")
        );
        assert!(printer.print("asset.info.other", &json!(1), &ctx).is_none());
    }

    #[test]
    fn green_is_plain_without_colors() {
        let ctx = PrintContext::new(false);
        assert_eq!(ctx.green(&ctx.format_flag("minimized")), "[minimized]");

        let colored = PrintContext::new(true).green("ok");
        assert_ne!(colored, "ok");
        assert!(colored.contains("ok"));
    }
}
