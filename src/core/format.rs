//! Formatter strings: native number formats vs. text rendering patterns

use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use regex::Regex;

use crate::types::Value;

/// strftime/printf directives (`%Y`, `%.2f`, ...) never appear in Excel
/// number formats, where `%` only stands for "percent".
fn directive_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"%[A-Za-z.]").ok()).as_ref()
}

fn numeric_directive() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"%(?:\.(\d+))?([dfe])").ok())
        .as_ref()
}

/// Whether `formatter` can be registered as a native number/date format.
pub fn is_native_number_format(formatter: &str) -> bool {
    !formatter.trim().is_empty()
        && !directive_pattern().is_some_and(|re| re.is_match(formatter))
}

/// Render `value` through a text pattern.
///
/// Dates use strftime directives, numbers accept one `%d`, `%f`, `%e`
/// directive with optional precision (`%.2f`). Returns `None` when the value
/// has no formatted form or the pattern does not apply to it.
pub fn render_formatted(value: &Value, pattern: &str) -> Option<String> {
    match value {
        Value::DateTime(dt) => {
            let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return None;
            }
            Some(dt.format_with_items(items.iter()).to_string())
        }
        Value::Int(i) => render_numeric(*i as f64, pattern),
        Value::Number(n) => render_numeric(*n, pattern),
        _ => None,
    }
}

fn render_numeric(n: f64, pattern: &str) -> Option<String> {
    let caps = numeric_directive()?.captures(pattern)?;
    let whole = caps.get(0)?;
    let precision = caps.get(1).and_then(|p| p.as_str().parse::<usize>().ok());

    let rendered = match caps.get(2)?.as_str() {
        "d" => format!("{}", n.round() as i64),
        "f" => format!("{:.*}", precision.unwrap_or(6), n),
        "e" => format!("{:.*e}", precision.unwrap_or(6), n),
        _ => return None,
    };

    Some(format!(
        "{}{}{}",
        &pattern[..whole.start()],
        rendered,
        &pattern[whole.end()..]
    ))
}
