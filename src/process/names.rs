// src/process/names.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("static regex"));

/// Normalize one source header to lower-snake-case.
///
/// - camel-case boundaries split: `TotEmp` → `tot_emp`
/// - any non-alphanumeric run becomes a single `_`, trimmed at both ends
/// - a leading digit gets an `x` prefix (`1/22/20` → `x1_22_20`), an empty header becomes `x`
pub fn clean_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev: Option<char> = None;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push('_');
        }
        prev = Some(c);
    }

    let collapsed = SEPARATOR_RUNS.replace_all(&out, "_");
    let trimmed = collapsed.trim_matches('_');
    match trimmed.chars().next() {
        None => "x".to_string(),
        Some(c) if c.is_ascii_digit() => format!("x{}", trimmed),
        Some(_) => trimmed.to_string(),
    }
}

/// Normalize a full header row; collisions get `_2`, `_3`, ... in source order.
pub fn clean_names<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(headers.len());
    headers
        .iter()
        .map(|h| {
            let base = clean_name(h.as_ref());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}_{}", base, count)
            }
        })
        .collect()
}
