//! Static HTML catalog rendering for arcdex.
//!
//! The page is a single self-contained file: styles, the catalog data and
//! the sort/filter script are all inlined, so it can be opened straight from
//! disk. Sorting and filtering happen in the browser.

use std::collections::{BTreeMap, BTreeSet};

use arcdex_shared::{ATTR_RARITY, Catalog, Rarity};
use chrono::{DateTime, Utc};
use tracing::debug;

const TEMPLATE: &str = include_str!("../templates/catalog.html");

/// Options for [`render_catalog`].
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Page `<title>` and heading.
    pub title: String,
    /// Timestamp printed in the footer. Defaults to now.
    pub generated_at: Option<DateTime<Utc>>,
}

impl RenderOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            generated_at: None,
        }
    }
}

/// Render the catalog to a complete HTML document.
pub fn render_catalog(catalog: &Catalog, options: &RenderOptions) -> String {
    let generated_at = options.generated_at.unwrap_or_else(Utc::now);

    let values = [
        ("title", escape_html(&options.title)),
        ("category_options", category_options(catalog)),
        ("rarity_options", rarity_options(catalog)),
        ("items_json", items_json(catalog)),
        ("item_count", catalog.len().to_string()),
        (
            "generated_at",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ];

    let html = fill_template(TEMPLATE, &values);
    debug!(
        items = catalog.len(),
        categories = catalog.category_count(),
        bytes = html.len(),
        "rendered catalog"
    );
    html
}

// ---------------------------------------------------------------------------
// Template pieces
// ---------------------------------------------------------------------------

/// The flattened item array as a JSON literal that is safe inside `<script>`.
///
/// Each item's `category` is set to the group it is listed under.
fn items_json(catalog: &Catalog) -> String {
    let cards: Vec<serde_json::Value> = catalog
        .items()
        .filter_map(|(category, item)| {
            let mut value = serde_json::to_value(item).ok()?;
            value
                .as_object_mut()?
                .insert("category".into(), category.into());
            Some(value)
        })
        .collect();

    let json = serde_json::Value::Array(cards).to_string();
    escape_script_json(&json)
}

fn category_options(catalog: &Catalog) -> String {
    catalog
        .categories()
        .map(|name| {
            let name = escape_html(name);
            format!("                <option value=\"{name}\">{name}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rarity labels present in the catalog: known tiers by rank, then any
/// unrecognised labels alphabetically.
///
/// Labels are deduplicated ignoring case; the page filter compares the
/// same way, so `epic` in the data matches the `Epic` option.
fn rarity_options(catalog: &Catalog) -> String {
    let mut known: BTreeSet<Rarity> = BTreeSet::new();
    let mut other: BTreeMap<String, &str> = BTreeMap::new();

    for (_, item) in catalog.items() {
        match (item.rarity(), item.attr(ATTR_RARITY)) {
            (Some(rarity), _) => {
                known.insert(rarity);
            }
            (None, Some(label)) if !label.trim().is_empty() => {
                let label = label.trim();
                other.entry(label.to_lowercase()).or_insert(label);
            }
            _ => {}
        }
    }

    known
        .iter()
        .map(|r| r.as_str())
        .chain(other.into_values())
        .map(|label| {
            let label = escape_html(label);
            format!("                <option value=\"{label}\">{label}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make serialized JSON safe to embed in a `<script>` element.
///
/// `<`, `>` and `&` only occur inside JSON strings, where `\uXXXX` escapes
/// are equivalent. U+2028/U+2029 are escaped for older JS parsers.
pub fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute `{{name}}` placeholders in a single pass.
///
/// Substituted values are never rescanned. Unknown placeholders are kept.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + 4096);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(name);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
