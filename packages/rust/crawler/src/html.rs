//! Small scraper helpers shared by the listing and item parsers.

use scraper::ElementRef;
use url::Url;

/// All descendant text joined as-is, then trimmed.
pub(crate) fn text_of(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Every descendant text node trimmed, then joined with no separator.
///
/// `<div><img/> 1,250 <span>cr</span></div>` becomes `"1,250cr"`.
pub(crate) fn stripped_text(el: &ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}

/// Whether any class on the element satisfies `pred`.
pub(crate) fn any_class(el: &ElementRef<'_>, pred: impl Fn(&str) -> bool) -> bool {
    el.value().classes().any(pred)
}

/// Resolve `href` against `base`, dropping the fragment.
pub(crate) fn resolve(base: &Url, href: &str) -> Option<String> {
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
