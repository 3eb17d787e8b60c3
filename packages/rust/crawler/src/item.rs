//! Item page extraction: category, rarity, image and infobox fields.

use arcdex_shared::{
    ATTR_RARITY, ATTR_SELL_PRICE, ATTR_SELL_PRICE_ALL_LEVELS, ArcdexError, Item, ItemLink,
    Rarity, Result, category_for_tag, title_case,
};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::html::{any_class, resolve, stripped_text, text_of};

/// Parse a fetched item page into an [`Item`].
///
/// `listing_category` is the category of the listing page the link came
/// from; it is kept unless the page's data-tag rows name a different one.
/// Pages with neither a content area nor an infobox are rejected.
#[instrument(skip(html, base_url), fields(item = %link.name))]
pub fn parse_item_page(
    html: &str,
    link: &ItemLink,
    listing_category: &str,
    base_url: &Url,
) -> Result<Item> {
    let doc = Html::parse_document(html);

    let content_sel = Selector::parse("div#mw-content-text").unwrap();
    let infobox_sel = Selector::parse("table.infobox").unwrap();
    let content = doc.select(&content_sel).next();
    let infobox = doc.select(&infobox_sel).next();

    if content.is_none() && infobox.is_none() {
        return Err(ArcdexError::parse(format!(
            "{}: page has no wiki content",
            link.url
        )));
    }

    let mut item = Item::new(link.name.clone(), link.url.clone());

    // Category reassignment
    let category = match tagged_category(&doc) {
        Some(actual) if actual != listing_category => {
            info!(
                item = %link.name,
                from = listing_category,
                to = actual,
                "reassigned item category"
            );
            actual.to_string()
        }
        Some(actual) => actual.to_string(),
        None => listing_category.to_string(),
    };
    item.category = Some(category);

    // Rarity and row background
    if let Some(rarity_row) = rarity_row(&doc) {
        if let Some(rarity) = rarity_from_row(&rarity_row) {
            let style = rarity_row.value().attr("style").unwrap_or("");
            item.background_color = if style.contains("background") {
                Some(style.to_string())
            } else {
                Rarity::parse(&rarity).map(|r| r.color().to_string())
            };
            item.set_attribute(ATTR_RARITY, rarity);
        }
    }

    // Main image
    if let Some(content) = content {
        if let Some((image_url, gradient)) = main_image(&content, base_url) {
            if gradient.is_some() {
                debug!(item = %link.name, "found image gradient style");
            }
            item.image_url = Some(image_url);
            item.image_gradient = gradient;
        }
    }

    // Infobox fields
    if let Some(infobox) = infobox {
        read_infobox(&infobox, &mut item);
    }

    Ok(item)
}

/// The display category named by the first meaningful data-tag row.
///
/// Rows qualify when a class contains `data-tag` and none contains `icon`;
/// the first whose cell text is a known tag value wins.
fn tagged_category(doc: &Html) -> Option<&'static str> {
    let row_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    doc.select(&row_sel)
        .filter(|row| {
            any_class(row, |c| c.contains("data-tag")) && !any_class(row, |c| c.contains("icon"))
        })
        .find_map(|row| {
            let td = row.select(&td_sel).next()?;
            category_for_tag(&stripped_text(&td))
        })
}

/// The first row carrying a `data-tag-<rarity>` class.
fn rarity_row(doc: &Html) -> Option<ElementRef<'_>> {
    let row_sel = Selector::parse("tr").unwrap();
    doc.select(&row_sel)
        .find(|row| any_class(row, |c| rarity_class(c).is_some()))
}

fn rarity_from_row(row: &ElementRef<'_>) -> Option<String> {
    row.value()
        .classes()
        .find_map(rarity_class)
        .map(title_case)
}

/// `data-tag-epic` → `Some("epic")`. The bare `data-tag` and icon rows are not rarities.
fn rarity_class(class: &str) -> Option<&str> {
    let suffix = class.strip_prefix("data-tag-")?;
    if suffix.is_empty() || suffix.contains("icon") {
        return None;
    }
    Some(suffix)
}

/// Absolute URL of the first content image, plus its parent's style when
/// that style paints a background or gradient.
fn main_image(content: &ElementRef<'_>, base_url: &Url) -> Option<(String, Option<String>)> {
    let img_sel = Selector::parse("img").unwrap();
    let img = content.select(&img_sel).next()?;
    let src = img.value().attr("src")?;
    let image_url = resolve(base_url, src)?;

    let gradient = img
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.value().attr("style"))
        .filter(|style| style.contains("background") || style.contains("gradient"))
        .map(str::to_string);

    Some((image_url, gradient))
}

/// Copy every `th`/`td` pair of the infobox into the item's attributes.
fn read_infobox(infobox: &ElementRef<'_>, item: &mut Item) {
    let row_sel = Selector::parse("tr").unwrap();
    let th_sel = Selector::parse("th").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    for row in infobox.select(&row_sel) {
        let (Some(th), Some(td)) = (row.select(&th_sel).next(), row.select(&td_sel).next()) else {
            continue;
        };
        let key = text_of(&th);

        if key.eq_ignore_ascii_case(ATTR_SELL_PRICE) {
            let prices = sell_prices(&td);
            if prices.len() > 1 {
                item.set_attribute(ATTR_SELL_PRICE_ALL_LEVELS, prices.join(","));
            }
            if let Some(first) = prices.into_iter().next() {
                item.set_attribute(ATTR_SELL_PRICE, first);
            }
            continue;
        }

        if !item.set_attribute(key.clone(), text_of(&td)) {
            debug!(item = %item.name, key = %key, "infobox label shadows a fixed field, skipped");
        }
    }
}

/// Sell prices in a cell, commas removed.
///
/// Multi-level items carry one `div.template-price` per level; a single
/// price may or may not be wrapped; bare text is the last resort.
fn sell_prices(td: &ElementRef<'_>) -> Vec<String> {
    let price_sel = Selector::parse("div.template-price").unwrap();
    let prices: Vec<String> = td
        .select(&price_sel)
        .map(|div| stripped_text(&div).replace(',', ""))
        .collect();

    if prices.is_empty() {
        vec![text_of(td).replace(',', "")]
    } else {
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcdex_shared::ATTR_STACK_SIZE;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn base() -> Url {
        Url::parse("https://arcraiders.wiki").unwrap()
    }

    fn link(name: &str) -> ItemLink {
        ItemLink {
            name: name.into(),
            url: format!("https://arcraiders.wiki/wiki/{}", name.replace(' ', "_")),
        }
    }

    #[test]
    fn weapon_listed_as_loot_is_reassigned() {
        let item =
            parse_item_page(&load_fixture("item_kettle.html"), &link("Kettle"), "Loot", &base())
                .unwrap();
        assert_eq!(item.category.as_deref(), Some("Weapons"));
    }

    #[test]
    fn multi_level_sell_price() {
        let item =
            parse_item_page(&load_fixture("item_kettle.html"), &link("Kettle"), "Loot", &base())
                .unwrap();
        assert_eq!(item.attr(ATTR_SELL_PRICE), Some("640"));
        assert_eq!(
            item.attr(ATTR_SELL_PRICE_ALL_LEVELS),
            Some("640,1000,2000,3500")
        );
        assert_eq!(item.sell_price(), 640.0);
    }

    #[test]
    fn rarity_without_style_uses_palette() {
        let item =
            parse_item_page(&load_fixture("item_kettle.html"), &link("Kettle"), "Loot", &base())
                .unwrap();
        assert_eq!(item.attr(ATTR_RARITY), Some("Epic"));
        assert_eq!(item.background_color.as_deref(), Some("#a335ee"));
    }

    #[test]
    fn image_and_gradient() {
        let item =
            parse_item_page(&load_fixture("item_kettle.html"), &link("Kettle"), "Loot", &base())
                .unwrap();
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://arcraiders.wiki/images/thumb/Kettle.png/120px-Kettle.png")
        );
        let gradient = item.image_gradient.unwrap();
        assert!(gradient.contains("linear-gradient"));
    }

    #[test]
    fn plain_infobox_fields() {
        let item =
            parse_item_page(&load_fixture("item_kettle.html"), &link("Kettle"), "Loot", &base())
                .unwrap();
        assert_eq!(item.attr(ATTR_STACK_SIZE), Some("1"));
        assert_eq!(item.attr("Weight"), Some("7.0"));
        assert_eq!(item.attr("Ammo Type"), Some("Light Ammo"));
    }

    #[test]
    fn single_wrapped_price_and_row_style() {
        let item = parse_item_page(
            &load_fixture("item_rubber_duck.html"),
            &link("Rubber Duck"),
            "Trinkets",
            &base(),
        )
        .unwrap();

        assert_eq!(item.category.as_deref(), Some("Trinkets"));
        assert_eq!(item.attr(ATTR_SELL_PRICE), Some("1000"));
        assert_eq!(item.attr(ATTR_SELL_PRICE_ALL_LEVELS), None);
        assert_eq!(item.attr(ATTR_RARITY), Some("Uncommon"));
        assert!(
            item.background_color
                .as_deref()
                .unwrap()
                .starts_with("background")
        );
        // The label on the wiki is lower-case "Stack size"
        assert_eq!(item.stack_size(), 15.0);
        assert!(item.image_gradient.is_none());
    }

    #[test]
    fn page_without_tags_keeps_listing_category() {
        let item =
            parse_item_page(&load_fixture("item_battery.html"), &link("Battery"), "Loot", &base())
                .unwrap();

        assert_eq!(item.category.as_deref(), Some("Loot"));
        assert_eq!(item.attr(ATTR_SELL_PRICE), Some("270"));
        assert!(item.attr(ATTR_RARITY).is_none());
        assert!(item.background_color.is_none());
        // No src on the first image means no image at all
        assert!(item.image_url.is_none());
    }

    #[test]
    fn bare_price_cell_is_trimmed_without_commas() {
        let html = r#"<html><body><div id="mw-content-text">
            <table class="infobox">
              <tr><th>Sell Price</th><td> 1,250 </td></tr>
            </table>
        </div></body></html>"#;

        let item = parse_item_page(html, &link("Rusty Gear"), "Loot", &base()).unwrap();
        assert_eq!(item.attr(ATTR_SELL_PRICE), Some("1250"));
        assert_eq!(item.attr(ATTR_SELL_PRICE_ALL_LEVELS), None);
        assert_eq!(item.sell_price(), 1250.0);
    }

    #[test]
    fn rejects_page_without_content() {
        let err = parse_item_page(
            "<html><body><p>Service unavailable</p></body></html>",
            &link("Kettle"),
            "Loot",
            &base(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no wiki content"));
    }

    #[test]
    fn rarity_class_parsing() {
        assert_eq!(rarity_class("data-tag-legendary"), Some("legendary"));
        assert_eq!(rarity_class("data-tag"), None);
        assert_eq!(rarity_class("data-tag-icon"), None);
        assert_eq!(rarity_class("infobox"), None);
    }
}
