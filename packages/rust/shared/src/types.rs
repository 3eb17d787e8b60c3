//! Core domain types for the item catalog.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category assigned to flat-array cache items that carry none.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Canonical attribute labels used by the typed accessors.
pub const ATTR_SELL_PRICE: &str = "Sell Price";
pub const ATTR_SELL_PRICE_ALL_LEVELS: &str = "Sell Price All Levels";
pub const ATTR_STACK_SIZE: &str = "Stack Size";
pub const ATTR_WEIGHT: &str = "Weight";
pub const ATTR_RARITY: &str = "Rarity";

/// JSON keys owned by [`Item`]'s fixed fields.
const RESERVED_KEYS: &[&str] = &[
    "name",
    "url",
    "category",
    "image_url",
    "image_path",
    "image_base64",
    "image_gradient",
    "background_color",
];

/// Wiki "data-tag" values and the display category each maps to.
const TAG_CATEGORIES: &[(&str, &str)] = &[
    ("Trinket", "Trinkets"),
    ("Weapon", "Weapons"),
    ("Augment", "Augments"),
    ("Shield", "Shields"),
    ("Healing", "Healing"),
    ("Quick Use", "Quick Use"),
    ("Grenade", "Grenades"),
    ("Trap", "Traps"),
    ("Loot", "Loot"),
];

/// Map a wiki data-tag value (e.g. `Weapon`) to its display category.
pub fn category_for_tag(tag: &str) -> Option<&'static str> {
    TAG_CATEGORIES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, category)| *category)
}

// ---------------------------------------------------------------------------
// ItemLink
// ---------------------------------------------------------------------------

/// A link to an item page found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLink {
    /// Trimmed link text.
    pub name: String,
    /// Absolute item page URL.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Known rarity tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    /// Parse a rarity label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(label))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }

    /// Display color used when the wiki row carries no inline background.
    pub fn color(&self) -> &'static str {
        match self {
            Rarity::Common => "#9d9d9d",
            Rarity::Uncommon => "#1eff00",
            Rarity::Rare => "#0070dd",
            Rarity::Epic => "#a335ee",
            Rarity::Legendary => "#ff8000",
            Rarity::Mythic => "#e6cc80",
        }
    }

    /// Sort rank; unknown rarities rank 0, below `Common`.
    pub fn rank(&self) -> u8 {
        *self as u8 + 1
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title-case a slug the way wiki rarity classes are displayed:
/// `legendary` → `Legendary`, `quick-use` → `Quick-Use`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Parse the leading number out of a free-form wiki value.
///
/// Everything except digits, `.` and `-` is dropped first, so `"1,250"` is
/// `1250.0` and `"0.5 kg"` is `0.5`. Missing or unparseable values are `0.0`.
pub fn parse_number(value: &str) -> f64 {
    let filtered: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    // Longest prefix of the form -?digits(.digits)?
    let bytes = filtered.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        end = frac_end;
    }

    filtered[..end].parse::<f64>().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A single scraped item: fixed fields plus free-form infobox attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Link text from the listing page.
    pub name: String,
    /// Absolute wiki page URL; unique within a catalog.
    pub url: String,
    /// Display category after data-tag reassignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Absolute URL of the main image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Path of the downloaded image, relative to the HTML page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Inline image bytes (standard base64).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    /// Inline style of the image's parent, when it paints a gradient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_gradient: Option<String>,
    /// Rarity row style, or the rarity palette color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Infobox fields keyed by their wiki label.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Store an attribute. Labels that collide with a fixed field are dropped
    /// and `false` is returned.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    /// Case-insensitive attribute lookup.
    pub fn attr(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.attributes.get(key) {
            return Some(v.as_str());
        }
        self.attributes
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn sell_price(&self) -> f64 {
        self.attr(ATTR_SELL_PRICE).map(parse_number).unwrap_or(0.0)
    }

    pub fn stack_size(&self) -> f64 {
        self.attr(ATTR_STACK_SIZE).map(parse_number).unwrap_or(0.0)
    }

    pub fn weight(&self) -> f64 {
        self.attr(ATTR_WEIGHT).map(parse_number).unwrap_or(0.0)
    }

    /// Value of a full stack (sell price × stack size).
    pub fn stack_value(&self) -> f64 {
        self.sell_price() * self.stack_size()
    }

    /// The known rarity tier, if the `Rarity` attribute names one.
    pub fn rarity(&self) -> Option<Rarity> {
        self.attr(ATTR_RARITY).and_then(Rarity::parse)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Items grouped by display category, in insertion order.
///
/// Serializes as a JSON object `{ "<category>": [items...] }`. Deserializes
/// from that object or from a flat array of items grouped by their
/// `category` field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    groups: Vec<(String, Vec<Item>)>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a (possibly empty) group exists, keeping its position.
    pub fn ensure_category(&mut self, category: &str) {
        if !self.groups.iter().any(|(name, _)| name == category) {
            self.groups.push((category.to_string(), Vec::new()));
        }
    }

    /// Append an item to a category, creating the group at the end if needed.
    pub fn push(&mut self, category: &str, item: Item) {
        match self.groups.iter_mut().find(|(name, _)| name == category) {
            Some((_, items)) => items.push(item),
            None => self.groups.push((category.to_string(), vec![item])),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[Item]> {
        self.groups
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, items)| items.as_slice())
    }

    /// Category names in display order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    /// Every item paired with the category it is filed under.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.groups
            .iter()
            .flat_map(|(name, items)| items.iter().map(move |item| (name.as_str(), item)))
    }

    /// Total number of items across all categories.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn category_count(&self) -> usize {
        self.groups.len()
    }

    /// Drop categories that ended up with no items.
    pub fn prune_empty(&mut self) {
        self.groups.retain(|(_, items)| !items.is_empty());
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (name, items) in &self.groups {
            map.serialize_entry(name, items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CatalogVisitor)
    }
}

struct CatalogVisitor;

impl<'de> Visitor<'de> for CatalogVisitor {
    type Value = Catalog;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of category to items, or an array of items")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
        let mut catalog = Catalog::new();
        while let Some((name, items)) = access.next_entry::<String, Vec<Item>>()? {
            catalog.ensure_category(&name);
            for item in items {
                catalog.push(&name, item);
            }
        }
        Ok(catalog)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Catalog, A::Error> {
        let mut catalog = Catalog::new();
        while let Some(item) = access.next_element::<Item>()? {
            let category = item
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            catalog.push(&category, item);
        }
        Ok(catalog)
    }
}
