//! Catalog ordering shared by the CLI `list` view.
//!
//! The rules mirror the page script: numeric fields go through
//! [`parse_number`](arcdex_shared::parse_number) (missing → 0), unknown
//! rarities rank below `Common`, and ties keep catalog order.
//!
//! Names compare by their lowercased code points. The page sorts with the
//! browser's `localeCompare` instead, so names with accented or non-Latin
//! letters can order differently there (`Éclair` lands after `Zip` here
//! and next to `Eclair` in the page). ASCII names order the same in both.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use arcdex_shared::{ArcdexError, Catalog, Item};

/// Field to sort by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    SellPrice,
    StackSize,
    StackValue,
    Weight,
    Rarity,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::Name,
        SortField::SellPrice,
        SortField::StackSize,
        SortField::StackValue,
        SortField::Weight,
        SortField::Rarity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::SellPrice => "sellprice",
            SortField::StackSize => "stacksize",
            SortField::StackValue => "stackvalue",
            SortField::Weight => "weight",
            SortField::Rarity => "rarity",
        }
    }

    fn value(&self, item: &Item) -> f64 {
        match self {
            SortField::Name => 0.0,
            SortField::SellPrice => item.sell_price(),
            SortField::StackSize => item.stack_size(),
            SortField::StackValue => item.stack_value(),
            SortField::Weight => item.weight(),
            SortField::Rarity => item.rarity().map(|r| r.rank()).unwrap_or(0) as f64,
        }
    }
}

/// A field plus direction, written `<field>-asc` or `<field>-desc`.
///
/// A bare field name sorts names A-Z and everything else high to low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn new(field: SortField, descending: bool) -> Self {
        Self { field, descending }
    }

    fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let ord = match self.field {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            field => field.value(a).total_cmp(&field.value(b)),
        };
        if self.descending { ord.reverse() } else { ord }
    }
}

impl Default for SortKey {
    /// Sell price, high to low.
    fn default() -> Self {
        Self::new(SortField::SellPrice, true)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.descending { "desc" } else { "asc" };
        write!(f, "{}-{dir}", self.field.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ArcdexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (field, dir) = match s.rsplit_once('-') {
            Some((field, dir)) => (field, Some(dir)),
            None => (s.as_str(), None),
        };

        let field = SortField::ALL
            .into_iter()
            .find(|f| f.as_str() == field)
            .ok_or_else(|| {
                let known: Vec<&str> = SortField::ALL.iter().map(|f| f.as_str()).collect();
                ArcdexError::validation(format!(
                    "unknown sort field '{field}' (expected one of: {})",
                    known.join(", ")
                ))
            })?;

        let descending = match dir {
            Some("asc") => false,
            Some("desc") => true,
            Some(other) => {
                return Err(ArcdexError::validation(format!(
                    "unknown sort direction '{other}' (expected asc or desc)"
                )));
            }
            None => field != SortField::Name,
        };

        Ok(Self { field, descending })
    }
}

/// Items of `catalog`, optionally restricted to one category (matched
/// case-insensitively), ordered by `key` and truncated to `limit`.
pub fn sorted_items<'a>(
    catalog: &'a Catalog,
    category: Option<&str>,
    key: SortKey,
    limit: Option<usize>,
) -> Vec<(&'a str, &'a Item)> {
    let mut items: Vec<(&str, &Item)> = catalog
        .items()
        .filter(|(cat, _)| category.is_none_or(|wanted| cat.eq_ignore_ascii_case(wanted)))
        .collect();

    // Stable, so ties keep catalog order
    items.sort_by(|(_, a), (_, b)| key.compare(a, b));

    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
