//! Price list data model.
//!
//! A [`PriceCategory`] is the whole dataset: category name to the ordered
//! services of that category. Values are built once per upstream fetch and
//! shared read-only afterwards.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Price cell: spreadsheets hand back either a formatted string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(serde_json::Number),
    Text(String),
}

impl Price {
    /// Convert a raw cell; empty and null cells have no price.
    pub fn from_cell(cell: &Value) -> Option<Self> {
        match cell {
            Value::Number(n) => Some(Price::Number(n.clone())),
            other => cell_text(other).map(Price::Text),
        }
    }
}

impl Default for Price {
    fn default() -> Self {
        Price::Text(String::new())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(n) => write!(f, "{n}"),
            Price::Text(s) => f.write_str(s),
        }
    }
}

/// One service line of a price list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub service: String,
    pub price: Price,
    /// Printed before the price, e.g. "от " for ranges or "+" for surcharges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl PriceItem {
    /// Map a spreadsheet row laid out as service, price, prefix, note.
    ///
    /// Missing service/price cells become empty strings; missing or empty
    /// prefix/note cells stay absent.
    pub fn from_row(row: &[Value]) -> Self {
        let text = |i: usize| row.get(i).and_then(cell_text);
        Self {
            service: text(0).unwrap_or_default(),
            price: row.get(1).and_then(Price::from_cell).unwrap_or_default(),
            prefix: text(2),
            additional_info: text(3),
        }
    }
}

fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Ordered mapping of category name to its items.
///
/// Serialized as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceCategory {
    entries: Vec<(String, Vec<PriceItem>)>,
}

impl PriceCategory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category, replacing the items of an existing one in place.
    pub fn insert(&mut self, name: impl Into<String>, items: Vec<PriceItem>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = items,
            None => self.entries.push((name, items)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[PriceItem]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, items)| items.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PriceItem])> {
        self.entries.iter().map(|(n, items)| (n.as_str(), items.as_slice()))
    }

    pub fn first(&self) -> Option<(&str, &[PriceItem])> {
        self.iter().next()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Vec<PriceItem>)> for PriceCategory {
    fn from_iter<I: IntoIterator<Item = (String, Vec<PriceItem>)>>(iter: I) -> Self {
        let mut out = PriceCategory::new();
        for (name, items) in iter {
            out.insert(name, items);
        }
        out
    }
}

impl Serialize for PriceCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, items) in &self.entries {
            map.serialize_entry(name, items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PriceCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CategoryVisitor;

        impl<'de> Visitor<'de> for CategoryVisitor {
            type Value = PriceCategory;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of category name to price items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = PriceCategory::new();
                while let Some((name, items)) = access.next_entry::<String, Vec<PriceItem>>()? {
                    out.insert(name, items);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(CategoryVisitor)
    }
}
