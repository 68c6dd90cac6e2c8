//! Enumeration families and the symbol resolver.
//!
//! The upstream provider accepts symbolic constants (a category, a sort order,
//! an age bracket) in place of raw strings. Clients send the symbol name, e.g.
//! `?sort=NEWEST`, and the resolver swaps it for the provider's constant before
//! the value is forwarded. Anything it does not recognise passes through as-is;
//! validation is left to the upstream.
use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::core::query::QueryParams;

/// A named table of `symbol -> constant`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationFamily {
    name: String,
    symbols: HashMap<String, Value>,
}

impl EnumerationFamily {
    pub fn new<K, V, I>(name: impl Into<String>, symbols: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            name: name.into(),
            symbols: symbols
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, symbol: &str) -> Option<&Value> {
        self.symbols.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }
}

const CATEGORIES: &[&str] = &[
    "APPLICATION",
    "ANDROID_WEAR",
    "ART_AND_DESIGN",
    "AUTO_AND_VEHICLES",
    "BEAUTY",
    "BOOKS_AND_REFERENCE",
    "BUSINESS",
    "COMICS",
    "COMMUNICATION",
    "DATING",
    "EDUCATION",
    "ENTERTAINMENT",
    "EVENTS",
    "FINANCE",
    "FOOD_AND_DRINK",
    "HEALTH_AND_FITNESS",
    "HOUSE_AND_HOME",
    "LIBRARIES_AND_DEMO",
    "LIFESTYLE",
    "MAPS_AND_NAVIGATION",
    "MEDICAL",
    "MUSIC_AND_AUDIO",
    "NEWS_AND_MAGAZINES",
    "PARENTING",
    "PERSONALIZATION",
    "PHOTOGRAPHY",
    "PRODUCTIVITY",
    "SHOPPING",
    "SOCIAL",
    "SPORTS",
    "TOOLS",
    "TRAVEL_AND_LOCAL",
    "VIDEO_PLAYERS",
    "WATCH_FACE",
    "WEATHER",
    "GAME",
    "GAME_ACTION",
    "GAME_ADVENTURE",
    "GAME_ARCADE",
    "GAME_BOARD",
    "GAME_CARD",
    "GAME_CASINO",
    "GAME_CASUAL",
    "GAME_EDUCATIONAL",
    "GAME_MUSIC",
    "GAME_PUZZLE",
    "GAME_RACING",
    "GAME_ROLE_PLAYING",
    "GAME_SIMULATION",
    "GAME_SPORTS",
    "GAME_STRATEGY",
    "GAME_TRIVIA",
    "GAME_WORD",
    "FAMILY",
];

static STORE_FAMILIES: Lazy<Vec<EnumerationFamily>> = Lazy::new(|| {
    vec![
        EnumerationFamily::new("category", CATEGORIES.iter().map(|c| (*c, *c))),
        EnumerationFamily::new(
            "collection",
            [
                ("TOP_FREE", "TOP_FREE"),
                ("TOP_PAID", "TOP_PAID"),
                ("GROSSING", "GROSSING"),
            ],
        ),
        EnumerationFamily::new("sort", [("NEWEST", 2), ("RATING", 3), ("HELPFULNESS", 1)]),
        EnumerationFamily::new(
            "age",
            [
                ("FIVE_UNDER", "AGE_RANGE1"),
                ("SIX_EIGHT", "AGE_RANGE2"),
                ("NINE_UP", "AGE_RANGE3"),
            ],
        ),
    ]
});

/// The enumeration tables exported by the app-store provider.
pub fn store_families() -> Vec<EnumerationFamily> {
    STORE_FAMILIES.clone()
}

/// Resolves query values against the enumeration families known at startup.
///
/// Built once and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct SymbolResolver {
    families: HashMap<String, EnumerationFamily>,
}

impl SymbolResolver {
    /// Later families with the same name replace earlier ones.
    pub fn new(families: impl IntoIterator<Item = EnumerationFamily>) -> Self {
        Self {
            families: families
                .into_iter()
                .map(|family| (family.name.clone(), family))
                .collect(),
        }
    }

    pub fn is_family(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    pub fn family_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.families.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a single parameter value.
    ///
    /// Only a string that is a symbol of the family called `name` is replaced;
    /// arrays are resolved element-wise. Everything else comes back unchanged.
    pub fn resolve(&self, name: &str, value: Value) -> Value {
        let Some(family) = self.families.get(name) else {
            return value;
        };
        Self::resolve_in(family, value)
    }

    fn resolve_in(family: &EnumerationFamily, value: Value) -> Value {
        match value {
            Value::String(symbol) => match family.get(&symbol) {
                Some(constant) => constant.clone(),
                None => Value::String(symbol),
            },
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| Self::resolve_in(family, item))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Turn a query into an option map, resolving every parameter.
    ///
    /// A key with one value maps to a string, a repeated key to an array of strings.
    pub fn resolve_all(&self, query: &QueryParams) -> Map<String, Value> {
        let mut resolved = Map::new();
        for key in query.keys() {
            let mut values: Vec<Value> = query
                .get_all(key)
                .map(|v| Value::String(v.to_string()))
                .collect();
            let raw = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            resolved.insert(key.to_string(), self.resolve(key, raw));
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver() -> SymbolResolver {
        SymbolResolver::new(store_families())
    }

    #[test]
    fn test_resolves_known_symbols() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("sort", json!("NEWEST")), json!(2));
        assert_eq!(resolver.resolve("age", json!("SIX_EIGHT")), json!("AGE_RANGE2"));
        assert_eq!(resolver.resolve("category", json!("GAME_PUZZLE")), json!("GAME_PUZZLE"));
        assert_eq!(resolver.resolve("collection", json!("TOP_PAID")), json!("TOP_PAID"));
    }

    #[test]
    fn test_unknown_values_pass_through() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("sort", json!("BY_MOOD")), json!("BY_MOOD"));
        assert_eq!(resolver.resolve("sort", json!("")), json!(""));
        // Symbols are case-sensitive.
        assert_eq!(resolver.resolve("sort", json!("newest")), json!("newest"));
    }

    #[test]
    fn test_unknown_family_is_a_no_op() {
        let resolver = resolver();
        for value in [json!("NEWEST"), json!("GAME"), json!(7), json!(["TOP_FREE"])] {
            assert_eq!(resolver.resolve("lang", value.clone()), value);
        }
    }

    #[test]
    fn test_resolution_is_idempotent_for_every_family() {
        let resolver = resolver();
        for family in store_families() {
            for (symbol, _) in family.symbols() {
                let once = resolver.resolve(family.name(), json!(symbol));
                let twice = resolver.resolve(family.name(), once.clone());
                assert_eq!(once, twice, "family {} symbol {symbol}", family.name());
            }
        }
    }

    #[test]
    fn test_resolve_all_groups_repeated_keys() {
        let resolver = resolver();
        let query = QueryParams::parse("category=GAME&sort=RATING&lang=en&category=FAMILY");
        let resolved = resolver.resolve_all(&query);

        assert_eq!(resolved.get("category"), Some(&json!(["GAME", "FAMILY"])));
        assert_eq!(resolved.get("sort"), Some(&json!(3)));
        assert_eq!(resolved.get("lang"), Some(&json!("en")));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_later_family_overrides_earlier() {
        let resolver = SymbolResolver::new([
            EnumerationFamily::new("sort", [("NEWEST", 2)]),
            EnumerationFamily::new("sort", [("NEWEST", "newest")]),
        ]);
        assert_eq!(resolver.resolve("sort", json!("NEWEST")), json!("newest"));
        assert_eq!(resolver.family_names(), vec!["sort"]);
    }
}
