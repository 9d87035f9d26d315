//! Static domain-knowledge tables behind the pairing factors.
//!
//! Tables are built once, either from the built-in seeds below or from a TOML
//! data file, and are read-only afterwards. Every lookup key and token is stored
//! in canonical form (see [`normalize_token`]).

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vocabulary::normalize_token;
use crate::errors::{ApplicationError, DomainError};

/// Directed, hand-authored flavor harmony. `chocolate -> almond` does not imply
/// `almond -> chocolate`.
const COMPATIBILITY_SEEDS: &[(&str, &[&str])] = &[
    (
        "chocolate",
        &["almond", "hazelnut", "caramel", "vanilla", "cherry", "orange", "raspberry", "nutty"],
    ),
    ("nutty", &["almond", "hazelnut", "caramel", "chocolate", "maple", "honey", "toffee"]),
    ("caramel", &["vanilla", "butter", "almond", "apple", "cinnamon", "toffee"]),
    ("fruity", &["berry", "citrus", "lemon", "raspberry", "blueberry", "apple"]),
    ("floral", &["lemon", "honey", "berry", "lavender", "vanilla"]),
    ("citrus", &["lemon", "orange", "almond", "vanilla", "ginger"]),
    ("berry", &["chocolate", "vanilla", "lemon", "almond", "cream"]),
    ("spicy", &["cinnamon", "cardamom", "ginger", "chocolate", "orange"]),
    ("earthy", &["chocolate", "walnut", "maple", "molasses", "cinnamon"]),
    ("smoky", &["chocolate", "caramel", "maple", "molasses"]),
    ("honey", &["almond", "lemon", "vanilla", "walnut"]),
    ("vanilla", &["caramel", "berry", "cinnamon", "butter"]),
    ("cinnamon", &["apple", "caramel", "vanilla", "raisin"]),
];

const ORIGIN_AFFINITY_SEEDS: &[(&str, &[&str])] = &[
    ("brazil", &["chocolate", "nutty", "caramel", "almond", "hazelnut"]),
    ("colombia", &["caramel", "chocolate", "citrus", "apple"]),
    ("ethiopia", &["fruity", "floral", "berry", "lemon", "blueberry"]),
    ("kenya", &["berry", "citrus", "fruity", "blackcurrant"]),
    ("guatemala", &["chocolate", "spicy", "cinnamon", "toffee"]),
    ("sumatra", &["earthy", "spicy", "chocolate", "molasses"]),
];

const SEASONAL_SEEDS: &[(&str, f64)] =
    &[("fall", 1.05), ("autumn", 1.05), ("winter", 1.0), ("spring", 1.0), ("summer", 0.95)];

/// Keyed by popularity tenths (3 == 0.3).
const POPULARITY_SEEDS: &[(u8, f64)] =
    &[(3, 0.99), (4, 0.995), (5, 1.0), (6, 1.01), (7, 1.02), (8, 1.035), (9, 1.05)];

const DARK_ROAST_TEXTURES: &[&str] =
    &["dense", "rich", "chewy", "creamy", "substantial", "buttery", "fudgy", "laminated"];

const LIGHT_ROAST_TEXTURES: &[&str] = &["flaky", "airy", "delicate", "light", "crispy", "fruity"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompatibilityTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl CompatibilityTable {
    /// Whether `candidate` is listed under `anchor`. Direction matters.
    pub fn is_compatible(&self, anchor: &str, candidate: &str) -> bool {
        self.entries.get(anchor).is_some_and(|listed| listed.contains(candidate))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries.iter().map(|(key, listed)| (key.as_str(), listed))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OriginAffinityTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl OriginAffinityTable {
    /// Expected flavor tokens for an origin; `origin` is normalized before lookup.
    pub fn expected_flavors(&self, origin: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&normalize_token(origin))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries.iter().map(|(key, expected)| (key.as_str(), expected))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeasonalFactorTable {
    factors: BTreeMap<String, f64>,
}

impl SeasonalFactorTable {
    pub fn multiplier(&self, season: &str) -> Option<f64> {
        self.factors.get(&normalize_token(season)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.factors.iter().map(|(season, factor)| (season.as_str(), *factor))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopularityFactorTable {
    factors: BTreeMap<u8, f64>,
}

impl PopularityFactorTable {
    /// Multiplier for a popularity level expressed in tenths (`7` for 0.7).
    pub fn multiplier_for_tenths(&self, tenths: i64) -> Option<f64> {
        u8::try_from(tenths).ok().and_then(|key| self.factors.get(&key).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.factors.iter().map(|(tenths, factor)| (*tenths, *factor))
    }
}

/// Texture vocabularies that harmonize with dark and light roasts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoastTextureTable {
    dark: BTreeSet<String>,
    light: BTreeSet<String>,
}

impl RoastTextureTable {
    pub fn dark_textures(&self) -> &BTreeSet<String> {
        &self.dark
    }

    pub fn light_textures(&self) -> &BTreeSet<String> {
        &self.light
    }
}

/// Every lookup table the pairing factors consult.
#[derive(Clone, Debug, PartialEq)]
pub struct PairingTables {
    pub compatibility: CompatibilityTable,
    pub origin_affinity: OriginAffinityTable,
    pub seasonal: SeasonalFactorTable,
    pub popularity: PopularityFactorTable,
    pub roast_texture: RoastTextureTable,
}

impl Default for PairingTables {
    fn default() -> Self {
        Self {
            compatibility: CompatibilityTable { entries: token_map(COMPATIBILITY_SEEDS) },
            origin_affinity: OriginAffinityTable { entries: token_map(ORIGIN_AFFINITY_SEEDS) },
            seasonal: SeasonalFactorTable {
                factors: SEASONAL_SEEDS
                    .iter()
                    .map(|(season, factor)| ((*season).to_owned(), *factor))
                    .collect(),
            },
            popularity: PopularityFactorTable {
                factors: POPULARITY_SEEDS.iter().copied().collect(),
            },
            roast_texture: RoastTextureTable {
                dark: DARK_ROAST_TEXTURES.iter().map(|token| (*token).to_owned()).collect(),
                light: LIGHT_ROAST_TEXTURES.iter().map(|token| (*token).to_owned()).collect(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("could not read pairing tables `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse pairing tables `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("could not parse pairing tables: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("could not serialize pairing tables: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

impl From<TableError> for ApplicationError {
    fn from(value: TableError) -> Self {
        match value {
            TableError::Validation(domain) => ApplicationError::Domain(domain),
            other => ApplicationError::Configuration(other.to_string()),
        }
    }
}

impl PairingTables {
    /// Built-in tables, or the data file at `path` when one is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, TableError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, TableError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| TableError::ReadFile { path: path.to_path_buf(), source })?;

        Self::from_toml_str(&raw).map_err(|error| match error {
            TableError::Parse(source) => TableError::ParseFile { path: path.to_path_buf(), source },
            other => other,
        })
    }

    /// Parse a table document. Sections that are absent keep the built-in data;
    /// a present section replaces it wholesale.
    pub fn from_toml_str(raw: &str) -> Result<Self, TableError> {
        let document = toml::from_str::<TablesDocument>(raw).map_err(TableError::Parse)?;
        let mut tables = Self::default();

        if let Some(compatibility) = document.compatibility {
            tables.compatibility =
                CompatibilityTable { entries: validate_token_map("compatibility", compatibility)? };
        }
        if let Some(origin_affinity) = document.origin_affinity {
            tables.origin_affinity = OriginAffinityTable {
                entries: validate_token_map("origin_affinity", origin_affinity)?,
            };
        }
        if let Some(seasonal) = document.seasonal {
            tables.seasonal = SeasonalFactorTable { factors: validate_seasonal(seasonal)? };
        }
        if let Some(popularity) = document.popularity {
            tables.popularity = PopularityFactorTable { factors: validate_popularity(popularity)? };
        }
        if let Some(roast_texture) = document.roast_texture {
            if let Some(dark) = roast_texture.dark {
                tables.roast_texture.dark = validate_token_set("roast_texture", dark)?;
            }
            if let Some(light) = roast_texture.light {
                tables.roast_texture.light = validate_token_set("roast_texture", light)?;
            }
        }

        Ok(tables)
    }

    /// Render the effective tables in the data-file format.
    pub fn to_toml_string(&self) -> Result<String, TableError> {
        let document = TablesDocument {
            compatibility: Some(set_map_to_lists(&self.compatibility.entries)),
            origin_affinity: Some(set_map_to_lists(&self.origin_affinity.entries)),
            seasonal: Some(self.seasonal.factors.clone()),
            popularity: Some(
                self.popularity
                    .factors
                    .iter()
                    .map(|(tenths, factor)| (format!("{:.1}", f64::from(*tenths) / 10.0), *factor))
                    .collect(),
            ),
            roast_texture: Some(RoastTextureDocument {
                dark: Some(self.roast_texture.dark.iter().cloned().collect()),
                light: Some(self.roast_texture.light.iter().cloned().collect()),
            }),
        };

        Ok(toml::to_string_pretty(&document)?)
    }
}

fn token_map(seeds: &[(&str, &[&str])]) -> BTreeMap<String, BTreeSet<String>> {
    seeds
        .iter()
        .map(|(key, tokens)| {
            ((*key).to_owned(), tokens.iter().map(|token| (*token).to_owned()).collect())
        })
        .collect()
}

fn set_map_to_lists(map: &BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, Vec<String>> {
    map.iter().map(|(key, tokens)| (key.clone(), tokens.iter().cloned().collect())).collect()
}

fn validate_token_map(
    table: &'static str,
    raw: BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, BTreeSet<String>>, DomainError> {
    let mut entries = BTreeMap::new();
    for (key, tokens) in raw {
        let key = normalize_token(&key);
        if key.is_empty() {
            return Err(DomainError::InvalidTable {
                table,
                message: "table keys must not be blank".to_owned(),
            });
        }
        let tokens = validate_token_set(table, tokens)?;
        entries.entry(key).or_insert_with(BTreeSet::new).extend(tokens);
    }
    Ok(entries)
}

fn validate_token_set(
    table: &'static str,
    raw: Vec<String>,
) -> Result<BTreeSet<String>, DomainError> {
    if raw.iter().any(|token| token.trim().is_empty()) {
        return Err(DomainError::InvalidTable {
            table,
            message: "token lists must not contain blank entries".to_owned(),
        });
    }
    Ok(raw.iter().map(|token| normalize_token(token)).collect())
}

fn validate_seasonal(raw: BTreeMap<String, f64>) -> Result<BTreeMap<String, f64>, DomainError> {
    let mut factors = BTreeMap::new();
    for (season, factor) in raw {
        let season = normalize_token(&season);
        if season.is_empty() {
            return Err(DomainError::InvalidTable {
                table: "seasonal",
                message: "season names must not be blank".to_owned(),
            });
        }
        ensure_positive_multiplier("seasonal", &season, factor)?;
        factors.insert(season, factor);
    }
    Ok(factors)
}

fn validate_popularity(raw: BTreeMap<String, f64>) -> Result<BTreeMap<u8, f64>, DomainError> {
    let mut factors = BTreeMap::new();
    for (level, factor) in raw {
        let parsed = level.trim().parse::<f64>().ok().filter(|value| (0.0..=1.0).contains(value));
        let Some(parsed) = parsed else {
            return Err(DomainError::InvalidTable {
                table: "popularity",
                message: format!("popularity level `{level}` must be a number in 0.0..=1.0"),
            });
        };

        let tenths = (parsed * 10.0).round();
        if (parsed * 10.0 - tenths).abs() > 1e-9 {
            return Err(DomainError::InvalidTable {
                table: "popularity",
                message: format!("popularity level `{level}` must have a single decimal place"),
            });
        }

        ensure_positive_multiplier("popularity", &level, factor)?;
        // tenths is within 0..=10 after the range check above
        factors.insert(tenths as u8, factor);
    }
    Ok(factors)
}

fn ensure_positive_multiplier(
    table: &'static str,
    key: &str,
    factor: f64,
) -> Result<(), DomainError> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(DomainError::InvalidTable {
            table,
            message: format!("multiplier for `{key}` must be a finite number greater than zero"),
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TablesDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    compatibility: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin_affinity: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seasonal: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    popularity: Option<BTreeMap<String, f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roast_texture: Option<RoastTextureDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RoastTextureDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    dark: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    light: Option<Vec<String>>,
}
