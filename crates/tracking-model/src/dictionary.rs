//! Predefined fiducial marker vocabularies.
//!
//! A dictionary is identified by its bit-grid size and the number of markers
//! it contains. Names follow the `DICT_<N>X<N>_<P>` convention, e.g.
//! `DICT_5X5_250`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side length of the marker's inner bit grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerGrid {
    Grid4x4,
    Grid5x5,
    Grid6x6,
    Grid7x7,
}

/// Number of distinct markers in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DictionaryPopulation {
    P50,
    P100,
    P250,
    P1000,
}

/// A predefined marker dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerDictionary {
    pub grid: MarkerGrid,
    pub population: DictionaryPopulation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown marker dictionary: {name} (expected DICT_<4-7>X<4-7>_<50|100|250|1000>)")]
pub struct UnknownDictionary {
    pub name: String,
}

impl MarkerGrid {
    pub const ALL: [MarkerGrid; 4] = [
        MarkerGrid::Grid4x4,
        MarkerGrid::Grid5x5,
        MarkerGrid::Grid6x6,
        MarkerGrid::Grid7x7,
    ];

    /// Bits per side.
    pub fn bits(&self) -> u8 {
        match self {
            MarkerGrid::Grid4x4 => 4,
            MarkerGrid::Grid5x5 => 5,
            MarkerGrid::Grid6x6 => 6,
            MarkerGrid::Grid7x7 => 7,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.bits() == bits)
    }
}

impl fmt::Display for MarkerGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}X{0}", self.bits())
    }
}

impl DictionaryPopulation {
    pub const ALL: [DictionaryPopulation; 4] = [
        DictionaryPopulation::P50,
        DictionaryPopulation::P100,
        DictionaryPopulation::P250,
        DictionaryPopulation::P1000,
    ];

    pub fn count(&self) -> u32 {
        match self {
            DictionaryPopulation::P50 => 50,
            DictionaryPopulation::P100 => 100,
            DictionaryPopulation::P250 => 250,
            DictionaryPopulation::P1000 => 1000,
        }
    }

    fn from_count(count: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.count() == count)
    }
}

impl MarkerDictionary {
    pub const fn new(grid: MarkerGrid, population: DictionaryPopulation) -> Self {
        Self { grid, population }
    }

    /// All sixteen predefined dictionaries, ordered by grid then population.
    pub fn all() -> impl Iterator<Item = MarkerDictionary> {
        MarkerGrid::ALL.into_iter().flat_map(|grid| {
            DictionaryPopulation::ALL
                .into_iter()
                .map(move |population| MarkerDictionary { grid, population })
        })
    }

    /// Dictionaries grouped by grid size, for listing.
    pub fn grouped() -> Vec<(MarkerGrid, Vec<MarkerDictionary>)> {
        MarkerGrid::ALL
            .into_iter()
            .map(|grid| {
                let members = Self::all().filter(|d| d.grid == grid).collect();
                (grid, members)
            })
            .collect()
    }

    /// Whether `id` can be produced by this dictionary.
    pub fn contains_id(&self, id: u32) -> bool {
        id < self.population.count()
    }
}

impl Default for MarkerDictionary {
    fn default() -> Self {
        Self::new(MarkerGrid::Grid4x4, DictionaryPopulation::P50)
    }
}

impl fmt::Display for MarkerDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DICT_{}_{}", self.grid, self.population.count())
    }
}

impl FromStr for MarkerDictionary {
    type Err = UnknownDictionary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownDictionary {
            name: s.to_string(),
        };

        let upper = s.trim().to_ascii_uppercase();
        let rest = upper.strip_prefix("DICT_").ok_or_else(unknown)?;
        let (grid, population) = rest.split_once('_').ok_or_else(unknown)?;
        let (w, h) = grid.split_once('X').ok_or_else(unknown)?;
        if w != h {
            return Err(unknown());
        }

        let grid = w
            .parse::<u8>()
            .ok()
            .and_then(MarkerGrid::from_bits)
            .ok_or_else(unknown)?;
        let population = population
            .parse::<u32>()
            .ok()
            .and_then(DictionaryPopulation::from_count)
            .ok_or_else(unknown)?;

        Ok(Self { grid, population })
    }
}

impl TryFrom<String> for MarkerDictionary {
    type Error = UnknownDictionary;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarkerDictionary> for String {
    fn from(value: MarkerDictionary) -> Self {
        value.to_string()
    }
}
