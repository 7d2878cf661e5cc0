//! Intensity measure types and the ordered IMT -> levels mapping.

use crate::common::constants::DEFAULT_SA_DAMPING;
use crate::domain::{ConfigResult, HazardError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Range;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Imt {
    Pga,
    Pgv,
    Pgd,
    Sa { period: f64, damping: f64 },
    Mmi,
}

impl Imt {
    pub fn sa(period: f64) -> Self {
        Self::Sa {
            period,
            damping: DEFAULT_SA_DAMPING,
        }
    }

    pub fn period(&self) -> Option<f64> {
        match self {
            Self::Sa { period, .. } => Some(*period),
            _ => None,
        }
    }

    /// Short name without the period: `PGA`, `SA`, ...
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pga => "PGA",
            Self::Pgv => "PGV",
            Self::Pgd => "PGD",
            Self::Sa { .. } => "SA",
            Self::Mmi => "MMI",
        }
    }
}

impl Display for Imt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sa { period, .. } => write!(f, "SA({period:?})"),
            other => f.write_str(other.kind()),
        }
    }
}

impl FromStr for Imt {
    type Err = HazardError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        match text {
            "PGA" => return Ok(Self::Pga),
            "PGV" => return Ok(Self::Pgv),
            "PGD" => return Ok(Self::Pgd),
            "MMI" => return Ok(Self::Mmi),
            _ => {}
        }
        let period = text
            .strip_prefix("SA(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|period| period.trim().parse::<f64>().ok())
            .ok_or_else(|| {
                HazardError::configuration("CONFIG.IMT", format!("unknown IMT '{text}'"))
            })?;
        if !(period > 0.0) {
            return Err(HazardError::configuration(
                "CONFIG.IMT",
                format!("spectral acceleration period must be positive, got {period}"),
            ));
        }
        Ok(Self::sa(period))
    }
}

/// Intensity measure types with their strictly increasing levels, in
/// insertion order. Curves are laid out on one flat level axis with the
/// IMTs one after the other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Imtls {
    entries: Vec<(Imt, Vec<f64>)>,
}

impl Imtls {
    pub fn new(entries: Vec<(Imt, Vec<f64>)>) -> ConfigResult<Self> {
        if entries.is_empty() {
            return Err(HazardError::configuration(
                "CONFIG.IMTLS",
                "at least one intensity measure type is required",
            ));
        }
        for (index, (imt, levels)) in entries.iter().enumerate() {
            if entries[..index].iter().any(|(other, _)| other == imt) {
                return Err(HazardError::configuration(
                    "CONFIG.IMTLS",
                    format!("duplicate intensity measure type {imt}"),
                ));
            }
            if levels.is_empty() {
                return Err(HazardError::configuration(
                    "CONFIG.IMTLS",
                    format!("no intensity measure levels given for {imt}"),
                ));
            }
            if levels.iter().any(|level| !(*level > 0.0)) {
                return Err(HazardError::configuration(
                    "CONFIG.IMTLS",
                    format!("intensity measure levels for {imt} must be positive"),
                ));
            }
            if levels.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(HazardError::configuration(
                    "CONFIG.IMTLS",
                    format!("intensity measure levels for {imt} must be strictly increasing"),
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn parse<I, S>(entries: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, levels)| Ok((name.as_ref().parse::<Imt>()?, levels)))
            .collect::<ConfigResult<Vec<_>>>()?;
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Imt, &[f64])> {
        self.entries
            .iter()
            .map(|(imt, levels)| (imt, levels.as_slice()))
    }

    pub fn imts(&self) -> impl Iterator<Item = &Imt> {
        self.entries.iter().map(|(imt, _)| imt)
    }

    pub fn levels(&self, imt: &Imt) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == imt)
            .map(|(_, levels)| levels.as_slice())
    }

    /// Total number of levels over all IMTs.
    pub fn num_levels(&self) -> usize {
        self.entries.iter().map(|(_, levels)| levels.len()).sum()
    }

    /// Range of the flat level axis occupied by the `index`-th IMT.
    pub fn slice(&self, index: usize) -> Range<usize> {
        let start: usize = self.entries[..index]
            .iter()
            .map(|(_, levels)| levels.len())
            .sum();
        start..start + self.entries[index].1.len()
    }

    pub fn slices(&self) -> impl Iterator<Item = (&Imt, Range<usize>)> {
        let mut start = 0;
        self.entries.iter().map(move |(imt, levels)| {
            let range = start..start + levels.len();
            start = range.end;
            (imt, range)
        })
    }
}

impl<'de> Deserialize<'de> for Imtls {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ImtlsVisitor;

        impl<'de> Visitor<'de> for ImtlsVisitor {
            type Value = Imtls;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map from IMT names to increasing intensity levels")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries: Vec<(String, Vec<f64>)> = Vec::new();
                while let Some((name, levels)) = map.next_entry()? {
                    entries.push((name, levels));
                }
                Imtls::parse(entries).map_err(|error| serde::de::Error::custom(error.message()))
            }
        }

        deserializer.deserialize_map(ImtlsVisitor)
    }
}

impl Serialize for Imtls {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (imt, levels) in &self.entries {
            map.serialize_entry(&imt.to_string(), levels)?;
        }
        map.end()
    }
}
