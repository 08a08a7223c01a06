//! Natal position to archetype pipeline.
//!
//! A birth date, time and region are normalized to a Julian Day, the seven
//! classical bodies are located through an [`EphemerisProvider`], each
//! longitude is classified into a zodiac sign and element, and the resulting
//! set is folded into a sixteen-way [`Archetype`] and an [`ElementBalance`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod archetype;
pub mod balance;
pub mod ephemeris;
pub mod error;
pub mod geolocation;
pub mod orbits;
pub mod profile;
pub mod settings;
pub mod time;
pub mod zodiac;

pub use archetype::{resolve_archetype, Archetype};
pub use balance::{aggregate, ElementBalance, ElementCounts};
pub use ephemeris::{EphemerisProvider, PositionResolver, ResolveMode};
pub use error::{CalculationError, InputField, ProfileError};
pub use geolocation::{Coordinate, GeoTable, Region};
pub use orbits::KeplerianEphemeris;
pub use profile::{Constitution, Profile, ProfileEngine, Subject, DISCLAIMER};
pub use settings::{EngineConfig, RegionConfig};
pub use time::{
    date_to_julian_day, julian_day_to_date, normalize, BirthDate, BirthInput, BirthTime,
    JulianDay, NormalizedInstant,
};
pub use zodiac::{classify, BodyPosition, Placement};

// ---------------------------
// ## Enumerations
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
}

impl CelestialBody {
    /// The tracked bodies, in profile order.
    pub const ALL: [CelestialBody; 7] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
    ];

    pub fn iter() -> impl Iterator<Item = CelestialBody> {
        Self::ALL.iter().copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
        }
    }

    pub fn japanese_name(&self) -> &'static str {
        match self {
            CelestialBody::Sun => "太陽",
            CelestialBody::Moon => "月",
            CelestialBody::Mercury => "水星",
            CelestialBody::Venus => "金星",
            CelestialBody::Mars => "火星",
            CelestialBody::Jupiter => "木星",
            CelestialBody::Saturn => "土星",
        }
    }
}

impl fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_index(index: usize) -> Option<ZodiacSign> {
        Self::ALL.get(index).copied()
    }

    /// Sign containing `longitude`, taken mod 360.
    pub fn from_longitude(longitude: f64) -> Self {
        Self::ALL[zodiac::sign_index(longitude)]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Fire, Earth, Air, Water repeating from Aries.
    pub fn element(&self) -> Element {
        Element::ALL[self.index() % 4]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }

    pub fn japanese_name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "牡羊座",
            ZodiacSign::Taurus => "牡牛座",
            ZodiacSign::Gemini => "双子座",
            ZodiacSign::Cancer => "蟹座",
            ZodiacSign::Leo => "獅子座",
            ZodiacSign::Virgo => "乙女座",
            ZodiacSign::Libra => "天秤座",
            ZodiacSign::Scorpio => "蠍座",
            ZodiacSign::Sagittarius => "射手座",
            ZodiacSign::Capricorn => "山羊座",
            ZodiacSign::Aquarius => "水瓶座",
            ZodiacSign::Pisces => "魚座",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ZodiacSign {
    type Err = UnknownLabel;

    /// Accepts English names in any case or the Japanese names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|sign| sign.name().eq_ignore_ascii_case(label) || sign.japanese_name() == label)
            .ok_or_else(|| UnknownLabel::new("zodiac sign", label))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire = 0,
    Earth,
    Air,
    Water,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        }
    }

    pub fn japanese_name(&self) -> &'static str {
        match self {
            Element::Fire => "火",
            Element::Earth => "地",
            Element::Air => "風",
            Element::Water => "水",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Element {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|element| {
                element.name().eq_ignore_ascii_case(label) || element.japanese_name() == label
            })
            .ok_or_else(|| UnknownLabel::new("element", label))
    }
}

/// A sign or element label that matches none of the known names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label {label:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub label: String,
}

impl UnknownLabel {
    fn new(kind: &'static str, label: &str) -> Self {
        UnknownLabel {
            kind,
            label: label.to_string(),
        }
    }
}
