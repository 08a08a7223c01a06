use std::fmt;

use serde::{Serialize, Serializer};

use crate::{Element, ZodiacSign};

/// One of the sixteen Sun/Moon element archetypes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Archetype {
    Supernova,
    Magma,
    Evangelist,
    Geyser,
    Volcano,
    #[default]
    Bedrock,
    Garden,
    Spring,
    Lightning,
    Breeze,
    Hurricane,
    Mist,
    Steam,
    River,
    Rain,
    Ocean,
}

/// Rows are the Sun element, columns the Moon element, both in
/// `Element::ALL` order.
static ARCHETYPE_TABLE: [[Archetype; 4]; 4] = [
    [
        Archetype::Supernova,
        Archetype::Magma,
        Archetype::Evangelist,
        Archetype::Geyser,
    ],
    [
        Archetype::Volcano,
        Archetype::Bedrock,
        Archetype::Garden,
        Archetype::Spring,
    ],
    [
        Archetype::Lightning,
        Archetype::Breeze,
        Archetype::Hurricane,
        Archetype::Mist,
    ],
    [
        Archetype::Steam,
        Archetype::River,
        Archetype::Rain,
        Archetype::Ocean,
    ],
];

/// Archetype for the ordered (Sun element, Moon element) pair.
pub fn resolve_archetype(sun: Element, moon: Element) -> Archetype {
    ARCHETYPE_TABLE
        .get(sun.index())
        .and_then(|row| row.get(moon.index()))
        .copied()
        .unwrap_or_default()
}

impl Archetype {
    pub const ALL: [Archetype; 16] = [
        Archetype::Supernova,
        Archetype::Magma,
        Archetype::Evangelist,
        Archetype::Geyser,
        Archetype::Volcano,
        Archetype::Bedrock,
        Archetype::Garden,
        Archetype::Spring,
        Archetype::Lightning,
        Archetype::Breeze,
        Archetype::Hurricane,
        Archetype::Mist,
        Archetype::Steam,
        Archetype::River,
        Archetype::Rain,
        Archetype::Ocean,
    ];

    pub fn from_elements(sun: Element, moon: Element) -> Self {
        resolve_archetype(sun, moon)
    }

    pub fn from_signs(sun: ZodiacSign, moon: ZodiacSign) -> Self {
        resolve_archetype(sun.element(), moon.element())
    }

    /// The (Sun, Moon) element pair this archetype is drawn from.
    pub fn elements(&self) -> (Element, Element) {
        let index = Self::ALL
            .iter()
            .position(|archetype| archetype == self)
            .unwrap_or(5);
        (Element::ALL[index / 4], Element::ALL[index % 4])
    }

    pub fn name(&self) -> &'static str {
        match self {
            Archetype::Supernova => "The Supernova",
            Archetype::Magma => "The Magma",
            Archetype::Evangelist => "The Evangelist",
            Archetype::Geyser => "The Geyser",
            Archetype::Volcano => "The Volcano",
            Archetype::Bedrock => "The Bedrock",
            Archetype::Garden => "The Garden",
            Archetype::Spring => "The Spring",
            Archetype::Lightning => "The Lightning",
            Archetype::Breeze => "The Breeze",
            Archetype::Hurricane => "The Hurricane",
            Archetype::Mist => "The Mist",
            Archetype::Steam => "The Steam",
            Archetype::River => "The River",
            Archetype::Rain => "The Rain",
            Archetype::Ocean => "The Ocean",
        }
    }

    pub fn japanese_name(&self) -> &'static str {
        match self {
            Archetype::Supernova => "超新星",
            Archetype::Magma => "マグマ",
            Archetype::Evangelist => "伝道師",
            Archetype::Geyser => "間欠泉",
            Archetype::Volcano => "火山",
            Archetype::Bedrock => "岩盤",
            Archetype::Garden => "庭園",
            Archetype::Spring => "泉",
            Archetype::Lightning => "稲妻",
            Archetype::Breeze => "そよ風",
            Archetype::Hurricane => "ハリケーン",
            Archetype::Mist => "霧",
            Archetype::Steam => "蒸気",
            Archetype::River => "川",
            Archetype::Rain => "雨",
            Archetype::Ocean => "海",
        }
    }

    /// Name with the Japanese gloss, e.g. `The Geyser（間欠泉）`.
    pub fn label(&self) -> String {
        format!("{}（{}）", self.name(), self.japanese_name())
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Archetype {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
