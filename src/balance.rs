use serde::{Deserialize, Serialize};

use crate::zodiac::BodyPosition;
use crate::Element;

/// Share given to every element when there is nothing to count.
pub const EQUAL_SHARE: f64 = 25.0;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCounts {
    pub fire: usize,
    pub earth: usize,
    pub air: usize,
    pub water: usize,
}

impl ElementCounts {
    pub fn tally<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        let mut counts = ElementCounts::default();
        for element in elements {
            *counts.get_mut(element) += 1;
        }
        counts
    }

    pub fn get(&self, element: Element) -> usize {
        match element {
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Air => self.air,
            Element::Water => self.water,
        }
    }

    fn get_mut(&mut self, element: Element) -> &mut usize {
        match element {
            Element::Fire => &mut self.fire,
            Element::Earth => &mut self.earth,
            Element::Air => &mut self.air,
            Element::Water => &mut self.water,
        }
    }

    pub fn total(&self) -> usize {
        self.fire + self.earth + self.air + self.water
    }
}

/// Percentage of bodies per element, each rounded to one decimal on its own.
/// The four values are not renormalized and may miss 100.0 by a few tenths.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementBalance {
    pub fire: f64,
    pub earth: f64,
    pub air: f64,
    pub water: f64,
}

impl ElementBalance {
    pub fn equal() -> Self {
        ElementBalance {
            fire: EQUAL_SHARE,
            earth: EQUAL_SHARE,
            air: EQUAL_SHARE,
            water: EQUAL_SHARE,
        }
    }

    pub fn from_counts(counts: &ElementCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::equal();
        }
        let share = |element| round_one_decimal(counts.get(element) as f64 / total as f64 * 100.0);
        ElementBalance {
            fire: share(Element::Fire),
            earth: share(Element::Earth),
            air: share(Element::Air),
            water: share(Element::Water),
        }
    }

    pub fn get(&self, element: Element) -> f64 {
        match element {
            Element::Fire => self.fire,
            Element::Earth => self.earth,
            Element::Air => self.air,
            Element::Water => self.water,
        }
    }

    pub fn total(&self) -> f64 {
        self.fire + self.earth + self.air + self.water
    }

    /// Element with the largest share; ties go to the earlier element in
    /// Fire, Earth, Air, Water order.
    pub fn dominant(&self) -> Element {
        Element::ALL
            .iter()
            .copied()
            .fold(Element::Fire, |best, element| {
                if self.get(element) > self.get(best) {
                    element
                } else {
                    best
                }
            })
    }

    /// Elements no body falls in.
    pub fn missing(&self) -> Vec<Element> {
        Element::ALL
            .iter()
            .copied()
            .filter(|element| self.get(*element) == 0.0)
            .collect()
    }
}

/// Element balance over a resolved body set. An empty set gives 25.0 to each
/// element.
pub fn aggregate(positions: &[BodyPosition]) -> ElementBalance {
    let counts = ElementCounts::tally(positions.iter().map(|position| position.element));
    ElementBalance::from_counts(&counts)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
