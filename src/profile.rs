use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::archetype::Archetype;
use crate::balance::{aggregate, ElementBalance};
use crate::ephemeris::{EphemerisProvider, PositionResolver};
use crate::error::{InputField, ProfileError, Result};
use crate::geolocation::{Coordinate, GeoTable};
use crate::orbits::KeplerianEphemeris;
use crate::settings::EngineConfig;
use crate::time::{normalize, BirthInput, NormalizedInstant};
use crate::zodiac::BodyPosition;
use crate::{CelestialBody, Element};

/// Attached to every rendered profile.
pub const DISCLAIMER: &str =
    "本結果はエンターテインメント目的です。医療診断や治療の代替ではありません。";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subject {
    pub name: String,
    pub birth_local: NaiveDateTime,
    pub region: String,
    pub coordinate: Coordinate,
}

/// Classification folded from a resolved body set.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Constitution {
    pub sun_element: Element,
    pub moon_element: Element,
    pub archetype: Archetype,
    pub element_balance: ElementBalance,
}

impl Constitution {
    /// Folds placements that were resolved elsewhere. Sun and Moon must be
    /// present, each body at most once; every body counts toward the balance.
    pub fn from_bodies(bodies: &[BodyPosition]) -> Result<Self> {
        let mut seen = HashSet::new();
        for position in bodies {
            if !seen.insert(position.body) {
                return Err(ProfileError::invalid(
                    InputField::Bodies,
                    format!("{} appears more than once", position.body),
                ));
            }
        }
        let element_of = |wanted: CelestialBody| {
            bodies
                .iter()
                .find(|position| position.body == wanted)
                .map(|position| position.element)
                .ok_or_else(|| {
                    ProfileError::invalid(InputField::Bodies, format!("{} is missing", wanted))
                })
        };
        let sun_element = element_of(CelestialBody::Sun)?;
        let moon_element = element_of(CelestialBody::Moon)?;

        Ok(Constitution {
            sun_element,
            moon_element,
            archetype: Archetype::from_elements(sun_element, moon_element),
            element_balance: aggregate(bodies),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub subject: Subject,
    pub instant: NormalizedInstant,
    pub bodies: Vec<BodyPosition>,
    pub archetype: Archetype,
    pub element_balance: ElementBalance,
}

impl Profile {
    pub fn body(&self, body: CelestialBody) -> Option<&BodyPosition> {
        self.bodies.iter().find(|position| position.body == body)
    }
}

/// Runs one birth record through the whole pipeline.
#[derive(Clone)]
pub struct ProfileEngine {
    geo: Arc<GeoTable>,
    resolver: PositionResolver,
    utc_offset_hours: f64,
}

impl ProfileEngine {
    pub fn new(geo: Arc<GeoTable>, resolver: PositionResolver, utc_offset_hours: f64) -> Self {
        ProfileEngine {
            geo,
            resolver,
            utc_offset_hours,
        }
    }

    pub fn from_config(
        config: &EngineConfig,
        provider: Arc<dyn EphemerisProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let geo = GeoTable::with_regions(&config.regions)?;
        let resolver =
            PositionResolver::new(provider, config.resolve_mode(), config.resolve_timeout());
        Ok(Self::new(Arc::new(geo), resolver, config.utc_offset_hours))
    }

    /// Built-in regions, the analytic ephemeris and default settings.
    pub fn with_defaults() -> Self {
        let config = EngineConfig::default();
        let resolver = PositionResolver::new(
            Arc::new(KeplerianEphemeris::new()),
            config.resolve_mode(),
            config.resolve_timeout(),
        );
        Self::new(
            Arc::new(GeoTable::builtin().clone()),
            resolver,
            config.utc_offset_hours,
        )
    }

    pub fn geo(&self) -> &GeoTable {
        &self.geo
    }

    pub fn utc_offset_hours(&self) -> f64 {
        self.utc_offset_hours
    }

    /// Either a complete profile or the first error; nothing partial.
    pub fn compute(&self, input: &BirthInput) -> Result<Profile> {
        match self.compute_profile(input) {
            Ok(profile) => {
                info!(
                    name = input.name(),
                    archetype = profile.archetype.name(),
                    provider = self.resolver.provider_name(),
                    "profile complete"
                );
                Ok(profile)
            }
            Err(err) => {
                if err.is_recoverable() {
                    warn!(name = input.name(), error = %err, "profile rejected");
                } else {
                    error!(name = input.name(), error = %err, "profile failed");
                }
                Err(err)
            }
        }
    }

    fn compute_profile(&self, input: &BirthInput) -> Result<Profile> {
        let region = self.geo.get(input.region()).ok_or_else(|| {
            ProfileError::invalid(
                InputField::Region,
                format!("{:?} is not a known region", input.region()),
            )
        })?;
        let birth_local = input.local_date_time()?;

        let instant = normalize(input.date(), input.time(), self.utc_offset_hours)?;
        let bodies = self.resolver.resolve_all(&instant, &CelestialBody::ALL)?;
        let constitution = Constitution::from_bodies(&bodies)?;

        Ok(Profile {
            subject: Subject {
                name: input.name().to_string(),
                birth_local,
                region: region.name.clone(),
                coordinate: region.coordinate,
            },
            instant,
            bodies,
            archetype: constitution.archetype,
            element_balance: constitution.element_balance,
        })
    }
}
