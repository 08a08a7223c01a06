use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use natal_archetype::{
    Archetype, BirthInput, CalculationError, CelestialBody, Element, EngineConfig,
    EphemerisProvider, GeoTable, InputField, JulianDay, KeplerianEphemeris, PositionResolver,
    ProfileEngine, ProfileError, RegionConfig, ResolveMode, ZodiacSign,
};

/// Returns a fixed longitude per body regardless of the instant.
struct Table(HashMap<CelestialBody, Result<f64, CalculationError>>);

impl Table {
    fn new(entries: &[(CelestialBody, f64)]) -> Self {
        Table(entries.iter().map(|&(body, lon)| (body, Ok(lon))).collect())
    }

    fn failing(mut self, body: CelestialBody) -> Self {
        self.0
            .insert(body, Err(CalculationError::new(-1, "ephemeris file missing")));
        self
    }
}

impl EphemerisProvider for Table {
    fn ecliptic_longitude(
        &self,
        _julian_day: JulianDay,
        body: CelestialBody,
    ) -> Result<f64, CalculationError> {
        self.0
            .get(&body)
            .cloned()
            .unwrap_or_else(|| Err(CalculationError::new(-1, "no entry")))
    }
}

fn scenario() -> Table {
    // Fire, Water, Fire, Earth, Fire, Air, Water
    Table::new(&[
        (CelestialBody::Sun, 15.0),
        (CelestialBody::Moon, 100.0),
        (CelestialBody::Mercury, 130.0),
        (CelestialBody::Venus, 45.0),
        (CelestialBody::Mars, 250.0),
        (CelestialBody::Jupiter, 190.0),
        (CelestialBody::Saturn, 355.0),
    ])
}

fn engine(provider: Table, mode: ResolveMode) -> ProfileEngine {
    ProfileEngine::new(
        Arc::new(GeoTable::builtin().clone()),
        PositionResolver::new(Arc::new(provider), mode, Duration::from_secs(2)),
        9.0,
    )
}

fn hanako() -> BirthInput {
    BirthInput::parse("Hanako", "1990-04-19", "09:00", "東京都").unwrap()
}

#[test]
fn test_seven_body_profile() {
    for mode in [ResolveMode::Sequential, ResolveMode::Parallel] {
        let profile = engine(scenario(), mode).compute(&hanako()).unwrap();

        assert_eq!(profile.bodies.len(), 7);
        assert_eq!(profile.archetype, Archetype::Geyser);
        assert_eq!(profile.archetype.label(), "The Geyser（間欠泉）");

        let balance = profile.element_balance;
        assert_relative_eq!(balance.fire, 42.9);
        assert_relative_eq!(balance.earth, 14.3);
        assert_relative_eq!(balance.air, 14.3);
        assert_relative_eq!(balance.water, 28.6);

        let sun = profile.body(CelestialBody::Sun).unwrap();
        assert_eq!(sun.sign, ZodiacSign::Aries);
        assert_relative_eq!(sun.degree_in_sign, 15.0);
    }
}

#[test]
fn test_any_failed_body_fails_the_profile() {
    let err = engine(scenario().failing(CelestialBody::Venus), ResolveMode::Parallel)
        .compute(&hanako())
        .unwrap_err();
    match err {
        ProfileError::PositionResolution { body, .. } => assert_eq!(body, CelestialBody::Venus),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_invalid_date_is_rejected() {
    let err = BirthInput::parse("Hanako", "2024-02-30", "09:00", "東京都").unwrap_err();
    assert!(matches!(
        err,
        ProfileError::InvalidInput {
            field: InputField::Date,
            ..
        }
    ));
    assert!(BirthInput::parse("Hanako", "2024-02-29", "09:00", "東京都").is_ok());
}

#[test]
fn test_profile_serializes_for_renderers() {
    let profile = engine(scenario(), ResolveMode::Sequential)
        .compute(&hanako())
        .unwrap();
    let value = serde_json::to_value(&profile).unwrap();

    assert_eq!(value["archetype"], "The Geyser");
    assert_eq!(value["subject"]["region"], "東京都");
    assert_eq!(value["bodies"].as_array().unwrap().len(), 7);
    assert_eq!(value["bodies"][0]["body"], "Sun");
    assert_eq!(value["bodies"][0]["element"], "Fire");
}

#[test]
fn test_analytic_ephemeris_end_to_end() {
    let engine = ProfileEngine::with_defaults();
    let input = BirthInput::parse("Taro", "1985-12-25", "12:30", "Tokyo").unwrap();
    let profile = engine.compute(&input).unwrap();

    assert_relative_eq!(profile.instant.julian_day, 2_446_424.645_833, epsilon = 1e-5);
    assert_eq!(profile.body(CelestialBody::Sun).unwrap().sign, ZodiacSign::Capricorn);
    assert_eq!(profile.body(CelestialBody::Moon).unwrap().sign, ZodiacSign::Gemini);
    assert_eq!(profile.archetype, Archetype::Garden);

    let balance = profile.element_balance;
    assert_relative_eq!(balance.fire, 42.9);
    assert_relative_eq!(balance.earth, 14.3);
    assert_relative_eq!(balance.air, 28.6);
    assert_relative_eq!(balance.water, 14.3);
    assert_eq!(balance.dominant(), Element::Fire);
    assert!(balance.missing().is_empty());
}

#[test]
fn test_configured_region_and_offset() {
    let config = EngineConfig {
        utc_offset_hours: 8.0,
        parallel: false,
        regions: vec![RegionConfig {
            name: "Taipei".to_string(),
            aliases: vec!["臺北".to_string()],
            latitude: 25.0330,
            longitude: 121.5654,
        }],
        ..EngineConfig::default()
    };
    let engine = ProfileEngine::from_config(&config, Arc::new(KeplerianEphemeris::new())).unwrap();
    let input = BirthInput::parse("Mei", "2000-01-01", "20:00", "臺北").unwrap();
    let profile = engine.compute(&input).unwrap();

    assert_eq!(profile.subject.region, "Taipei");
    // 20:00 at UTC+8 is J2000.0
    assert_relative_eq!(profile.instant.julian_day, 2_451_545.0, epsilon = 1e-9);
}
