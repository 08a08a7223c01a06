use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProfileError, Result};
use crate::settings::RegionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ProfileError::Configuration(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ProfileError::Configuration(format!(
                "longitude {} is outside [-180, 180]",
                longitude
            )));
        }
        Ok(Coordinate {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub name: String,
    pub aliases: Vec<String>,
    pub coordinate: Coordinate,
}

/// Prefectural capitals: (name, romanized alias, latitude, longitude).
const PREFECTURES: [(&str, &str, f64, f64); 47] = [
    ("北海道", "Hokkaido", 43.0642, 141.3469),
    ("青森県", "Aomori", 40.8244, 140.7400),
    ("岩手県", "Iwate", 39.7036, 141.1527),
    ("宮城県", "Miyagi", 38.2682, 140.8721),
    ("秋田県", "Akita", 39.7186, 140.1024),
    ("山形県", "Yamagata", 38.2404, 140.3633),
    ("福島県", "Fukushima", 37.7503, 140.4676),
    ("茨城県", "Ibaraki", 36.3418, 140.4468),
    ("栃木県", "Tochigi", 36.5657, 139.8836),
    ("群馬県", "Gunma", 36.3911, 139.0608),
    ("埼玉県", "Saitama", 35.8617, 139.6455),
    ("千葉県", "Chiba", 35.6074, 140.1065),
    ("東京都", "Tokyo", 35.6762, 139.6503),
    ("神奈川県", "Kanagawa", 35.4478, 139.6425),
    ("新潟県", "Niigata", 37.9026, 139.0232),
    ("富山県", "Toyama", 36.6959, 137.2113),
    ("石川県", "Ishikawa", 36.5946, 136.6256),
    ("福井県", "Fukui", 36.0652, 136.2217),
    ("山梨県", "Yamanashi", 35.6642, 138.5683),
    ("長野県", "Nagano", 36.6513, 138.1810),
    ("岐阜県", "Gifu", 35.3912, 136.7223),
    ("静岡県", "Shizuoka", 34.9756, 138.3828),
    ("愛知県", "Aichi", 35.1802, 136.9066),
    ("三重県", "Mie", 34.7303, 136.5086),
    ("滋賀県", "Shiga", 35.0045, 135.8686),
    ("京都府", "Kyoto", 35.0211, 135.7556),
    ("大阪府", "Osaka", 34.6937, 135.5023),
    ("兵庫県", "Hyogo", 34.6913, 135.1830),
    ("奈良県", "Nara", 34.6851, 135.8048),
    ("和歌山県", "Wakayama", 34.2261, 135.1675),
    ("鳥取県", "Tottori", 35.5038, 134.2384),
    ("島根県", "Shimane", 35.4723, 133.0505),
    ("岡山県", "Okayama", 34.6617, 133.9341),
    ("広島県", "Hiroshima", 34.3963, 132.4596),
    ("山口県", "Yamaguchi", 34.1859, 131.4706),
    ("徳島県", "Tokushima", 34.0658, 134.5594),
    ("香川県", "Kagawa", 34.3401, 134.0434),
    ("愛媛県", "Ehime", 33.8416, 132.7657),
    ("高知県", "Kochi", 33.5597, 133.5311),
    ("福岡県", "Fukuoka", 33.6064, 130.4181),
    ("佐賀県", "Saga", 33.2494, 130.2989),
    ("長崎県", "Nagasaki", 32.7503, 129.8677),
    ("熊本県", "Kumamoto", 32.7898, 130.7417),
    ("大分県", "Oita", 33.2382, 131.6126),
    ("宮崎県", "Miyazaki", 31.9077, 131.4202),
    ("鹿児島県", "Kagoshima", 31.5602, 130.5581),
    ("沖縄県", "Okinawa", 26.2124, 127.6792),
];

static BUILTIN: OnceLock<GeoTable> = OnceLock::new();

/// Read-only region lookup. Built once; there is no way to change a table
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    regions: Vec<Region>,
    // lowercased name or alias -> index into `regions`
    index: HashMap<String, usize>,
}

impl GeoTable {
    /// The 47 Japanese prefectures, shared process-wide.
    pub fn builtin() -> &'static GeoTable {
        BUILTIN.get_or_init(|| {
            let mut table = GeoTable::default();
            for (name, alias, latitude, longitude) in PREFECTURES {
                table.insert(Region {
                    name: name.to_string(),
                    aliases: vec![alias.to_string()],
                    coordinate: Coordinate {
                        latitude,
                        longitude,
                    },
                });
            }
            table
        })
    }

    /// The built-in table with configured regions added. A configured region
    /// whose name matches an existing one replaces its coordinate and aliases.
    pub fn with_regions(extra: &[RegionConfig]) -> Result<GeoTable> {
        let mut table = Self::builtin().clone();
        for region in extra {
            let name = region.name.trim();
            if name.is_empty() {
                return Err(ProfileError::Configuration(
                    "configured region has an empty name".to_string(),
                ));
            }
            let coordinate =
                Coordinate::new(region.latitude, region.longitude).map_err(|err| match err {
                    ProfileError::Configuration(reason) => {
                        ProfileError::Configuration(format!("region {}: {}", name, reason))
                    }
                    other => other,
                })?;
            debug!(region = name, ?coordinate, "adding configured region");
            table.insert(Region {
                name: name.to_string(),
                aliases: region.aliases.clone(),
                coordinate,
            });
        }
        Ok(table)
    }

    fn insert(&mut self, region: Region) {
        let slot = match self.index.get(&key(&region.name)) {
            Some(&existing) => {
                let stale: Vec<String> = self.regions[existing]
                    .aliases
                    .iter()
                    .map(|alias| key(alias))
                    .collect();
                for alias in stale {
                    self.index.remove(&alias);
                }
                self.regions[existing] = region;
                existing
            }
            None => {
                self.regions.push(region);
                self.regions.len() - 1
            }
        };
        let region = &self.regions[slot];
        self.index.insert(key(&region.name), slot);
        for alias in &region.aliases {
            self.index.insert(key(alias), slot);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Region> {
        self.index.get(&key(name)).map(|&slot| &self.regions[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Coordinate of a region, or a configuration error naming the missing
    /// region.
    pub fn coordinate(&self, name: &str) -> Result<Coordinate> {
        self.get(name)
            .map(|region| region.coordinate)
            .ok_or_else(|| {
                ProfileError::Configuration(format!(
                    "region {:?} is not in the geolocation table",
                    name
                ))
            })
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}
