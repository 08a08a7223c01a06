use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, InputField, ProfileError, Result};
use crate::{CelestialBody, Element, ZodiacSign};

pub const SIGN_WIDTH: f64 = 30.0;

/// Longitude taken into [0, 360).
pub fn normalize_longitude(longitude: f64) -> f64 {
    let normalized = longitude.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// `floor(longitude / 30) mod 12`, always a valid sign index.
pub fn sign_index(longitude: f64) -> usize {
    let normalized_longitude = normalize_longitude(longitude);
    ((normalized_longitude / SIGN_WIDTH).floor() as usize) % 12
}

/// Where a longitude falls on the zodiac.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub sign: ZodiacSign,
    pub degree_in_sign: f64,
    pub element: Element,
}

/// Classify a longitude into sign, degree within the sign and element.
///
/// Total over finite longitudes: the input is taken mod 360 first, so
/// `classify(l) == classify(l + 360.0 * k)`.
pub fn classify(longitude: f64) -> Placement {
    let normalized_longitude = normalize_longitude(longitude);
    let index = sign_index(normalized_longitude);
    let sign = ZodiacSign::ALL[index];
    let degree_in_sign = (normalized_longitude - index as f64 * SIGN_WIDTH)
        .clamp(0.0, SIGN_WIDTH - f64::EPSILON * 32.0);
    Placement {
        sign,
        degree_in_sign,
        element: sign.element(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPosition {
    pub body: CelestialBody,
    pub longitude: f64,
    pub sign: ZodiacSign,
    pub degree_in_sign: f64,
    pub element: Element,
}

impl BodyPosition {
    /// Classify a resolved longitude. Non-finite values are rejected as
    /// out-of-domain provider output.
    pub fn new(body: CelestialBody, longitude: f64) -> Result<Self> {
        if !longitude.is_finite() {
            return Err(ProfileError::position(
                body,
                CalculationError::new(
                    CalculationError::OUT_OF_DOMAIN,
                    format!("longitude {} is not a finite number", longitude),
                ),
            ));
        }
        let longitude = normalize_longitude(longitude);
        let Placement {
            sign,
            degree_in_sign,
            element,
        } = classify(longitude);
        Ok(BodyPosition {
            body,
            longitude,
            sign,
            degree_in_sign,
            element,
        })
    }

    /// Builds a position from a sign and degree, as supplied by a client that
    /// already holds placements.
    pub fn from_sign(body: CelestialBody, sign: ZodiacSign, degree_in_sign: f64) -> Result<Self> {
        if !(0.0..SIGN_WIDTH).contains(&degree_in_sign) {
            return Err(ProfileError::invalid(
                InputField::Bodies,
                format!("{} degree {} is outside [0, 30)", body, degree_in_sign),
            ));
        }
        Self::new(body, sign.index() as f64 * SIGN_WIDTH + degree_in_sign)
    }

    pub fn placement(&self) -> Placement {
        Placement {
            sign: self.sign,
            degree_in_sign: self.degree_in_sign,
            element: self.element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_classify_first_sign() {
        let placement = classify(15.0);
        assert_eq!(placement.sign, ZodiacSign::Aries);
        assert_eq!(placement.sign.index(), 0);
        assert_relative_eq!(placement.degree_in_sign, 15.0, epsilon = 1e-9);
        assert_eq!(placement.element, Element::Fire);
        assert_eq!(classify(375.0), placement);
    }

    #[test]
    fn test_classify_is_periodic() {
        for step in 0..720 {
            let longitude = step as f64 * 0.5 + 0.25;
            let base = classify(longitude);
            for k in [-3i32, -1, 1, 2, 5] {
                let shifted = classify(longitude + 360.0 * k as f64);
                assert_eq!(shifted.sign, base.sign, "longitude {}", longitude);
                assert_eq!(shifted.element, base.element);
                assert_relative_eq!(shifted.degree_in_sign, base.degree_in_sign, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_degree_in_sign_bounds() {
        let samples = [
            0.0, 29.999999, 30.0, 59.5, 180.0, 330.0, 359.999999, 360.0, -0.5, -30.0, -1e-20,
            1e7 + 0.3,
        ];
        for longitude in samples {
            let placement = classify(longitude);
            assert!(
                placement.degree_in_sign >= 0.0 && placement.degree_in_sign < 30.0,
                "longitude {} gave degree {}",
                longitude,
                placement.degree_in_sign
            );
            let expected = ZodiacSign::ALL
                [((normalize_longitude(longitude) / 30.0).floor() as usize) % 12];
            assert_eq!(placement.sign, expected);
        }
    }

    #[test]
    fn test_negative_longitudes_wrap() {
        assert_eq!(classify(-0.5).sign, ZodiacSign::Pisces);
        assert_relative_eq!(classify(-0.5).degree_in_sign, 29.5, epsilon = 1e-9);
        assert_eq!(classify(-1e-20).sign, ZodiacSign::Aries);
        assert_eq!(classify(-30.0).sign, ZodiacSign::Pisces);
    }

    #[test]
    fn test_sign_boundaries() {
        assert_eq!(classify(29.999).sign, ZodiacSign::Aries);
        assert_eq!(classify(30.0).sign, ZodiacSign::Taurus);
        assert_eq!(classify(120.0).sign, ZodiacSign::Leo);
        assert_eq!(classify(359.9).sign, ZodiacSign::Pisces);
        assert_eq!(classify(360.0).sign, ZodiacSign::Aries);
    }

    #[test]
    fn test_body_position_rejects_non_finite() {
        let err = BodyPosition::new(CelestialBody::Venus, f64::NAN).unwrap_err();
        match err {
            ProfileError::PositionResolution { body, source } => {
                assert_eq!(body, CelestialBody::Venus);
                assert_eq!(source.code, CalculationError::OUT_OF_DOMAIN);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(BodyPosition::new(CelestialBody::Sun, f64::INFINITY).is_err());
    }

    #[test]
    fn test_body_position_from_sign() {
        let position =
            BodyPosition::from_sign(CelestialBody::Moon, ZodiacSign::Cancer, 12.5).unwrap();
        assert_relative_eq!(position.longitude, 102.5, epsilon = 1e-9);
        assert_eq!(position.element, Element::Water);
        assert!(BodyPosition::from_sign(CelestialBody::Moon, ZodiacSign::Cancer, 30.0).is_err());
    }

    #[test]
    fn test_body_position_normalizes_longitude() {
        let position = BodyPosition::new(CelestialBody::Mars, 725.0).unwrap();
        assert_relative_eq!(position.longitude, 5.0, epsilon = 1e-9);
        assert_eq!(position.sign, ZodiacSign::Aries);
    }
}
