//! Analytic ephemeris from mean Keplerian elements.
//!
//! Elements are linear in days since 1999-12-31T00:00 TT, with the largest
//! lunar terms and the Jupiter/Saturn great-inequality terms added. Accuracy
//! is a few arcminutes for the Sun and Moon and better than 0.1° for the
//! planets between 1800 and 2200, which is well inside a sign.

use crate::ephemeris::EphemerisProvider;
use crate::error::CalculationError;
use crate::zodiac::normalize_longitude;
use crate::{CelestialBody, JulianDay};

/// Epoch of the element set (1999-12-31T00:00).
const ELEMENT_EPOCH: JulianDay = 2_451_543.5;

/// 1800-01-01.
pub const MIN_JULIAN_DAY: JulianDay = 2_378_496.5;
/// 2200-01-01.
pub const MAX_JULIAN_DAY: JulianDay = 2_524_593.5;

const KEPLER_TOLERANCE: f64 = 1e-12;
const KEPLER_MAX_ITERATIONS: usize = 30;

/// Mean orbital elements at a given day number. Angles in degrees.
#[derive(Debug, Copy, Clone)]
struct OrbitalElements {
    ascending_node: f64,
    inclination: f64,
    perihelion: f64,
    semi_major_axis: f64,
    eccentricity: f64,
    mean_anomaly: f64,
}

impl OrbitalElements {
    fn sun(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 0.0,
            inclination: 0.0,
            perihelion: 282.9404 + 4.70935e-5 * d,
            semi_major_axis: 1.0,
            eccentricity: 0.016709 - 1.151e-9 * d,
            mean_anomaly: 356.0470 + 0.9856002585 * d,
        }
    }

    fn moon(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 125.1228 - 0.0529538083 * d,
            inclination: 5.1454,
            perihelion: 318.0634 + 0.1643573223 * d,
            semi_major_axis: 60.2666,
            eccentricity: 0.054900,
            mean_anomaly: 115.3654 + 13.0649929509 * d,
        }
    }

    fn mercury(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 48.3313 + 3.24587e-5 * d,
            inclination: 7.0047 + 5.00e-8 * d,
            perihelion: 29.1241 + 1.01444e-5 * d,
            semi_major_axis: 0.387098,
            eccentricity: 0.205635 + 5.59e-10 * d,
            mean_anomaly: 168.6562 + 4.0923344368 * d,
        }
    }

    fn venus(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 76.6799 + 2.46590e-5 * d,
            inclination: 3.3946 + 2.75e-8 * d,
            perihelion: 54.8910 + 1.38374e-5 * d,
            semi_major_axis: 0.723330,
            eccentricity: 0.006773 - 1.302e-9 * d,
            mean_anomaly: 48.0052 + 1.6021302244 * d,
        }
    }

    fn mars(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 49.5574 + 2.11081e-5 * d,
            inclination: 1.8497 - 1.78e-8 * d,
            perihelion: 286.5016 + 2.92961e-5 * d,
            semi_major_axis: 1.523688,
            eccentricity: 0.093405 + 2.516e-9 * d,
            mean_anomaly: 18.6021 + 0.5240207766 * d,
        }
    }

    fn jupiter(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 100.4542 + 2.76854e-5 * d,
            inclination: 1.3030 - 1.557e-7 * d,
            perihelion: 273.8777 + 1.64505e-5 * d,
            semi_major_axis: 5.20256,
            eccentricity: 0.048498 + 4.469e-9 * d,
            mean_anomaly: 19.8950 + 0.0830853001 * d,
        }
    }

    fn saturn(d: f64) -> Self {
        OrbitalElements {
            ascending_node: 113.6634 + 2.38980e-5 * d,
            inclination: 2.4886 - 1.081e-7 * d,
            perihelion: 339.3939 + 2.97661e-5 * d,
            semi_major_axis: 9.55475,
            eccentricity: 0.055546 - 9.499e-9 * d,
            mean_anomaly: 316.9670 + 0.0334442282 * d,
        }
    }

    fn of(body: CelestialBody, d: f64) -> Self {
        match body {
            CelestialBody::Sun => Self::sun(d),
            CelestialBody::Moon => Self::moon(d),
            CelestialBody::Mercury => Self::mercury(d),
            CelestialBody::Venus => Self::venus(d),
            CelestialBody::Mars => Self::mars(d),
            CelestialBody::Jupiter => Self::jupiter(d),
            CelestialBody::Saturn => Self::saturn(d),
        }
    }

    /// True anomaly (degrees) and radius vector.
    fn anomaly_and_radius(&self) -> (f64, f64) {
        let e = self.eccentricity;
        let ecc_anomaly = solve_kepler(self.mean_anomaly.to_radians(), e);
        let xv = self.semi_major_axis * (ecc_anomaly.cos() - e);
        let yv = self.semi_major_axis * (1.0 - e * e).sqrt() * ecc_anomaly.sin();
        (yv.atan2(xv).to_degrees(), xv.hypot(yv))
    }

    /// Rectangular ecliptic coordinates relative to the orbit's focus.
    fn position(&self) -> [f64; 3] {
        let (v, r) = self.anomaly_and_radius();
        let node = self.ascending_node.to_radians();
        let incl = self.inclination.to_radians();
        let arg = (v + self.perihelion).to_radians();
        [
            r * (node.cos() * arg.cos() - node.sin() * arg.sin() * incl.cos()),
            r * (node.sin() * arg.cos() + node.cos() * arg.sin() * incl.cos()),
            r * arg.sin() * incl.sin(),
        ]
    }
}

/// Eccentric anomaly for mean anomaly `m` (radians) by Newton iteration.
fn solve_kepler(m: f64, e: f64) -> f64 {
    let mut ecc_anomaly = m + e * m.sin() * (1.0 + e * m.cos());
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let delta = (ecc_anomaly - e * ecc_anomaly.sin() - m) / (1.0 - e * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            break;
        }
    }
    ecc_anomaly
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Pure-Rust [`EphemerisProvider`] with no data files.
#[derive(Debug, Default, Copy, Clone)]
pub struct KeplerianEphemeris;

impl KeplerianEphemeris {
    pub fn new() -> Self {
        KeplerianEphemeris
    }

    fn check_range(julian_day: JulianDay) -> Result<(), CalculationError> {
        if !julian_day.is_finite() {
            return Err(CalculationError::new(
                CalculationError::OUT_OF_DOMAIN,
                format!("julian day {} is not a finite number", julian_day),
            ));
        }
        if !(MIN_JULIAN_DAY..=MAX_JULIAN_DAY).contains(&julian_day) {
            return Err(CalculationError::new(
                CalculationError::OUT_OF_RANGE,
                format!(
                    "julian day {} is outside {}-{}",
                    julian_day, MIN_JULIAN_DAY, MAX_JULIAN_DAY
                ),
            ));
        }
        Ok(())
    }

    fn longitude(&self, d: f64, body: CelestialBody) -> f64 {
        let sun = OrbitalElements::sun(d);
        let (sun_anomaly, sun_distance) = sun.anomaly_and_radius();
        let sun_longitude = sun_anomaly + sun.perihelion;

        if body == CelestialBody::Sun {
            return sun_longitude;
        }

        let elements = OrbitalElements::of(body, d);
        let [x, y, z] = elements.position();
        let mut longitude = y.atan2(x).to_degrees();

        match body {
            CelestialBody::Moon => {
                // geocentric already; add the main lunar perturbations
                let ms = sun.mean_anomaly;
                let mm = elements.mean_anomaly;
                let mean_sun = ms + sun.perihelion;
                let mean_moon = mm + elements.perihelion + elements.ascending_node;
                let elongation = mean_moon - mean_sun;
                let latitude_arg = mean_moon - elements.ascending_node;
                longitude += -1.274 * sin_deg(mm - 2.0 * elongation)
                    + 0.658 * sin_deg(2.0 * elongation)
                    - 0.186 * sin_deg(ms)
                    - 0.059 * sin_deg(2.0 * mm - 2.0 * elongation)
                    - 0.057 * sin_deg(mm - 2.0 * elongation + ms)
                    + 0.053 * sin_deg(mm + 2.0 * elongation)
                    + 0.046 * sin_deg(2.0 * elongation - ms)
                    + 0.041 * sin_deg(mm - ms)
                    - 0.035 * sin_deg(elongation)
                    - 0.031 * sin_deg(mm + ms)
                    - 0.015 * sin_deg(2.0 * latitude_arg - 2.0 * elongation)
                    + 0.011 * sin_deg(mm - 4.0 * elongation);
                return longitude;
            }
            CelestialBody::Jupiter | CelestialBody::Saturn => {
                let mj = OrbitalElements::jupiter(d).mean_anomaly;
                let ms = OrbitalElements::saturn(d).mean_anomaly;
                longitude += if body == CelestialBody::Jupiter {
                    -0.332 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                        - 0.056 * sin_deg(2.0 * mj - 2.0 * ms + 21.0)
                        + 0.042 * sin_deg(3.0 * mj - 5.0 * ms + 21.0)
                        - 0.036 * sin_deg(mj - 2.0 * ms)
                        + 0.022 * cos_deg(mj - ms)
                        + 0.023 * sin_deg(2.0 * mj - 3.0 * ms + 52.0)
                        - 0.016 * sin_deg(mj - 5.0 * ms - 69.0)
                } else {
                    0.812 * sin_deg(2.0 * mj - 5.0 * ms - 67.6)
                        - 0.229 * cos_deg(2.0 * mj - 4.0 * ms - 2.0)
                        + 0.119 * sin_deg(mj - 2.0 * ms - 3.0)
                        + 0.046 * sin_deg(2.0 * mj - 6.0 * ms - 69.0)
                        + 0.014 * sin_deg(mj - 3.0 * ms + 32.0)
                };
            }
            _ => {}
        }

        // heliocentric to geocentric
        let latitude = z.atan2(x.hypot(y));
        let radius = (x * x + y * y + z * z).sqrt();
        let lon = longitude.to_radians();
        let sun_lon = sun_longitude.to_radians();
        let xg = radius * lon.cos() * latitude.cos() + sun_distance * sun_lon.cos();
        let yg = radius * lon.sin() * latitude.cos() + sun_distance * sun_lon.sin();
        yg.atan2(xg).to_degrees()
    }
}

impl EphemerisProvider for KeplerianEphemeris {
    fn ecliptic_longitude(
        &self,
        julian_day: JulianDay,
        body: CelestialBody,
    ) -> Result<f64, CalculationError> {
        Self::check_range(julian_day)?;
        Ok(normalize_longitude(self.longitude(julian_day - ELEMENT_EPOCH, body)))
    }

    fn name(&self) -> &str {
        "keplerian"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::J2000;
    use crate::ZodiacSign;
    use approx::assert_abs_diff_eq;

    fn longitudes(julian_day: JulianDay) -> Vec<f64> {
        CelestialBody::ALL
            .iter()
            .map(|&body| KeplerianEphemeris.ecliptic_longitude(julian_day, body).unwrap())
            .collect()
    }

    #[test]
    fn test_j2000_positions() {
        // apparent longitudes at 2000-01-01T12:00
        let expected = [280.37, 223.32, 271.89, 241.57, 327.96, 25.25, 40.40];
        for (body, (actual, expected)) in CelestialBody::ALL
            .iter()
            .zip(longitudes(J2000).into_iter().zip(expected))
        {
            assert!(
                (actual - expected).abs() < 0.1,
                "{}: {} vs {}",
                body,
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_signs_for_1985_12_25_utc() {
        // 1985-12-25 12:30 JST
        let positions = longitudes(2_446_424.645_833_333);
        let signs: Vec<ZodiacSign> = positions
            .iter()
            .map(|&lon| ZodiacSign::from_longitude(lon))
            .collect();
        assert_eq!(
            signs,
            vec![
                ZodiacSign::Capricorn,
                ZodiacSign::Gemini,
                ZodiacSign::Sagittarius,
                ZodiacSign::Sagittarius,
                ZodiacSign::Scorpio,
                ZodiacSign::Aquarius,
                ZodiacSign::Sagittarius,
            ]
        );
        assert_abs_diff_eq!(positions[0], 273.293, epsilon = 0.01);
        assert_abs_diff_eq!(positions[1], 69.244, epsilon = 0.01);
    }

    #[test]
    fn test_longitudes_are_normalized_and_continuous() {
        let mut previous = longitudes(J2000);
        for step in 1..=48 {
            let current = longitudes(J2000 + step as f64 / 24.0);
            for (before, after) in previous.iter().zip(&current) {
                assert!((0.0..360.0).contains(after));
                let mut delta = (after - before).abs();
                if delta > 180.0 {
                    delta = 360.0 - delta;
                }
                // the Moon moves about 0.55° an hour; nothing else comes close
                assert!(delta < 1.0, "jump of {} degrees", delta);
            }
            previous = current;
        }
    }

    #[test]
    fn test_out_of_range_instant() {
        let err = KeplerianEphemeris
            .ecliptic_longitude(MIN_JULIAN_DAY - 1.0, CelestialBody::Mars)
            .unwrap_err();
        assert_eq!(err.code, CalculationError::OUT_OF_RANGE);

        let err = KeplerianEphemeris
            .ecliptic_longitude(f64::NAN, CelestialBody::Sun)
            .unwrap_err();
        assert_eq!(err.code, CalculationError::OUT_OF_DOMAIN);
    }

    #[test]
    fn test_kepler_solver_converges_for_mercury_eccentricity() {
        let e = 0.205635;
        for step in 0..36 {
            let m = (step as f64 * 10.0).to_radians();
            let ecc_anomaly = solve_kepler(m, e);
            assert_abs_diff_eq!(ecc_anomaly - e * ecc_anomaly.sin(), m, epsilon = 1e-10);
        }
    }
}
