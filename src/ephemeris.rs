use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::error::{CalculationError, ProfileError, Result};
use crate::time::NormalizedInstant;
use crate::zodiac::{normalize_longitude, BodyPosition};
use crate::{CelestialBody, JulianDay};

/// Source of geocentric ecliptic longitudes.
///
/// Implementations must be deterministic for a given (instant, body) and
/// continuous in time apart from the 360/0 wrap.
pub trait EphemerisProvider: Send + Sync {
    /// Geocentric ecliptic longitude of `body` in degrees. Any real value is
    /// accepted; callers take it mod 360.
    fn ecliptic_longitude(
        &self,
        julian_day: JulianDay,
        body: CelestialBody,
    ) -> Result<f64, CalculationError>;

    fn name(&self) -> &str {
        "ephemeris"
    }
}

impl<P: EphemerisProvider + ?Sized> EphemerisProvider for Arc<P> {
    fn ecliptic_longitude(
        &self,
        julian_day: JulianDay,
        body: CelestialBody,
    ) -> Result<f64, CalculationError> {
        (**self).ecliptic_longitude(julian_day, body)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// How [`PositionResolver::resolve_all`] schedules provider calls. Both modes
/// wait on the caller's thread with a deadline; a worker still inside the
/// provider when the deadline passes is detached and left to finish on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// One worker walks the bodies in order and stops at the first failure.
    Sequential,
    /// One worker thread per body. A provider that never returns keeps up to
    /// one detached thread per body alive after the request has timed out.
    Parallel,
}

type Slot = (usize, Result<f64>);

/// Looks up every tracked body for an instant, all or nothing.
#[derive(Clone)]
pub struct PositionResolver {
    provider: Arc<dyn EphemerisProvider>,
    mode: ResolveMode,
    timeout: Duration,
}

impl PositionResolver {
    pub fn new(
        provider: Arc<dyn EphemerisProvider>,
        mode: ResolveMode,
        timeout: Duration,
    ) -> Self {
        PositionResolver {
            provider,
            mode,
            timeout,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Longitude of one body in [0, 360).
    pub fn resolve(&self, instant: &NormalizedInstant, body: CelestialBody) -> Result<f64> {
        resolve_with(self.provider.as_ref(), instant.julian_day, body)
    }

    /// Positions of `bodies`, in the order given. The whole set fails with the
    /// first failure in that order, or with a timeout naming the first body
    /// still unresolved at the deadline.
    pub fn resolve_all(
        &self,
        instant: &NormalizedInstant,
        bodies: &[CelestialBody],
    ) -> Result<Vec<BodyPosition>> {
        if bodies.is_empty() {
            return Ok(Vec::new());
        }
        let deadline = Instant::now() + self.timeout;
        let rx = match self.mode {
            ResolveMode::Sequential => self.spawn_sequential(instant.julian_day, bodies)?,
            ResolveMode::Parallel => self.spawn_parallel(instant.julian_day, bodies)?,
        };
        let longitudes = self.collect(bodies, rx, deadline)?;
        bodies
            .iter()
            .zip(longitudes)
            .map(|(&body, longitude)| BodyPosition::new(body, longitude))
            .collect()
    }

    fn spawn_sequential(
        &self,
        julian_day: JulianDay,
        bodies: &[CelestialBody],
    ) -> Result<mpsc::Receiver<Slot>> {
        let (tx, rx) = mpsc::channel();
        let provider = Arc::clone(&self.provider);
        let walk = bodies.to_vec();
        spawn_worker("ephemeris-sequential".to_string(), bodies[0], move || {
            for (slot, body) in walk.into_iter().enumerate() {
                let result = resolve_with(provider.as_ref(), julian_day, body);
                let failed = result.is_err();
                // the receiver is gone once the request has failed or timed out
                if tx.send((slot, result)).is_err() || failed {
                    break;
                }
            }
        })?;
        Ok(rx)
    }

    fn spawn_parallel(
        &self,
        julian_day: JulianDay,
        bodies: &[CelestialBody],
    ) -> Result<mpsc::Receiver<Slot>> {
        let (tx, rx) = mpsc::channel();
        for (slot, &body) in bodies.iter().enumerate() {
            let tx = tx.clone();
            let provider = Arc::clone(&self.provider);
            let name = format!("ephemeris-{}", body.name().to_lowercase());
            spawn_worker(name, body, move || {
                let result = resolve_with(provider.as_ref(), julian_day, body);
                let _ = tx.send((slot, result));
            })?;
        }
        Ok(rx)
    }

    /// Waits until every slot holds a longitude, the earliest open slot holds
    /// an error, or the deadline passes.
    fn collect(
        &self,
        bodies: &[CelestialBody],
        rx: mpsc::Receiver<Slot>,
        deadline: Instant,
    ) -> Result<Vec<f64>> {
        let mut slots: Vec<Option<Result<f64>>> = bodies.iter().map(|_| None).collect();
        loop {
            let first_open = match slots.iter().position(|slot| !matches!(slot, Some(Ok(_)))) {
                Some(first_open) => first_open,
                None => break,
            };
            if let Some(Err(err)) = slots[first_open].take() {
                return Err(err);
            }

            let body = bodies[first_open];
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((slot, result)) => slots[slot] = Some(result),
                Err(mpsc::RecvTimeoutError::Timeout) => return Err(self.timed_out(body)),
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!(%body, "ephemeris worker exited without a result");
                    return Err(ProfileError::position(
                        body,
                        CalculationError::new(
                            CalculationError::WORKER_LOST,
                            "worker exited without a result",
                        ),
                    ));
                }
            }
        }

        Ok(slots.into_iter().flatten().flatten().collect())
    }

    fn timed_out(&self, body: CelestialBody) -> ProfileError {
        let timeout_ms = self.timeout.as_millis() as u64;
        warn!(%body, timeout_ms, "ephemeris lookup timed out");
        ProfileError::position(
            body,
            CalculationError::new(
                CalculationError::TIMEOUT,
                format!("no position within {} ms", timeout_ms),
            ),
        )
    }
}

fn spawn_worker<F>(name: String, body: CelestialBody, work: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name)
        .spawn(work)
        .map(|_| ())
        .map_err(|err| {
            ProfileError::position(
                body,
                CalculationError::new(
                    CalculationError::WORKER_LOST,
                    format!("could not start worker: {}", err),
                ),
            )
        })
}

fn resolve_with(
    provider: &dyn EphemerisProvider,
    julian_day: JulianDay,
    body: CelestialBody,
) -> Result<f64> {
    let longitude = provider.ecliptic_longitude(julian_day, body).map_err(|err| {
        warn!(%body, provider = provider.name(), error = %err, "ephemeris lookup failed");
        ProfileError::position(body, err)
    })?;
    if !longitude.is_finite() {
        warn!(
            %body,
            provider = provider.name(),
            longitude,
            "ephemeris returned a non-finite longitude"
        );
        return Err(ProfileError::position(
            body,
            CalculationError::new(
                CalculationError::OUT_OF_DOMAIN,
                format!("longitude {} is not a finite number", longitude),
            ),
        ));
    }
    let longitude = normalize_longitude(longitude);
    debug!(%body, julian_day, longitude, "resolved position");
    Ok(longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::J2000;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    struct Fixed;

    impl EphemerisProvider for Fixed {
        fn ecliptic_longitude(
            &self,
            julian_day: JulianDay,
            body: CelestialBody,
        ) -> Result<f64, CalculationError> {
            Ok(julian_day - J2000 + body as usize as f64 * 50.0 - 20.0)
        }
    }

    struct Failing(CelestialBody);

    impl EphemerisProvider for Failing {
        fn ecliptic_longitude(
            &self,
            _julian_day: JulianDay,
            body: CelestialBody,
        ) -> Result<f64, CalculationError> {
            if body == self.0 {
                Err(CalculationError::new(-7, "no data"))
            } else {
                Ok(10.0)
            }
        }
    }

    struct Slow(CelestialBody);

    impl EphemerisProvider for Slow {
        fn ecliptic_longitude(
            &self,
            _julian_day: JulianDay,
            body: CelestialBody,
        ) -> Result<f64, CalculationError> {
            if body == self.0 {
                thread::sleep(Duration::from_millis(500));
            }
            Ok(100.0)
        }
    }

    fn j2000() -> NormalizedInstant {
        NormalizedInstant::from_utc(Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap())
    }

    fn resolver<P>(provider: P, mode: ResolveMode) -> PositionResolver
    where
        P: EphemerisProvider + 'static,
    {
        PositionResolver::new(Arc::new(provider), mode, Duration::from_secs(5))
    }

    #[test]
    fn test_resolve_normalizes_into_range() {
        let resolver = resolver(Fixed, ResolveMode::Sequential);
        assert_relative_eq!(resolver.resolve(&j2000(), CelestialBody::Sun).unwrap(), 340.0);
        assert_relative_eq!(resolver.resolve(&j2000(), CelestialBody::Moon).unwrap(), 30.0);
    }

    #[test]
    fn test_modes_agree_and_keep_order() {
        let sequential = resolver(Fixed, ResolveMode::Sequential)
            .resolve_all(&j2000(), &CelestialBody::ALL)
            .unwrap();
        let parallel = resolver(Fixed, ResolveMode::Parallel)
            .resolve_all(&j2000(), &CelestialBody::ALL)
            .unwrap();
        assert_eq!(sequential, parallel);
        let bodies: Vec<CelestialBody> = parallel.iter().map(|p| p.body).collect();
        assert_eq!(bodies, CelestialBody::ALL.to_vec());
    }

    #[test]
    fn test_failure_names_the_body() {
        for mode in [ResolveMode::Sequential, ResolveMode::Parallel] {
            let err = resolver(Failing(CelestialBody::Jupiter), mode)
                .resolve_all(&j2000(), &CelestialBody::ALL)
                .unwrap_err();
            match err {
                ProfileError::PositionResolution { body, source } => {
                    assert_eq!(body, CelestialBody::Jupiter);
                    assert_eq!(source.code, -7);
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_non_finite_longitude_is_rejected() {
        struct NotANumber;
        impl EphemerisProvider for NotANumber {
            fn ecliptic_longitude(
                &self,
                _julian_day: JulianDay,
                _body: CelestialBody,
            ) -> Result<f64, CalculationError> {
                Ok(f64::NAN)
            }
        }
        let err = resolver(NotANumber, ResolveMode::Sequential)
            .resolve(&j2000(), CelestialBody::Saturn)
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::PositionResolution {
                body: CelestialBody::Saturn,
                ..
            }
        ));
    }

    #[test]
    fn test_parallel_timeout_names_the_slow_body() {
        let resolver = PositionResolver::new(
            Arc::new(Slow(CelestialBody::Mercury)),
            ResolveMode::Parallel,
            Duration::from_millis(50),
        );
        let err = resolver
            .resolve_all(&j2000(), &CelestialBody::ALL)
            .unwrap_err();
        match err {
            ProfileError::PositionResolution { body, source } => {
                assert_eq!(body, CelestialBody::Mercury);
                assert_eq!(source.code, CalculationError::TIMEOUT);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_sequential_timeout_bounds_a_running_call() {
        let resolver = PositionResolver::new(
            Arc::new(Slow(CelestialBody::Saturn)),
            ResolveMode::Sequential,
            Duration::from_millis(50),
        );
        let started = Instant::now();
        let err = resolver
            .resolve_all(&j2000(), &CelestialBody::ALL)
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_millis(400));
        match err {
            ProfileError::PositionResolution { body, source } => {
                assert_eq!(body, CelestialBody::Saturn);
                assert_eq!(source.code, CalculationError::TIMEOUT);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parallel_reports_first_failure_in_body_order() {
        // Mercury fails late, Saturn fails at once
        struct TwoFailures;
        impl EphemerisProvider for TwoFailures {
            fn ecliptic_longitude(
                &self,
                _julian_day: JulianDay,
                body: CelestialBody,
            ) -> Result<f64, CalculationError> {
                match body {
                    CelestialBody::Mercury => {
                        thread::sleep(Duration::from_millis(100));
                        Err(CalculationError::new(-7, "late"))
                    }
                    CelestialBody::Saturn => Err(CalculationError::new(-8, "early")),
                    _ => Ok(42.0),
                }
            }
        }
        let err = resolver(TwoFailures, ResolveMode::Parallel)
            .resolve_all(&j2000(), &CelestialBody::ALL)
            .unwrap_err();
        match err {
            ProfileError::PositionResolution { body, source } => {
                assert_eq!(body, CelestialBody::Mercury);
                assert_eq!(source.code, -7);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_body_set_resolves_to_nothing() {
        for mode in [ResolveMode::Sequential, ResolveMode::Parallel] {
            assert!(resolver(Fixed, mode).resolve_all(&j2000(), &[]).unwrap().is_empty());
        }
    }
}
