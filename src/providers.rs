//! Data collaborator seams
//!
//! The engine never performs I/O itself. Profile, band-signal and
//! health-metric data come from providers behind these traits. This module
//! also owns the partial-failure policy for gathering a calibration window:
//! every (day x signal) request is independent, and a failed request becomes
//! an empty sequence rather than aborting the batch.

use crate::error::{ComputeError, ProviderError};
use crate::types::{
    ActivityReading, BandSignalBundle, DailyInput, HealthMetricRecord, Profile, Reading,
};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Band signal types fetched per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignalType {
    Hr,
    Hrv,
    Cgm,
    Stress,
    Activity,
    Sleep,
}

impl SignalType {
    pub const ALL: [SignalType; 6] = [
        SignalType::Hr,
        SignalType::Hrv,
        SignalType::Cgm,
        SignalType::Stress,
        SignalType::Activity,
        SignalType::Sleep,
    ];

    /// Signals that feed a day's [`BandSignalBundle`]
    pub const BUNDLED: [SignalType; 4] = [
        SignalType::Hr,
        SignalType::Hrv,
        SignalType::Cgm,
        SignalType::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Hr => "hr",
            SignalType::Hrv => "hrv",
            SignalType::Cgm => "cgm",
            SignalType::Stress => "stress",
            SignalType::Activity => "activity",
            SignalType::Sleep => "sleep",
        }
    }
}

/// Supplies user profiles
pub trait ProfileProvider {
    fn fetch_profile(&self, user_id: &str) -> Result<Profile, ProviderError>;
}

/// Supplies raw readings for one signal on one day.
///
/// Readings are returned as raw JSON values; an empty vector means "no data".
pub trait BandSignalProvider {
    fn fetch_signal(
        &self,
        user_id: &str,
        date: NaiveDate,
        signal: SignalType,
    ) -> Result<Vec<Value>, ProviderError>;
}

/// Supplies the heterogeneous health-metric records for a day
pub trait HealthMetricsProvider {
    fn fetch_health_metrics(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<HealthMetricRecord>, ProviderError>;
}

/// Performs a login and returns a fresh access token
pub trait Authenticator {
    fn login(&self) -> Result<String, ProviderError>;
}

/// Authenticated session owning the access token.
///
/// The token is fetched on first use and reused until invalidated.
pub struct Session<A: Authenticator> {
    authenticator: A,
    token: Option<String>,
}

impl<A: Authenticator> Session<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            token: None,
        }
    }

    /// Current token, logging in if none is cached
    pub fn token(&mut self) -> Result<&str, ProviderError> {
        if self.token.is_none() {
            let token = self.authenticator.login()?;
            debug!("obtained access token");
            self.token = Some(token);
        }
        self.token
            .as_deref()
            .ok_or_else(|| ProviderError::Unauthorized("no access token".to_string()))
    }

    /// `Authorization` header value for the current token
    pub fn bearer(&mut self) -> Result<String, ProviderError> {
        Ok(format!("Bearer {}", self.token()?))
    }

    /// Drop the cached token so the next call logs in again
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// First day of a window of `days` days ending on `end`
pub fn window_start(end: NaiveDate, days: usize) -> NaiveDate {
    let span = days.saturating_sub(1) as i64;
    end - Duration::days(span)
}

/// Band data gathered over a calibration window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowData {
    /// Readings per day, per signal; days in chronological order
    pub days: BTreeMap<NaiveDate, BTreeMap<SignalType, Vec<Value>>>,
    /// Requests that failed and were degraded to empty
    pub failures: usize,
}

impl WindowData {
    /// Band bundle for `date`; signals that are missing or malformed are empty
    pub fn bundle_for(&self, date: NaiveDate) -> BandSignalBundle {
        let Some(signals) = self.days.get(&date) else {
            return BandSignalBundle::default();
        };
        let raw = |signal: SignalType| signals.get(&signal).map(Vec::as_slice).unwrap_or(&[]);

        BandSignalBundle {
            hr: parse_readings::<Reading>(raw(SignalType::Hr), SignalType::Hr),
            hrv: parse_readings::<Reading>(raw(SignalType::Hrv), SignalType::Hrv),
            cgm: parse_readings::<Reading>(raw(SignalType::Cgm), SignalType::Cgm),
            activity: parse_readings::<ActivityReading>(
                raw(SignalType::Activity),
                SignalType::Activity,
            ),
        }
    }

    /// Band bundle for the most recent day in the window
    pub fn latest_bundle(&self) -> BandSignalBundle {
        self.days
            .keys()
            .next_back()
            .map(|date| self.bundle_for(*date))
            .unwrap_or_default()
    }
}

fn parse_readings<T: serde::de::DeserializeOwned>(raw: &[Value], signal: SignalType) -> Vec<T> {
    raw.iter()
        .filter_map(|value| match serde_json::from_value(value.clone()) {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(signal = signal.as_str(), error = %e, "dropping malformed reading");
                None
            }
        })
        .collect()
}

/// Fetch every signal for every day of the window ending on `end`.
///
/// Individual failures are logged and recorded as empty results.
pub fn gather_window<P: BandSignalProvider + ?Sized>(
    provider: &P,
    user_id: &str,
    end: NaiveDate,
    days: usize,
) -> WindowData {
    gather_signals(provider, user_id, end, days, &SignalType::ALL)
}

/// Fetch the given signals for every day of the window ending on `end`
pub fn gather_signals<P: BandSignalProvider + ?Sized>(
    provider: &P,
    user_id: &str,
    end: NaiveDate,
    days: usize,
    signals: &[SignalType],
) -> WindowData {
    let start = window_start(end, days);
    let mut window = WindowData::default();

    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        let mut readings_by_signal = BTreeMap::new();

        for &signal in signals {
            let readings = match provider.fetch_signal(user_id, date, signal) {
                Ok(readings) => readings,
                Err(e) => {
                    warn!(%date, signal = signal.as_str(), error = %e, "signal fetch failed, using empty result");
                    window.failures += 1;
                    Vec::new()
                }
            };
            readings_by_signal.insert(signal, readings);
        }
        window.days.insert(date, readings_by_signal);
    }

    window
}

/// Collect everything needed for one day's report from the providers.
///
/// Only the signals the day's bundle consumes are requested. A profile
/// failure is returned to the caller. Band and health-metric failures degrade
/// to empty data and surface later as risk flags.
pub fn fetch_daily_input<PP, BP, HP>(
    profiles: &PP,
    band: &BP,
    metrics: &HP,
    user_id: &str,
    date: NaiveDate,
) -> Result<DailyInput, ComputeError>
where
    PP: ProfileProvider + ?Sized,
    BP: BandSignalProvider + ?Sized,
    HP: HealthMetricsProvider + ?Sized,
{
    let profile = profiles.fetch_profile(user_id)?;

    let day = gather_signals(band, user_id, date, 1, &SignalType::BUNDLED);
    debug!(%date, failures = day.failures, "gathered band signals");
    let health_metrics = metrics
        .fetch_health_metrics(user_id, date)
        .unwrap_or_else(|e| {
            warn!(%date, error = %e, "health metrics fetch failed, using empty result");
            Vec::new()
        });

    let mut input = DailyInput::new(&date.format("%Y-%m-%d").to_string(), profile);
    input.band_data = day.bundle_for(date);
    input.health_metrics = health_metrics;
    Ok(input)
}

/// JSON file-backed providers.
///
/// - profile: one JSON object
/// - band: `<dir>/<YYYY-MM-DD>.json`, an object keyed by signal name
/// - health metrics: a JSON array of records, used for every date
///
/// Each day file is read and parsed once; later signal requests for the same
/// day are served from memory.
pub struct FileProviders {
    profile_path: PathBuf,
    band_dir: PathBuf,
    metrics_path: Option<PathBuf>,
    band_days: RefCell<BTreeMap<NaiveDate, Result<Value, ProviderError>>>,
}

impl FileProviders {
    pub fn new(profile_path: &Path, band_dir: &Path, metrics_path: Option<&Path>) -> Self {
        Self {
            profile_path: profile_path.to_path_buf(),
            band_dir: band_dir.to_path_buf(),
            metrics_path: metrics_path.map(Path::to_path_buf),
            band_days: RefCell::new(BTreeMap::new()),
        }
    }

    fn band_day(&self, date: NaiveDate) -> Result<Value, ProviderError> {
        self.band_days
            .borrow_mut()
            .entry(date)
            .or_insert_with(|| {
                let path = self.band_dir.join(format!("{}.json", date.format("%Y-%m-%d")));
                let raw = Self::read(&path)?;
                serde_json::from_str(&raw).map_err(|e| ProviderError::Request(e.to_string()))
            })
            .clone()
    }

    fn read(path: &Path) -> Result<String, ProviderError> {
        fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound(path.display().to_string()),
            _ => ProviderError::Request(format!("{}: {e}", path.display())),
        })
    }
}

impl ProfileProvider for FileProviders {
    fn fetch_profile(&self, _user_id: &str) -> Result<Profile, ProviderError> {
        let raw = Self::read(&self.profile_path)?;
        serde_json::from_str(&raw).map_err(|e| ProviderError::Request(e.to_string()))
    }
}

impl BandSignalProvider for FileProviders {
    fn fetch_signal(
        &self,
        _user_id: &str,
        date: NaiveDate,
        signal: SignalType,
    ) -> Result<Vec<Value>, ProviderError> {
        let day = self.band_day(date)?;

        match day.get(signal.as_str()) {
            Some(Value::Array(readings)) => Ok(readings.clone()),
            _ => Ok(Vec::new()),
        }
    }
}

impl HealthMetricsProvider for FileProviders {
    fn fetch_health_metrics(
        &self,
        _user_id: &str,
        _date: NaiveDate,
    ) -> Result<Vec<HealthMetricRecord>, ProviderError> {
        let Some(path) = &self.metrics_path else {
            return Ok(Vec::new());
        };
        let raw = Self::read(path)?;
        serde_json::from_str(&raw).map_err(|e| ProviderError::Request(e.to_string()))
    }
}
