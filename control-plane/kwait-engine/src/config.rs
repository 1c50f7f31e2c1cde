use envconfig::Envconfig;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

#[derive(Envconfig, Clone, Debug)]
pub struct WaitConfig {
    /// Namespace holding release records. Falls back to the kubeconfig
    /// context namespace when unset.
    /// Env: KWAIT_NAMESPACE
    #[envconfig(from = "KWAIT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Delay between two readiness checks of the same resource.
    /// Env: KWAIT_POLL_INTERVAL_MS
    #[envconfig(from = "KWAIT_POLL_INTERVAL_MS", default = "2000")]
    pub poll_interval_ms: u64,

    /// Timeout used when `--timeout` is not given (e.g. "300s", "5m").
    /// Env: KWAIT_DEFAULT_TIMEOUT
    #[envconfig(from = "KWAIT_DEFAULT_TIMEOUT", default = "300s")]
    pub default_timeout: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration '{0}' (expected e.g. 30s, 1.5m or 1h30m)")]
    InvalidDuration(String),
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn default_timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration(&self.default_timeout).ok_or_else(|| {
            ConfigError::InvalidDuration(self.default_timeout.clone())
        })
    }
}

/// Error text for a duration [`parse_duration`] rejected.
pub fn invalid_duration(s: &str) -> String {
    ConfigError::InvalidDuration(s.to_string()).to_string()
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3600 * NANOS_PER_SEC,
        _ => return None,
    })
}

fn split_digits(s: &str) -> (&str, &str) {
    s.split_at(s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len()))
}

/// Parse a Go `time.Duration` string: a sequence of decimal numbers, each
/// with an optional fraction and a required unit (`ns`, `us`, `ms`, `s`,
/// `m`, `h`), e.g. `300ms`, `1.5h` or `2h45m`. A bare `0` is zero.
///
/// Negative durations are rejected since a wait cannot end in the past.
/// Fractions finer than a nanosecond are truncated.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (frac, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", tail),
        };
        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = unit_nanos(unit)?;

        let whole: u128 = match whole {
            "" => 0,
            digits => digits.parse().ok()?,
        };
        let mut part = whole.checked_mul(scale)?;
        // 20 digits keep `frac * scale` within u128.
        let frac = &frac[..frac.len().min(20)];
        if !frac.is_empty() {
            let digits: u128 = frac.parse().ok()?;
            part += digits * scale / 10u128.pow(frac.len() as u32);
        }
        total = total.checked_add(part)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}
