//! Validation of the user-supplied probe parameters.
//!
//! Every check reports the name of the field it rejected so the control
//! surface can point at it.

use std::net::IpAddr;
use std::time::Duration;

use url::Host;

use crate::error::ConfigError;

const MAX_HOST_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Upper bound on the cycle time (24 hours).
pub const MAX_INTERVAL: Duration = Duration::from_secs(86_400);

/// Upper bound on a single probe (5 minutes).
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Validate a hostname or IP literal.
///
/// Resolution is not attempted here; a name that does not resolve is a
/// probe outcome, not a configuration error.
pub fn validate_host(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::invalid("host", "must not be empty"));
    }

    if host.trim() != host || host.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid("host", "must not contain whitespace"));
    }

    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    // `Host::parse` would accept these after decoding, but the resolver is
    // handed the raw string
    if !host.is_ascii() {
        return Err(ConfigError::invalid(
            "host",
            "must be ASCII; give internationalized names in punycode (xn--) form",
        ));
    }
    if host.contains('%') {
        return Err(ConfigError::invalid("host", "must not contain percent-encoding"));
    }

    match Host::parse(host) {
        Ok(Host::Domain(domain)) => validate_domain(&domain),
        Ok(Host::Ipv4(_)) | Ok(Host::Ipv6(_)) => Ok(()),
        Err(e) => Err(ConfigError::invalid("host", format!("not a hostname or IP address: {e}"))),
    }
}

fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.len() > MAX_HOST_LEN {
        return Err(ConfigError::invalid(
            "host",
            format!("longer than {MAX_HOST_LEN} characters"),
        ));
    }

    for label in domain.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(ConfigError::invalid(
                "host",
                format!("label `{label}` must be 1 to {MAX_LABEL_LEN} characters"),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ConfigError::invalid(
                "host",
                format!("label `{label}` must not start or end with a hyphen"),
            ));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(ConfigError::invalid(
                "host",
                format!("label `{label}` contains invalid characters"),
            ));
        }
    }

    Ok(())
}

/// Validate the cycle time.
pub fn validate_interval(interval: Duration) -> Result<(), ConfigError> {
    if interval.is_zero() {
        return Err(ConfigError::invalid("cycle_time_milliseconds", "must be greater than 0"));
    }

    if interval > MAX_INTERVAL {
        return Err(ConfigError::invalid(
            "cycle_time_milliseconds",
            format!("{} ms exceeds the maximum of {} ms", interval.as_millis(), MAX_INTERVAL.as_millis()),
        ));
    }

    Ok(())
}

/// Validate the probe timeout.
pub fn validate_timeout(timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::invalid("ping_timeout_milliseconds", "must be greater than 0"));
    }

    if timeout > MAX_TIMEOUT {
        return Err(ConfigError::invalid(
            "ping_timeout_milliseconds",
            format!("{} ms exceeds the maximum of {} ms", timeout.as_millis(), MAX_TIMEOUT.as_millis()),
        ));
    }

    Ok(())
}
