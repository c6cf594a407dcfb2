//! Container options and where they are loaded from.
//!
//! Options are read once when a container is built and inherited by its
//! clones. The process-wide base container reads them from the environment.

use std::env;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ContainerOptions::max_resolution_depth`].
pub const ENV_MAX_RESOLUTION_DEPTH: &str = "IOC_MAX_RESOLUTION_DEPTH";
/// Environment variable overriding [`ContainerOptions::detect_cycles`].
pub const ENV_DETECT_CYCLES: &str = "IOC_DETECT_CYCLES";

const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 1024;

/// Tunables for a container's resolution engine.
///
/// # Examples
///
/// ```rust
/// use ioc_container::{Container, ContainerOptions};
///
/// let options = ContainerOptions {
///     max_resolution_depth: 32,
///     ..ContainerOptions::default()
/// };
/// let container = Container::with_options(options);
/// assert_eq!(container.options().max_resolution_depth, 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// How many nested factory invocations one resolution may run through
    pub max_resolution_depth: usize,
    /// Fail with `DiError::Circular` when a factory re-enters its own registration
    ///
    /// With detection off, only the depth limit stops runaway recursion, and a
    /// singleton that resolves itself blocks on its own slot.
    pub detect_cycles: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            detect_cycles: true,
        }
    }
}

impl ContainerOptions {
    /// Defaults overridden by `IOC_MAX_RESOLUTION_DEPTH` and `IOC_DETECT_CYCLES`.
    ///
    /// Unparseable values, and a depth below 1, are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        match parse_var::<_, usize>(&lookup, ENV_MAX_RESOLUTION_DEPTH) {
            Some(0) => {
                tracing::warn!(variable = ENV_MAX_RESOLUTION_DEPTH, value = 0, "ignoring container option below 1");
            }
            Some(depth) => options.max_resolution_depth = depth,
            None => {}
        }
        if let Some(detect) = parse_var(&lookup, ENV_DETECT_CYCLES) {
            options.detect_cycles = detect;
        }
        options
    }

    /// Parses options from JSON; missing fields keep their defaults.
    ///
    /// ```rust
    /// use ioc_container::ContainerOptions;
    ///
    /// let options = ContainerOptions::from_json(r#"{ "detect_cycles": false }"#).unwrap();
    /// assert!(!options.detect_cycles);
    /// assert_eq!(options.max_resolution_depth, 1024);
    /// ```
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes to pretty-printed JSON.
    #[cfg(feature = "config")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable container option");
            None
        }
    }
}
