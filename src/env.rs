//! Read-only snapshot of process environment variables.
//! Values loading and the deploy hook receive the snapshot explicitly
//! instead of reading `std::env` on their own.

use indexmap::IndexMap;
use serde::Serialize;
use std::ffi::{OsStr, OsString};

/// Ordered view of an environment.
///
/// Interpolation only sees variables whose name and value are valid UTF-8,
/// the deploy hook receives every variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvSnapshot {
    vars: IndexMap<String, String>,
    #[serde(skip)]
    vars_os: Vec<(OsString, OsString)>,
}

impl EnvSnapshot {
    /// Captures the environment of the current process.
    pub fn from_process() -> Self {
        Self::from_vars_os(std::env::vars_os())
    }

    /// Builds a snapshot from raw `(name, value)` pairs.
    pub fn from_vars_os<I: IntoIterator<Item = (OsString, OsString)>>(iter: I) -> Self {
        let vars_os: Vec<(OsString, OsString)> = iter.into_iter().collect();
        let vars = vars_os
            .iter()
            .filter_map(|(name, value)| {
                Some((name.to_str()?.to_string(), value.to_str()?.to_string()))
            })
            .collect();
        Self { vars, vars_os }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// UTF-8 variables, as seen by interpolation.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every variable, including ones that are not valid UTF-8.
    pub fn iter_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars_os.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn len(&self) -> usize {
        self.vars_os.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars_os.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_vars_os(iter.into_iter().map(|(k, v)| {
            let (k, v): (String, String) = (k.into(), v.into());
            (OsString::from(k), OsString::from(v))
        }))
    }
}
