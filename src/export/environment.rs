use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use sysinfo::System;

const UNKNOWN: &str = "unknown";

/// `major.minor.patch`; missing components count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// `None` unless the first component is a number. Later components that
    /// do not parse become zero.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let mut next = || parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        let minor = next();
        let patch = next();
        Some(Self::new(major, minor, patch))
    }

    /// With `ignores_zero`, trailing zero components are dropped
    /// (`1.2.0` → `1.2`, `0.0.0` → `0`).
    pub fn to_string_with(&self, ignores_zero: bool) -> String {
        let parts = [self.major, self.minor, self.patch];
        let keep = if ignores_zero {
            parts.iter().rposition(|&p| p != 0).map_or(1, |idx| idx + 1)
        } else {
            3
        };
        parts[..keep]
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(false))
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value).ok_or_else(|| format!("invalid version `{}`", value))
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Application facts the host supplies; the library cannot discover them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppInfo {
    pub version: Option<Version>,
    pub build: Option<String>,
    pub bundle_identifier: Option<String>,
    pub bundle_display_name: Option<String>,
}

/// The descriptor block appended to every export file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub version: Option<Version>,
    pub build: Option<String>,
    pub os_version: Option<String>,
    pub platform_name: Option<String>,
    pub device_name: Option<String>,
    pub region: Option<String>,
    pub bundle_identifier: Option<String>,
    pub bundle_display_name: Option<String>,
}

impl Environment {
    /// `app` fields plus what the host system reports.
    pub fn detect(app: AppInfo) -> Self {
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));

        Self {
            version: app.version,
            build: app.build,
            os_version: System::long_os_version().or_else(System::os_version),
            platform_name: System::name().or_else(|| Some(std::env::consts::OS.to_string())),
            device_name: System::host_name(),
            region: locale.as_deref().and_then(region_from_locale),
            bundle_identifier: app.bundle_identifier,
            bundle_display_name: app.bundle_display_name,
        }
    }

    /// Aligned `key : value` lines in a fixed order, `unknown` for absent values.
    pub fn describe(&self, exported_at: DateTime<Local>) -> String {
        let version = match (&self.version, &self.build) {
            (Some(version), Some(build)) => format!("{} ({})", version, build),
            (Some(version), None) => version.to_string(),
            (None, _) => UNKNOWN.to_string(),
        };
        let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| UNKNOWN.to_string());

        let rows = [
            ("Export Date", exported_at.format("%Y-%m-%d %H:%M:%S %z").to_string()),
            ("Version", version),
            ("OS Version", or_unknown(&self.os_version)),
            ("Platform Name", or_unknown(&self.platform_name)),
            ("Device Name", or_unknown(&self.device_name)),
            ("Region", or_unknown(&self.region)),
            ("Bundle Identifier", or_unknown(&self.bundle_identifier)),
            ("Bundle Display Name", or_unknown(&self.bundle_display_name)),
        ];
        let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        rows.iter()
            .map(|(key, value)| format!("{:<width$} : {}", key, value, width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `en_US.UTF-8` → `US`. `C` and `POSIX` carry no region.
fn region_from_locale(locale: &str) -> Option<String> {
    let name = locale.split(['.', '@']).next()?;
    let (_, region) = name.split_once(['_', '-'])?;
    if region.is_empty() {
        None
    } else {
        Some(region.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parse_fills_missing_components() {
        assert_eq!(Version::parse("2"), Some(Version::new(2, 0, 0)));
        assert_eq!(Version::parse("1.4"), Some(Version::new(1, 4, 0)));
        assert_eq!(Version::parse("1.x.3"), Some(Version::new(1, 0, 3)));
        assert_eq!(Version::parse("beta"), None);
    }

    #[test]
    fn version_orders_component_wise() {
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
        assert_eq!(Version::new(1, 2, 3).cmp(&Version::new(1, 2, 3)), Ordering::Equal);
    }

    #[test]
    fn version_ignoring_zero() {
        assert_eq!(Version::new(1, 2, 0).to_string_with(true), "1.2");
        assert_eq!(Version::new(1, 0, 3).to_string_with(true), "1.0.3");
        assert_eq!(Version::new(0, 0, 0).to_string_with(true), "0");
        assert_eq!(Version::new(1, 2, 0).to_string(), "1.2.0");
    }

    #[test]
    fn region_is_taken_from_locale() {
        assert_eq!(region_from_locale("en_US.UTF-8"), Some("US".into()));
        assert_eq!(region_from_locale("ko-KR"), Some("KR".into()));
        assert_eq!(region_from_locale("C"), None);
        assert_eq!(region_from_locale("POSIX"), None);
    }

    #[test]
    fn describe_aligns_keys_and_marks_unknowns() {
        let env = Environment {
            version: Some(Version::new(1, 2, 0)),
            build: Some("45".into()),
            ..Default::default()
        };
        let text = env.describe(Local::now());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 8);
        assert!(lines[0].starts_with("Export Date         : "));
        assert_eq!(lines[1], "Version             : 1.2.0 (45)");
        assert_eq!(lines[5], "Region              : unknown");
        assert_eq!(lines[7], "Bundle Display Name : unknown");
    }
}
