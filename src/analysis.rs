use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// Which analysis entry point a job runs.
///
/// The three programs are interchangeable from the driver's point of view:
/// they take the same positional arguments and differ only in which family of
/// diagnostic files they read. Selecting one used to mean commenting lines in
/// and out of the wrapper script; now it's a campaign field (or a CLI
/// override).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum AnalysisKind {
    /// Conventional scalar observations (t, q, ps, pw, ...)
    #[serde(rename = "conv")]
    #[value(name = "conv")]
    ConventionalScalar,
    /// Conventional u/v wind vector observations
    #[serde(rename = "conv_uv")]
    #[value(name = "conv_uv")]
    ConventionalVector,
    /// Satellite radiance observations (ABI, AMSU-A, ATMS, CrIS, ...)
    #[serde(rename = "sate")]
    #[value(name = "sate")]
    SatelliteRadiance,
}

impl AnalysisKind {
    /// File name of the entry point under the campaign's `scripts_dir`.
    pub fn script(&self) -> &'static str {
        match self {
            AnalysisKind::ConventionalScalar => "di_conv.py",
            AnalysisKind::ConventionalVector => "di_conv_uv.py",
            AnalysisKind::SatelliteRadiance => "di_sate.py",
        }
    }

    /// Only the satellite program accepts the optional trailing
    /// detail-saving argument; the conventional ones would mistake it for a
    /// seventh positional they don't have.
    pub fn takes_detail_flag(&self) -> bool {
        matches!(self, AnalysisKind::SatelliteRadiance)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisKind::ConventionalScalar => write!(f, "conv"),
            AnalysisKind::ConventionalVector => write!(f, "conv_uv"),
            AnalysisKind::SatelliteRadiance => write!(f, "sate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_config_names() {
        assert_eq!(AnalysisKind::ConventionalScalar.to_string(), "conv");
        assert_eq!(AnalysisKind::ConventionalVector.to_string(), "conv_uv");
        assert_eq!(AnalysisKind::SatelliteRadiance.to_string(), "sate");
    }

    #[test]
    fn test_script_names() {
        assert_eq!(AnalysisKind::ConventionalScalar.script(), "di_conv.py");
        assert_eq!(AnalysisKind::ConventionalVector.script(), "di_conv_uv.py");
        assert_eq!(AnalysisKind::SatelliteRadiance.script(), "di_sate.py");
    }

    #[test]
    fn test_detail_flag_is_satellite_only() {
        assert!(AnalysisKind::SatelliteRadiance.takes_detail_flag());
        assert!(!AnalysisKind::ConventionalScalar.takes_detail_flag());
        assert!(!AnalysisKind::ConventionalVector.takes_detail_flag());
    }

    #[test]
    fn test_deserialises_from_config_names() {
        let kind: AnalysisKind = serde_json::from_str("\"conv_uv\"").unwrap();
        assert_eq!(kind, AnalysisKind::ConventionalVector);
    }
}
