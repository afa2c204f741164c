//! Config module.
//! Holds the parameters of one fix-up run: which identifier fragment to
//! disambiguate, which attribute exempts a name, and the standalone entry to
//! insert. Defaults reproduce the e0fb fix for `board-2.json`.
//! Layering: built-in defaults, then an optional JSON config file (serde), then
//! CLI flags.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FixError;
use crate::identifier::Attribute;
use crate::io::{fixed_path, same_file};
use crate::rewrite::{FixRule, Matcher};

pub const DEFAULT_INPUT: &str = "board-2.json";
pub const DEFAULT_TARGET: &str = "subsystem-device=e0fb";
pub const DEFAULT_QUALIFIER: &str = "variant=QC_5mm";
pub const DEFAULT_PAYLOAD: &str = "bus=pci,vendor=17cb,device=1107,subsystem-vendor=105b,subsystem-device=e0dc,qmi-chip-id=2,qmi-board-id=255,variant=QC_5mm.bin";
pub const DEFAULT_ENTRY_NAME: &str = "bus=pci,vendor=17cb,device=1107,subsystem-vendor=105b,subsystem-device=e0fb,qmi-chip-id=2,qmi-board-id=255";

/// How target and qualifier fragments are compared against a name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain text containment (default)
    #[default]
    Substring,
    /// Exact `key=value` attribute comparison
    Attribute,
}

impl MatchMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "substring" => Some(MatchMode::Substring),
            "attribute" => Some(MatchMode::Attribute),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Substring => write!(f, "substring"),
            MatchMode::Attribute => write!(f, "attribute"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixConfig {
    pub input_path: PathBuf,
    /// Defaults to the input path with `-fixed` before the extension
    pub output_path: Option<PathBuf>,
    pub target_substring: String,
    pub qualifier_substring: String,
    pub replacement_payload: String,
    /// Name of the standalone group inserted at the top of `board`
    pub entry_name: String,
    pub match_mode: MatchMode,
    pub report_path: Option<PathBuf>,
}

impl Default for FixConfig {
    fn default() -> Self {
        FixConfig {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: None,
            target_substring: DEFAULT_TARGET.to_string(),
            qualifier_substring: DEFAULT_QUALIFIER.to_string(),
            replacement_payload: DEFAULT_PAYLOAD.to_string(),
            entry_name: DEFAULT_ENTRY_NAME.to_string(),
            match_mode: MatchMode::default(),
            report_path: None,
        }
    }
}

/// Values given on the command line; `None` leaves the config value alone.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub target_substring: Option<String>,
    pub qualifier_substring: Option<String>,
    pub replacement_payload: Option<String>,
    pub entry_name: Option<String>,
    pub match_mode: Option<MatchMode>,
    pub report_path: Option<PathBuf>,
}

impl FixConfig {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, FixError> {
        let text = fs::read_to_string(path).map_err(|source| FixError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| FixError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.input_path {
            self.input_path = v;
        }
        if let Some(v) = overrides.output_path {
            self.output_path = Some(v);
        }
        if let Some(v) = overrides.target_substring {
            self.target_substring = v;
        }
        if let Some(v) = overrides.qualifier_substring {
            self.qualifier_substring = v;
        }
        if let Some(v) = overrides.replacement_payload {
            self.replacement_payload = v;
        }
        if let Some(v) = overrides.entry_name {
            self.entry_name = v;
        }
        if let Some(v) = overrides.match_mode {
            self.match_mode = v;
        }
        if let Some(v) = overrides.report_path {
            self.report_path = Some(v);
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| fixed_path(&self.input_path))
    }

    /// Validates the config and builds the rewrite rule from it.
    pub fn rule(&self) -> Result<FixRule, FixError> {
        if self.target_substring.is_empty() {
            return Err(FixError::Config("target must not be empty".into()));
        }
        if self.qualifier_substring.is_empty() {
            return Err(FixError::Config("qualifier must not be empty".into()));
        }
        if self.replacement_payload.is_empty() {
            return Err(FixError::Config("replacement payload must not be empty".into()));
        }
        let output = self.output_path();
        if same_file(&output, &self.input_path) {
            return Err(FixError::Config(format!(
                "output path {} would overwrite the input {}",
                output.display(),
                self.input_path.display()
            )));
        }
        if let Some(report) = &self.report_path {
            if same_file(report, &self.input_path) || same_file(report, &output) {
                return Err(FixError::Config(format!(
                    "report path {} would overwrite the input or the fixed board file",
                    report.display()
                )));
            }
        }

        let matcher = match self.match_mode {
            MatchMode::Substring => Matcher::Substring {
                target: self.target_substring.clone(),
                qualifier: self.qualifier_substring.clone(),
            },
            MatchMode::Attribute => Matcher::Attribute {
                target: parse_fragment("target", &self.target_substring)?,
                qualifier: parse_fragment("qualifier", &self.qualifier_substring)?,
            },
        };

        // The standalone entry must itself be a name the rule would otherwise remove
        if !matcher.is_target(&self.entry_name) {
            return Err(FixError::Config(format!(
                "entry name {:?} does not match target {:?}",
                self.entry_name, self.target_substring
            )));
        }
        if matcher.is_qualified(&self.entry_name) {
            return Err(FixError::Config(format!(
                "entry name {:?} already carries qualifier {:?}",
                self.entry_name, self.qualifier_substring
            )));
        }

        Ok(FixRule {
            matcher,
            entry_name: self.entry_name.clone(),
            payload: self.replacement_payload.clone(),
        })
    }
}

fn parse_fragment(what: &str, fragment: &str) -> Result<Attribute, FixError> {
    Attribute::parse(fragment).ok_or_else(|| {
        FixError::Config(format!(
            "{} {:?} is not a key=value attribute (required by attribute match mode)",
            what, fragment
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults_build_rule() {
        let config = FixConfig::default();
        assert_eq!(config.output_path(), PathBuf::from("board-2-fixed.json"));
        let rule = config.rule().unwrap();
        assert_eq!(rule.entry_name, DEFAULT_ENTRY_NAME);
        assert_eq!(rule.payload, DEFAULT_PAYLOAD);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"input_path": "other/board-2.json", "match_mode": "attribute"}}"#
        )
        .unwrap();

        let config = FixConfig::load(file.path()).unwrap();
        assert_eq!(config.input_path, PathBuf::from("other/board-2.json"));
        assert_eq!(config.match_mode, MatchMode::Attribute);
        assert_eq!(config.target_substring, DEFAULT_TARGET);
        assert_eq!(config.output_path(), PathBuf::from("other/board-2-fixed.json"));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"targett": "x"}}"#).unwrap();
        assert!(matches!(
            FixConfig::load(file.path()),
            Err(FixError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let mut config = FixConfig {
            target_substring: "from-file".into(),
            ..FixConfig::default()
        };
        config.apply(ConfigOverrides {
            target_substring: Some("subsystem-device=aaaa".into()),
            output_path: Some(PathBuf::from("out.json")),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.target_substring, "subsystem-device=aaaa");
        assert_eq!(config.output_path(), PathBuf::from("out.json"));
        assert_eq!(config.qualifier_substring, DEFAULT_QUALIFIER);
    }

    #[test]
    fn test_rule_rejects_output_equal_to_input() {
        let config = FixConfig {
            output_path: Some(PathBuf::from(DEFAULT_INPUT)),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));
    }

    #[test]
    fn test_rule_rejects_aliased_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("board-2.json");
        fs::write(&input, "[]").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let config = FixConfig {
            input_path: input.clone(),
            output_path: Some(dir.path().join("sub").join("..").join("board-2.json")),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));

        let config = FixConfig {
            input_path: input,
            output_path: Some(dir.path().join(".").join("board-2.json")),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));
    }

    #[test]
    fn test_rule_rejects_report_over_input_or_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("board-2.json");
        fs::write(&input, "[]").unwrap();

        for report in [
            dir.path().join("board-2-fixed.json"),
            dir.path().join(".").join("board-2.json"),
        ] {
            let config = FixConfig {
                input_path: input.clone(),
                report_path: Some(report),
                ..FixConfig::default()
            };
            assert!(matches!(config.rule(), Err(FixError::Config(_))));
        }

        let config = FixConfig {
            input_path: input,
            report_path: Some(dir.path().join("report.json")),
            ..FixConfig::default()
        };
        assert!(config.rule().is_ok());
    }

    #[test]
    fn test_rule_rejects_inconsistent_entry_name() {
        let config = FixConfig {
            entry_name: "bus=pci,subsystem-device=e0dc".into(),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));

        let config = FixConfig {
            entry_name: "bus=pci,subsystem-device=e0fb,variant=QC_5mm".into(),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));
    }

    #[test]
    fn test_rule_rejects_empty_fragments() {
        let config = FixConfig {
            qualifier_substring: String::new(),
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));
    }

    #[test]
    fn test_attribute_mode_needs_key_value_fragments() {
        let config = FixConfig {
            target_substring: "e0fb".into(),
            match_mode: MatchMode::Attribute,
            ..FixConfig::default()
        };
        assert!(matches!(config.rule(), Err(FixError::Config(_))));
    }

    #[test]
    fn test_match_mode_names() {
        assert_eq!(MatchMode::from_name("attribute"), Some(MatchMode::Attribute));
        assert_eq!(MatchMode::from_name("regex"), None);
        assert_eq!(format!("{}", MatchMode::default()), "substring");
    }
}
