//! Extraction options.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// User-facing options controlling an extraction run.
///
/// Options can be written in TOML:
///
/// ```
/// # use netex::opts::ExtractOpts;
/// let opts = ExtractOpts::from_toml_str(r#"
///     flatten = ["^fill_.*"]
///     recursive = true
///     alignment = 1
/// "#).unwrap();
/// assert!(opts.recursive);
/// assert_eq!(opts.width_tolerance, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOpts {
    /// Regular expressions matched against sub-cell names.
    ///
    /// Instances of matching cells are flattened into their parent.
    pub flatten: Vec<String>,
    /// Flatten cells whose names end in a parametric-cell suffix (`$<digits>`).
    pub flatten_pcells: bool,
    /// Extract kept sub-cells as well. Otherwise they are copied unchanged.
    pub recursive: bool,
    /// Copy leftover routable geometry as pure-layer shapes instead of
    /// converting it into wires.
    pub preserve_layers: bool,
    /// Accept a multi-cut contact whose layers fit even when its derived cut
    /// layout does not coincide with the drawn cuts.
    pub approximate_cuts: bool,
    /// Grid, in external units, to which wire endpoints are snapped when possible.
    pub alignment: Option<i64>,
    /// Maximum relative width difference between centerlines accepted in one pass.
    pub width_tolerance: f64,
    /// Upper bound on the number of centerline decomposition passes per region.
    pub max_centerline_passes: usize,
}

impl Default for ExtractOpts {
    fn default() -> Self {
        Self {
            flatten: Vec::new(),
            flatten_pcells: false,
            recursive: false,
            preserve_layers: false,
            approximate_cuts: false,
            alignment: None,
            width_tolerance: 0.2,
            max_centerline_passes: 32,
        }
    }
}

impl ExtractOpts {
    /// Parses options from a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Compiles the flatten patterns into a [`FlattenRule`].
    pub fn flatten_rule(&self) -> Result<FlattenRule> {
        let patterns = self
            .flatten
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let pcell = self
            .flatten_pcells
            .then(|| Regex::new(r"\$\d+$"))
            .transpose()?;
        Ok(FlattenRule { patterns, pcell })
    }
}

/// Decides whether an instance of a cell is flattened into its parent.
#[derive(Debug, Clone)]
pub struct FlattenRule {
    patterns: Vec<Regex>,
    pcell: Option<Regex>,
}

impl FlattenRule {
    /// Returns `true` if instances of the cell named `name` should be flattened.
    pub fn should_flatten(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(name))
            || self.pcell.as_ref().is_some_and(|p| p.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let opts = ExtractOpts::from_toml_str("preserve_layers = true").unwrap();
        assert!(opts.preserve_layers);
        assert!(!opts.approximate_cuts);
        assert_eq!(opts.max_centerline_passes, 32);
        assert_eq!(opts.alignment, None);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ExtractOpts::from_toml_str("recursive = 3").unwrap_err();
        assert!(matches!(err, crate::error::ExtractError::Config(_)));
    }

    #[test]
    fn flatten_rule_matches_patterns_and_pcells() {
        let opts = ExtractOpts {
            flatten: vec!["^tap".into()],
            flatten_pcells: true,
            ..Default::default()
        };
        let rule = opts.flatten_rule().unwrap();
        assert!(rule.should_flatten("tap_n"));
        assert!(rule.should_flatten("mos$12"));
        assert!(!rule.should_flatten("inv"));
        assert!(!rule.should_flatten("mos$"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let opts = ExtractOpts {
            flatten: vec!["(".into()],
            ..Default::default()
        };
        assert!(matches!(
            opts.flatten_rule(),
            Err(crate::error::ExtractError::Pattern(_))
        ));
    }
}
