use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable parameters of the assignment model. Read-only for the lifetime of a solve.
///
/// Field names are camelCase. The `config` crate lowercases every key it reads, so each
/// multi-word field also answers to its flat lowercase spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    /// Length allowance added when checking chained fibers against a link
    pub slack: i64,
    /// Objective charge for a pair whose core counts differ
    #[serde(alias = "corepenalty")]
    pub core_penalty: i64,
    /// Per-link quality cost above which the report flags the link
    #[serde(alias = "maxcost")]
    pub max_cost: i64,
    #[serde(alias = "maxlengthmulticorefactor")]
    pub max_length_multicore_factor: f64,
    #[serde(alias = "maxlengthfactor")]
    pub max_length_factor: f64,
    #[serde(alias = "maxchain")]
    pub max_chain: i64,
    #[serde(alias = "maxcores")]
    pub max_cores: i64,
    /// Fibers with more cores than this may not be chained together
    #[serde(alias = "maxchaincore")]
    pub max_chain_core: u32,
    #[serde(alias = "mincoupler")]
    pub min_coupler: u32,
    #[serde(alias = "maxcoupler")]
    pub max_coupler: u32,

    /// Weight per assigned fiber; the dominant objective tier
    #[serde(alias = "fiberweight")]
    pub fiber_weight: i64,
    /// Weight per core a fiber carries beyond what its link needs
    #[serde(alias = "coreoverrunweight")]
    pub core_overrun_weight: i64,
    /// Weight per unit of length beyond what a link needs
    #[serde(alias = "lengthweight")]
    pub length_weight: i64,

    /// Added to every link's surveyed length before rounding up
    #[serde(alias = "linklengthmargin")]
    pub link_length_margin: f64,
    /// Wall-clock budget for the search, 0 disables it
    #[serde(alias = "timelimitsecs")]
    pub time_limit_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            slack: 5,
            core_penalty: 10_000,
            max_cost: 4_000,
            max_length_multicore_factor: 1.8,
            max_length_factor: 5.0,
            max_chain: 2,
            max_cores: 24,
            max_chain_core: 2,
            min_coupler: 2,
            max_coupler: 4,
            fiber_weight: 1_000_000,
            core_overrun_weight: 100,
            length_weight: 1,
            link_length_margin: 20.0,
            time_limit_secs: 60,
        }
    }
}

impl SolverConfig {
    /// Load configuration from defaults, an optional file and `FIBER_*` environment variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_prefix(path, "FIBER")
    }

    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&SolverConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // FIBER_MAX_CHAIN=3 flattens to maxchain, the key the defaults and files land on
        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .convert_case(config::Case::Flat)
                .try_parsing(true),
        );

        let solver_config: SolverConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| match path {
                Some(p) => format!("failed to load configuration from {}", p.display()),
                None => "failed to load configuration".to_string(),
            })?;

        solver_config.validate()?;
        Ok(solver_config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_chain < 1 {
            return Err(anyhow!("maxChain must be at least 1, got {}", self.max_chain));
        }
        if self.min_coupler < 1 {
            return Err(anyhow!("minCoupler must be at least 1, got {}", self.min_coupler));
        }
        if self.max_coupler < self.min_coupler {
            return Err(anyhow!(
                "maxCoupler ({}) must not be below minCoupler ({})",
                self.max_coupler,
                self.min_coupler
            ));
        }
        if self.max_length_factor < 1.0 || self.max_length_multicore_factor < 1.0 {
            return Err(anyhow!("length factors must be at least 1.0"));
        }
        if self.slack < 0 || self.max_cores < 0 {
            return Err(anyhow!("slack and maxCores must not be negative"));
        }
        Ok(())
    }

    /// Longest total fiber length accepted on a multicore link
    pub fn multicore_length_cap(&self, link_length: u32) -> i64 {
        (link_length as f64 * self.max_length_multicore_factor).floor() as i64
    }

    /// Longest chained length (slack included) accepted on a non-multicore link
    pub fn chain_length_cap(&self, link_length: u32) -> i64 {
        (link_length as f64 * self.max_length_factor).floor() as i64
    }

    pub fn time_limit(&self) -> Option<Duration> {
        match self.time_limit_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.slack, 5);
        assert_eq!(config.core_penalty, 10_000);
        assert_eq!(config.max_chain, 2);
        assert_eq!(config.max_cores, 24);
        assert_eq!(config.min_coupler, 2);
        assert_eq!(config.max_coupler, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_length_caps_round_down() {
        let config = SolverConfig::default();
        assert_eq!(config.multicore_length_cap(100), 180);
        assert_eq!(config.multicore_length_cap(101), 181);
        assert_eq!(config.chain_length_cap(50), 250);
    }

    #[test]
    fn test_file_overrides_keep_unspecified_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"maxChain": 3, "maxLengthFactor": 2.5}}"#).unwrap();

        let config =
            SolverConfig::load_with_prefix(Some(file.path()), "FIBER_TEST_UNSET").unwrap();

        assert_eq!(config.max_chain, 3);
        assert_eq!(config.max_length_factor, 2.5);
        assert_eq!(config.slack, 5);
        assert_eq!(config.core_penalty, 10_000);
    }

    #[test]
    fn test_toml_overrides_multi_word_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "maxChain = 3").unwrap();
        writeln!(file, "corePenalty = 7").unwrap();
        writeln!(file, "slack = 9").unwrap();
        writeln!(file, "linkLengthMargin = 12.5").unwrap();

        let config =
            SolverConfig::load_with_prefix(Some(file.path()), "FIBER_TEST_UNSET").unwrap();

        assert_eq!(config.max_chain, 3);
        assert_eq!(config.core_penalty, 7);
        assert_eq!(config.slack, 9);
        assert_eq!(config.link_length_margin, 12.5);
        assert_eq!(config.max_cores, 24);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"maxChain": 3, "minCoupler": 1}}"#).unwrap();

        std::env::set_var("FIBER_ENV_CASE_MAX_CHAIN", "4");
        std::env::set_var("FIBER_ENV_CASE_CORE_PENALTY", "7");
        std::env::set_var("FIBER_ENV_CASE_MAX_LENGTH_FACTOR", "2.5");

        let config = SolverConfig::load_with_prefix(Some(file.path()), "FIBER_ENV_CASE").unwrap();

        assert_eq!(config.max_chain, 4);
        assert_eq!(config.core_penalty, 7);
        assert_eq!(config.max_length_factor, 2.5);
        assert_eq!(config.min_coupler, 1);
        assert_eq!(config.slack, 5);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        std::env::set_var("FIBER_BAD_CASE_MAX_CHAIN", "0");
        assert!(SolverConfig::load_with_prefix(None, "FIBER_BAD_CASE").is_err());
    }

    #[test]
    fn test_invalid_coupler_range_rejected() {
        let config = SolverConfig {
            min_coupler: 4,
            max_coupler: 2,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_time_limit_disables_budget() {
        let config = SolverConfig {
            time_limit_secs: 0,
            ..SolverConfig::default()
        };
        assert_eq!(config.time_limit(), None);
        assert_eq!(
            SolverConfig::default().time_limit(),
            Some(Duration::from_secs(60))
        );
    }
}
