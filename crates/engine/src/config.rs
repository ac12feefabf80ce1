//! Layered engine configuration
//!
//! Values are merged in this order, later layers winning:
//!
//! 1. built-in defaults ([`EngineConfig::default`])
//! 2. an optional TOML file
//! 3. `TAGLINE_`-prefixed environment variables, `__` separating nested keys
//!    (`TAGLINE_MIGRATION__MAX_CONCURRENT_INSTANCES=4`)
//!
//! `TAGLINE_LOG` and `TAGLINE_LOG_FORMAT` belong to [`tagline_log`] and are
//! not read as configuration keys.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tagline_core::TenantId;
use tagline_deploy::DeployOptions;
use tagline_migration::DriverOptions;

use crate::error::{EngineError, EngineResult};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TAGLINE_";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Startup deployment settings.
    pub deployment: DeploymentConfig,
    /// Exclusive lock settings.
    pub locking: LockingConfig,
    /// Auto-migration settings.
    pub migration: MigrationConfig,
    /// Log subscriber settings.
    pub log: tagline_log::Config,
}

/// `[deployment]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Name given to every deployment unit.
    pub name: String,
    /// Deploy only resources whose content changed.
    pub deploy_changed_only: bool,
    /// Owning tenant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            name: "tagline".to_owned(),
            deploy_changed_only: true,
            tenant_id: None,
        }
    }
}

/// `[locking]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockingConfig {
    /// Serialize deployments and migration passes behind the store's
    /// exclusive lock.
    pub use_exclusive_lock: bool,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            use_exclusive_lock: true,
        }
    }
}

/// `[migration]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Run one auto-migration pass after the startup deployment.
    pub auto_migrate_on_start: bool,
    /// Instance chains of one key that may run at once.
    pub max_concurrent_instances: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            auto_migrate_on_start: true,
            max_concurrent_instances: 1,
        }
    }
}

impl EngineConfig {
    /// The figment behind [`EngineConfig::load`], for callers that add
    /// their own layers.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["log", "log_format"])
                .split("__"),
        )
    }

    /// Load defaults, then `file` when given, then the environment.
    ///
    /// A missing file is treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when a layer cannot be parsed or a
    /// value has the wrong type, and [`EngineError::InvalidConfig`] when a
    /// value is out of range.
    pub fn load(file: Option<&Path>) -> EngineResult<Self> {
        Self::from_figment(&Self::figment(file))
    }

    /// Extract and validate a configuration from any figment.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::load`].
    pub fn from_figment(figment: &Figment) -> EngineResult<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for an empty deployment name
    /// or a concurrency of zero.
    pub fn validate(&self) -> EngineResult<()> {
        if self.deployment.name.trim().is_empty() {
            return Err(EngineError::InvalidConfig {
                key: "deployment.name",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.migration.max_concurrent_instances == 0 {
            return Err(EngineError::InvalidConfig {
                key: "migration.max_concurrent_instances",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Options for the startup deployment.
    #[must_use]
    pub fn deploy_options(&self) -> DeployOptions {
        DeployOptions {
            name: self.deployment.name.clone(),
            tenant_id: self.deployment.tenant_id,
            deploy_changed_only: self.deployment.deploy_changed_only,
            use_exclusive_lock: self.locking.use_exclusive_lock,
        }
    }

    /// Options for the auto-migration driver.
    #[must_use]
    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            use_exclusive_lock: self.locking.use_exclusive_lock,
            max_concurrent_instances: self.migration.max_concurrent_instances,
        }
    }

    /// Install the global log subscriber described by the `log` section.
    ///
    /// # Errors
    ///
    /// See [`tagline_log::init_with`].
    pub fn init_logging(&self) -> EngineResult<()> {
        tagline_log::init_with(self.log.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn defaults_without_any_layer() {
        Jail::expect_with(|_| {
            let config = EngineConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, EngineConfig::default());
            assert!(config.deployment.deploy_changed_only);
            assert!(config.locking.use_exclusive_lock);
            assert!(config.migration.auto_migrate_on_start);
            assert_eq!(config.migration.max_concurrent_instances, 1);
            Ok(())
        });
    }

    #[test]
    fn file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tagline.toml",
                r#"
                [deployment]
                name = "billing"
                deploy_changed_only = false

                [migration]
                auto_migrate_on_start = false

                [log]
                level = "debug"
                format = "json"
                "#,
            )?;
            let config =
                EngineConfig::load(Some(Path::new("tagline.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.deployment.name, "billing");
            assert!(!config.deployment.deploy_changed_only);
            assert!(!config.migration.auto_migrate_on_start);
            assert_eq!(config.log.level, "debug");
            assert_eq!(config.log.format, tagline_log::Format::Json);
            assert!(config.locking.use_exclusive_lock);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tagline.toml",
                "[migration]\nmax_concurrent_instances = 2\n",
            )?;
            jail.set_env("TAGLINE_MIGRATION__MAX_CONCURRENT_INSTANCES", "4");
            jail.set_env("TAGLINE_LOCKING__USE_EXCLUSIVE_LOCK", "false");
            let config =
                EngineConfig::load(Some(Path::new("tagline.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.migration.max_concurrent_instances, 4);
            assert!(!config.locking.use_exclusive_lock);
            Ok(())
        });
    }

    #[test]
    fn log_filter_variables_are_not_config_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("TAGLINE_LOG", "tagline_migration=debug");
            jail.set_env("TAGLINE_LOG_FORMAT", "json");
            let config = EngineConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.log, tagline_log::Config::default());
            Ok(())
        });
    }

    #[test]
    fn tenant_from_environment() {
        Jail::expect_with(|jail| {
            jail.set_env(
                "TAGLINE_DEPLOYMENT__TENANT_ID",
                "550e8400-e29b-41d4-a716-446655440000",
            );
            let config = EngineConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(
                config.deploy_options().tenant_id.map(|t| t.to_string()),
                Some("550e8400-e29b-41d4-a716-446655440000".to_owned())
            );
            Ok(())
        });
    }

    #[test]
    fn wrong_type_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("tagline.toml", "[migration]\nmax_concurrent_instances = \"many\"\n")?;
            let err = EngineConfig::load(Some(Path::new("tagline.toml"))).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "got {err:?}");
            Ok(())
        });
    }

    #[rstest]
    #[case::empty_name("[deployment]\nname = \"  \"\n", "deployment.name")]
    #[case::zero_workers(
        "[migration]\nmax_concurrent_instances = 0\n",
        "migration.max_concurrent_instances"
    )]
    fn out_of_range_values_are_rejected(#[case] toml: &str, #[case] expected: &str) {
        Jail::expect_with(|jail| {
            jail.create_file("tagline.toml", toml)?;
            let err = EngineConfig::load(Some(Path::new("tagline.toml"))).unwrap_err();
            match err {
                EngineError::InvalidConfig { key, .. } => assert_eq!(key, expected),
                other => panic!("unexpected error: {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn options_follow_sections() {
        let config = EngineConfig {
            locking: LockingConfig {
                use_exclusive_lock: false,
            },
            migration: MigrationConfig {
                auto_migrate_on_start: true,
                max_concurrent_instances: 3,
            },
            ..EngineConfig::default()
        };
        let deploy = config.deploy_options();
        assert_eq!(deploy.name, "tagline");
        assert!(!deploy.use_exclusive_lock);
        let driver = config.driver_options();
        assert!(!driver.use_exclusive_lock);
        assert_eq!(driver.max_concurrent_instances, 3);
    }

    #[test]
    fn invalid_log_level_fails_before_installing() {
        let config = EngineConfig {
            log: tagline_log::Config {
                level: "tagline=loud".to_owned(),
                ..tagline_log::Config::test()
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.init_logging(),
            Err(EngineError::Log(tagline_log::LogError::Filter { .. }))
        ));
    }
}
