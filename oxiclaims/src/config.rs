//! Deserializable settings for the validator and the blacklist
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    blacklist::{
        Blacklist,
        DEFAULT_KEY,
        DEFAULT_REFRESH_TTL,
        DEFAULT_TTL_BUFFER,
        Storage,
    },
    validation::{
        DEFAULT_REQUIRED_CLAIMS,
        PayloadValidator,
        PayloadValidatorBuilder,
    },
};

/// Settings for [`PayloadValidator`] and [`Blacklist`], typically loaded from
/// the application's configuration file.
///
/// Every field is optional when deserializing; missing fields take the same
/// defaults as the builders.
///
/// ```rust
/// use oxiclaims::{
///     blacklist::MemoryStorage,
///     config::JwtConfig,
/// };
///
/// let config: JwtConfig = serde_json::from_str(
///     r#"{"leeway": 30, "blacklist": {"grace_period": 10}}"#,
/// )
/// .unwrap();
///
/// let validator = config.validator();
/// assert_eq!(validator.leeway(), 30);
///
/// let blacklist = config.blacklist(MemoryStorage::new()).unwrap();
/// assert_eq!(blacklist.grace_period(), 10);
/// assert_eq!(blacklist.key_name(), "jti");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Seconds of tolerance applied to `exp`, `nbf` and `iat`
    pub leeway: u64,
    /// Claims every token must carry
    pub required_claims: Vec<String>,
    /// Whether [`JwtConfig::blacklist`] builds a [`Blacklist`] at all
    pub blacklist_enabled: bool,
    /// Blacklist settings
    pub blacklist: BlacklistConfig,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            leeway: 0,
            required_claims: DEFAULT_REQUIRED_CLAIMS
                .iter()
                .map(|kind| kind.name().to_owned())
                .collect(),
            blacklist_enabled: true,
            blacklist: BlacklistConfig::default(),
        }
    }
}

impl JwtConfig {
    /// [`PayloadValidatorBuilder`] preloaded with these settings, for adding a
    /// clock or custom validators
    #[must_use]
    pub fn validator_builder(&self) -> PayloadValidatorBuilder {
        PayloadValidator::builder()
            .with_required_claims(self.required_claims.iter().map(String::as_str))
            .with_leeway(self.leeway)
    }

    /// [`PayloadValidator`] built from these settings
    #[must_use]
    pub fn validator(&self) -> PayloadValidator {
        self.validator_builder().build()
    }

    /// [`Blacklist`] over `storage` built from these settings, or [`None`] when
    /// the blacklist is disabled
    #[must_use]
    pub fn blacklist<S: Storage>(&self, storage: S) -> Option<Blacklist<S>> {
        if !self.blacklist_enabled {
            tracing::debug!("jwt blacklist disabled by configuration");
            return None;
        }
        let mut blacklist = Blacklist::new(storage);
        blacklist
            .set_grace_period(self.blacklist.grace_period)
            .set_refresh_ttl(self.blacklist.refresh_ttl)
            .set_ttl_buffer(self.blacklist.ttl_buffer)
            .set_key(self.blacklist.key.as_str());
        Some(blacklist)
    }
}

/// Settings for a [`Blacklist`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Seconds a revoked token keeps passing [`Blacklist::has`]
    pub grace_period: u64,
    /// Seconds after `iat` during which a token may be refreshed
    pub refresh_ttl: u64,
    /// Claim whose value keys the store
    pub key: String,
    /// Seconds added to `refresh_ttl` when storing entries
    pub ttl_buffer: u64,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            grace_period: 0,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            key: DEFAULT_KEY.to_owned(),
            ttl_buffer: DEFAULT_TTL_BUFFER,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::{
        blacklist::MemoryStorage,
        config::{
            BlacklistConfig,
            JwtConfig,
        },
    };

    #[test]
    fn empty_config_uses_defaults() {
        let config: JwtConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, JwtConfig::default());
        assert_eq!(
            config.required_claims,
            ["iss", "iat", "exp", "nbf", "sub", "jti"]
        );
        assert!(config.blacklist_enabled);
        assert_eq!(config.blacklist.refresh_ttl, 1_209_600);
        assert_eq!(config.blacklist.ttl_buffer, 60);

        let validator = config.validator();
        assert_eq!(validator.leeway(), 0);
        assert_eq!(validator.required_claims(), config.required_claims);
    }

    #[test]
    fn blacklist_settings_are_applied() {
        let config = JwtConfig {
            blacklist: BlacklistConfig {
                grace_period: 15,
                refresh_ttl: 1_209_660,
                key: "sub".into(),
                ttl_buffer: 0,
            },
            ..JwtConfig::default()
        };
        let blacklist = config.blacklist(MemoryStorage::new()).unwrap();
        assert_eq!(blacklist.grace_period(), 15);
        assert_eq!(blacklist.refresh_ttl(), 1_209_660);
        assert_eq!(blacklist.key_name(), "sub");
        assert_eq!(blacklist.ttl_buffer(), 0);
    }

    #[test]
    fn disabled_blacklist() {
        let config: JwtConfig = serde_json::from_str(r#"{"blacklist_enabled": false}"#).unwrap();
        assert!(config.blacklist(MemoryStorage::new()).is_none());
    }

    #[test]
    fn custom_required_claims() {
        let config: JwtConfig =
            serde_json::from_str(r#"{"required_claims": ["sub"], "leeway": 5}"#).unwrap();
        let validator = config.validator();
        assert_eq!(validator.required_claims(), ["sub"]);
        assert_eq!(validator.leeway(), 5);
    }
}
