use s3_bucket::{DEFAULT_ENDPOINT, DEFAULT_REGION};

pub const ENDPOINT_VAR: &str = "S3_ENDPOINT";
pub const REGION_VAR: &str = "AWS_REGION";

/// Where the object store lives. Flags win over the environment, which wins
/// over the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
}

impl StoreConfig {
    pub fn resolve(endpoint: Option<String>, region: Option<String>) -> Self {
        StoreConfig {
            endpoint: setting(endpoint, ENDPOINT_VAR, DEFAULT_ENDPOINT),
            region: setting(region, REGION_VAR, DEFAULT_REGION),
        }
    }
}

fn setting(flag: Option<String>, env_var: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(env_var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EnvGuard(String);

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            std::env::remove_var(&self.0);
        }
    }

    fn set_env(key: &str, value: &str) -> EnvGuard {
        std::env::set_var(key, value);
        EnvGuard(key.to_owned())
    }

    #[test]
    fn should_prefer_flag() {
        let _guard = set_env("TEST_SETTING1", "from-env");

        let value = setting(Some("from-flag".to_owned()), "TEST_SETTING1", "default");

        assert_eq!(value, "from-flag");
    }

    #[test]
    fn should_fall_back_to_env_var() {
        let _guard = set_env("TEST_SETTING2", "from-env");

        let value = setting(None, "TEST_SETTING2", "default");

        assert_eq!(value, "from-env");
    }

    #[test]
    fn should_ignore_empty_env_var() {
        let _guard = set_env("TEST_SETTING3", "");

        let value = setting(None, "TEST_SETTING3", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn should_use_default() {
        let value = setting(None, "TEST_SETTING4_UNSET", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn should_resolve_flags() {
        let config = StoreConfig::resolve(
            Some("http://localhost:9000".to_owned()),
            Some("eu-central-1".to_owned()),
        );

        assert_eq!(
            config,
            StoreConfig {
                endpoint: "http://localhost:9000".to_owned(),
                region: "eu-central-1".to_owned(),
            }
        );
    }
}
