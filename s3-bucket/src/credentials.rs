pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";

#[derive(Debug, thiserror::Error)]
#[error("error getting '{0}' env var")]
pub struct CredentialsError(String, #[source] std::env::VarError);

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

// keep the secret out of logs and error reports
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Credentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    pub fn from_env() -> Result<Credentials, CredentialsError> {
        Ok(Credentials {
            access_key_id: var(ACCESS_KEY_ID_VAR)?,
            secret_access_key: var(SECRET_ACCESS_KEY_VAR)?,
        })
    }
}

fn var(name: &str) -> Result<String, CredentialsError> {
    std::env::var(name).map_err(|e| CredentialsError(name.to_string(), e))
}
