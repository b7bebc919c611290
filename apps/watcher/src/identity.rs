use async_trait::async_trait;
use ffpinvest_alerts::{IdentityProvider, SessionError};

/// Reads the signed-in user's subject id from `FFPINVEST_USER_SUB`.
pub struct EnvIdentity {
    var: &'static str,
}

impl EnvIdentity {
    pub const VAR: &'static str = "FFPINVEST_USER_SUB";

    pub fn new() -> Self {
        Self { var: Self::VAR }
    }
}

impl Default for EnvIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for EnvIdentity {
    async fn current_subject(&self) -> Result<Option<String>, SessionError> {
        match std::env::var(self.var) {
            Ok(sub) => Ok(Some(sub)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(SessionError::Provider(format!("{}: {}", self.var, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unset_variable_is_no_user() {
        let identity = EnvIdentity {
            var: "FFPINVEST_TEST_UNSET_SUBJECT",
        };
        assert_eq!(identity.current_subject().await.unwrap(), None);
    }
}
