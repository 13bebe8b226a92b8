//! [`CredentialProvider`] implementation backed by a value fixed at startup.
//!
//! Credential discovery belongs to the process embedding this service; it
//! hands the result in through `--rpc-auth` / `NODECONF_RPC_AUTH` or the
//! service config file.

use crate::application::settings_service::CredentialProvider;

#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<String>);

impl StaticCredentials {
    pub fn new(auth: Option<String>) -> Self {
        Self(auth)
    }
}

impl CredentialProvider for StaticCredentials {
    fn auth(&self) -> Option<String> {
        self.0.clone()
    }
}
