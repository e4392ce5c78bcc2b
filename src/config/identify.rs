//! Auto-identify block configuration.

use super::defaults::default_identify_service;
use serde::Deserialize;

/// Identify to a services bot once an account's connection is welcomed.
#[derive(Clone, Deserialize)]
pub struct IdentifyBlock {
    /// Account this block applies to, e.g. `nick@irc.libera.chat`.
    pub account: String,
    /// Services nick to message (default: NickServ).
    #[serde(default = "default_identify_service")]
    pub service: String,
    pub password: String,
}

impl IdentifyBlock {
    /// The line sent on `001`.
    pub fn identify_line(&self) -> String {
        format!("PRIVMSG {} :IDENTIFY {}", self.service, self.password)
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for IdentifyBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifyBlock")
            .field("account", &self.account)
            .field("service", &self.service)
            .field("password", &"<redacted>")
            .finish()
    }
}
