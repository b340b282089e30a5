use serde::Deserialize;

/// Default cluster address when none is configured.
pub const DEFAULT_HOST: &str = "localhost:4300";

/// Connection-level configuration handed to a driver implementation.
///
/// This crate never opens connections itself; the config only carries the
/// address list and the optional schema that generated statements qualify
/// table names with.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub schema: Option<String>,
}

fn default_hosts() -> Vec<String> {
    vec![DEFAULT_HOST.to_string()]
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            schema: None,
        }
    }
}
