use serde::{Deserialize, Serialize};

/// Configuration for the wide-column backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WideColumnConfig {
    /// Cluster contact points
    /// Default: ["127.0.0.1"]
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Keyspace holding the entities table
    /// Default: "demo"
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
}

fn default_hosts() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}

fn default_keyspace() -> String {
    "demo".to_string()
}

impl Default for WideColumnConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            keyspace: default_keyspace(),
        }
    }
}

impl WideColumnConfig {
    pub fn with_hosts(mut self, hosts: Vec<String>) -> Self {
        self.hosts = hosts;
        self
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }
}
