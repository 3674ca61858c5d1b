//! Settings file loading and defaulting.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use nailgun_core::{ApiUrl, Credentials};
use nailgun_http::ClientConfig;

/// Release used when the settings do not name one.
const DEFAULT_RELEASE_ID: u64 = 2;

/// Port of the Nailgun API on the Fuel master.
const NAILGUN_PORT: u16 = 8000;

/// Port of keystone on the Fuel master.
const KEYSTONE_PORT: u16 = 5000;

/// Environment settings read from the JSON file given on the command line.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub networks: NetworkSettings,
    pub nodes: Vec<NodeSettings>,
    pub env_name: String,
    pub master_ip: String,
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub repos: Value,
    /// Overrides `http://{master_ip}:8000`.
    #[serde(default)]
    pub nailgun_url: Option<String>,
    /// Overrides `http://{master_ip}:5000/v2.0`.
    #[serde(default)]
    pub keystone_url: Option<String>,
    #[serde(default = "default_release_id")]
    pub release_id: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// The `networks` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    /// Fields merged into the cluster's `public` network.
    pub public_network: Map<String, Value>,
    pub floating_ranges: Value,
}

/// One entry of the `nodes` section, matched to a discovered node by MAC.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSettings {
    pub mac: String,
    pub roles: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Interface name to the names of the networks assigned to it.
    #[serde(default)]
    pub interfaces: Option<BTreeMap<String, Vec<String>>>,
    /// Disk name to volume name to volume size.
    #[serde(default)]
    pub disks: Option<BTreeMap<String, BTreeMap<String, u64>>>,
}

fn default_release_id() -> u64 {
    DEFAULT_RELEASE_ID
}

/// Top-level keys that must end up in the settings, with their defaults.
fn defaults() -> Vec<(&'static str, Option<Value>)> {
    vec![
        ("networks", None),
        ("nodes", None),
        ("env_name", None),
        ("master_ip", None),
        ("username", Some(json!("admin"))),
        ("password", Some(json!("admin"))),
        ("tenant_name", Some(json!("admin"))),
        ("repos", Some(default_repos())),
    ]
}

fn repo(name: &str, priority: u32, section: &str, suite: &str, uri: &str) -> Value {
    json!({
        "name": name,
        "priority": priority,
        "section": section,
        "suite": suite,
        "type": "deb",
        "uri": uri,
    })
}

/// Package repositories configured when the settings carry none.
pub fn default_repos() -> Value {
    const UBUNTU: &str = "http://mirrors.mtn5.cci.att.com/mirrors/ubuntu/";
    const MOS: &str = "http://mirrors.mtn5.cci.att.com/mirrors/mirror.fuel-infra.org/mos/ubuntu";
    const MASTER: &str = "http://10.109.25.2:8080//2014.2.2-6.1/ubuntu";

    Value::Array(vec![
        repo("ubuntu-0", 10, "main universe multiverse", "trusty", UBUNTU),
        repo("ubuntu-1", 10, "main universe multiverse", "trusty-updates", UBUNTU),
        repo("ubuntu-2", 10, "main universe multiverse", "trusty-security", UBUNTU),
        repo("mos", 11, "main restricted", "mos6.1", &format!("{}/x86_64", MASTER)),
        repo("mos-updates", 11, "main restricted", "mos6.1-updates", MOS),
        repo("mos-security", 11, "main restricted", "mos6.1-security", MOS),
        repo("mos-holdback", 13, "main restricted", "mos6.1-holdback", MOS),
        repo(
            "Auxiliary",
            12,
            "main restricted",
            "auxiliary",
            &format!("{}/auxiliary", MASTER),
        ),
        repo(
            "AIC",
            13,
            "main",
            "mos6.1",
            "http://mirrors.mtn5.cci.att.com/aic-mos/mos-6.1-dev/",
        ),
    ])
}

impl Settings {
    /// Read and default the settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Parse settings, filling in defaults for absent optional keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("Settings are not valid JSON")?;
        let Value::Object(mut map) = value else {
            bail!("Settings must be a JSON object");
        };

        for (key, default) in defaults() {
            if map.contains_key(key) {
                continue;
            }
            match default {
                Some(value) => {
                    map.insert(key.to_string(), value);
                }
                None => bail!("Key `{}` is mandatory", key),
            }
        }

        serde_json::from_value(Value::Object(map)).context("Invalid settings")
    }

    /// Base URL of the Nailgun API.
    pub fn nailgun_url(&self) -> String {
        self.nailgun_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.master_ip, NAILGUN_PORT))
    }

    /// Base URL of the keystone identity API.
    pub fn keystone_url(&self) -> String {
        self.keystone_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}/v2.0", self.master_ip, KEYSTONE_PORT))
    }

    /// Build the HTTP client configuration.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let base = ApiUrl::new(self.nailgun_url()).context("Invalid Nailgun URL")?;
        let keystone = ApiUrl::new(self.keystone_url()).context("Invalid keystone URL")?;
        let credentials = Credentials::new(&self.username, &self.password, &self.tenant_name);

        let mut config = ClientConfig::new(base, keystone, credentials);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

// Hide password in Debug output; the settings are logged at startup
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("env_name", &self.env_name)
            .field("master_ip", &self.master_ip)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tenant_name", &self.tenant_name)
            .field("nodes", &self.nodes)
            .field("networks", &self.networks)
            .field("release_id", &self.release_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Value {
        json!({
            "env_name": "lab",
            "master_ip": "10.20.0.2",
            "networks": {
                "public_network": {"cidr": "172.16.0.0/24", "gateway": "172.16.0.1"},
                "floating_ranges": [["172.16.0.130", "172.16.0.254"]]
            },
            "nodes": [
                {"mac": "52:54:00:aa:bb:01", "roles": ["controller"], "name": "ctrl-1"},
                {
                    "mac": "52:54:00:aa:bb:02",
                    "roles": ["compute"],
                    "interfaces": {"eth0": ["management"], "eth1": ["public", "private", "storage"]},
                    "disks": {"vda": {"os": 20000, "vm": 40000}}
                }
            ]
        })
    }

    #[test]
    fn fills_defaults() {
        let settings = Settings::from_json(&minimal().to_string()).unwrap();
        assert_eq!(settings.username, "admin");
        assert_eq!(settings.password, "admin");
        assert_eq!(settings.tenant_name, "admin");
        assert_eq!(settings.repos, default_repos());
        assert_eq!(settings.release_id, 2);
        assert_eq!(settings.nodes.len(), 2);
        assert_eq!(settings.nodes[0].name.as_deref(), Some("ctrl-1"));
        assert!(settings.nodes[0].interfaces.is_none());
        assert_eq!(settings.nodes[1].disks.as_ref().unwrap()["vda"]["vm"], 40000);
    }

    #[test]
    fn keeps_given_values() {
        let mut value = minimal();
        value["username"] = json!("fuel");
        value["repos"] = json!([]);
        value["release_id"] = json!(5);
        let settings = Settings::from_json(&value.to_string()).unwrap();
        assert_eq!(settings.username, "fuel");
        assert_eq!(settings.repos, json!([]));
        assert_eq!(settings.release_id, 5);
    }

    #[test]
    fn missing_mandatory_key() {
        for key in ["networks", "nodes", "env_name", "master_ip"] {
            let mut value = minimal();
            value.as_object_mut().unwrap().remove(key);
            let err = Settings::from_json(&value.to_string()).unwrap_err();
            assert_eq!(err.to_string(), format!("Key `{}` is mandatory", key));
        }
    }

    #[test]
    fn rejects_non_object() {
        assert!(Settings::from_json("[]").is_err());
        assert!(Settings::from_json("{not json").is_err());
    }

    #[test]
    fn derives_urls_from_master_ip() {
        let settings = Settings::from_json(&minimal().to_string()).unwrap();
        assert_eq!(settings.nailgun_url(), "http://10.20.0.2:8000");
        assert_eq!(settings.keystone_url(), "http://10.20.0.2:5000/v2.0");

        let config = settings.client_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://10.20.0.2:8000");
        assert_eq!(config.credentials.tenant_name(), "admin");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn url_overrides_and_timeout() {
        let mut value = minimal();
        value["nailgun_url"] = json!("http://127.0.0.1:9000");
        value["keystone_url"] = json!("http://127.0.0.1:9000/v3");
        value["timeout_secs"] = json!(30);
        let settings = Settings::from_json(&value.to_string()).unwrap();

        let config = settings.client_config().unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000");
        assert_eq!(config.keystone_url.as_str(), "http://127.0.0.1:9000/v3");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn debug_hides_password() {
        let mut value = minimal();
        value["password"] = json!("hunter2");
        let settings = Settings::from_json(&value.to_string()).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("lab"));
    }
}
