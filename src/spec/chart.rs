//! Packaged component release (a chart pulled from a remote repository).
//!
//! Example:
//! release: istio-ingress
//! chart: gateway
//! repository: https://istio-release.storage.googleapis.com/charts
//! namespace: istio-system
//! values: { service: { type: LoadBalancer } }

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartRelease {
    pub release: String,
    pub chart: String,
    pub repository: String,

    /// Chart version; latest when absent.
    #[serde(default)]
    pub version: Option<String>,

    pub namespace: String,

    #[serde(default)]
    pub create_namespace: bool,

    /// Parameter overrides passed to the installer.
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl ChartRelease {
    /// Names of required fields that are blank.
    pub(crate) fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("release", &self.release),
            ("chart", &self.chart),
            ("repository", &self.repository),
            ("namespace", &self.namespace),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}
