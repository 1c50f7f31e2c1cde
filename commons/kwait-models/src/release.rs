use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, versioned deployment of a set of Kubernetes resources.
///
/// `manifest` holds the literal multi-document YAML that was applied for
/// this version. Releases are owned by the storage layer; the waiter only
/// ever reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    pub version: u32,
    /// Namespace the release was installed into. Namespaced objects in the
    /// manifest without an explicit namespace land here.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub manifest: String,
    #[serde(default)]
    pub status: ReleaseStatus,
    #[serde(default)]
    pub last_deployed: Option<DateTime<Utc>>,
}

impl Release {
    pub fn new(
        name: impl Into<String>,
        version: u32,
        manifest: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            namespace: None,
            manifest: manifest.into(),
            status: ReleaseStatus::Deployed,
            last_deployed: Some(Utc::now()),
        }
    }

    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = Some(ns.into());
        self
    }

    pub fn with_status(mut self, status: ReleaseStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    Deployed,
    Failed,
    PendingInstall,
    PendingUpgrade,
    Superseded,
    Uninstalled,
    #[default]
    Unknown,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Deployed => "deployed",
            ReleaseStatus::Failed => "failed",
            ReleaseStatus::PendingInstall => "pending-install",
            ReleaseStatus::PendingUpgrade => "pending-upgrade",
            ReleaseStatus::Superseded => "superseded",
            ReleaseStatus::Uninstalled => "uninstalled",
            ReleaseStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
