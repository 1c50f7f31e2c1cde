use crate::error::StorageError;
use crate::traits::*;
use async_trait::async_trait;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use kwait_models::Release;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

pub const OWNER_LABEL: &str = "owner";
pub const OWNER_VALUE: &str = "kwait";
pub const NAME_LABEL: &str = "name";
pub const VERSION_LABEL: &str = "version";
pub const STATUS_LABEL: &str = "status";
pub const RELEASE_KEY: &str = "release";
pub const SECRET_TYPE: &str = "kwait.io/release.v1";

const FIELD_MANAGER: &str = "kwait";

/// Releases stored as one Secret per version in a single namespace.
///
/// Secrets are named `kwait.release.v1.<name>.v<version>` and carry the
/// JSON-encoded release under the `release` data key.
#[derive(Clone)]
pub struct SecretReleaseStore {
    api: Api<Secret>,
    namespace: String,
}

impl SecretReleaseStore {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }
}

pub fn secret_name(name: &str, version: u32) -> String {
    format!("kwait.release.v1.{}.v{}", name, version)
}

fn release_selector(name: &str) -> String {
    format!("{}={},{}={}", OWNER_LABEL, OWNER_VALUE, NAME_LABEL, name)
}

/// Render a release into the Secret that stores it.
pub fn encode_secret(
    release: &Release,
    namespace: &str,
) -> StorageResult<Secret> {
    let payload = serde_json::to_vec(release)?;
    let labels = BTreeMap::from([
        (OWNER_LABEL.to_string(), OWNER_VALUE.to_string()),
        (NAME_LABEL.to_string(), release.name.clone()),
        (VERSION_LABEL.to_string(), release.version.to_string()),
        (STATUS_LABEL.to_string(), release.status.to_string()),
    ]);
    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(secret_name(&release.name, release.version)),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        type_: Some(SECRET_TYPE.to_string()),
        data: Some(BTreeMap::from([(
            RELEASE_KEY.to_string(),
            ByteString(payload),
        )])),
        ..Default::default()
    })
}

/// Recover the release stored in a Secret.
pub fn decode_secret(secret: &Secret) -> StorageResult<Release> {
    let key = secret.name_any();
    let raw = secret
        .data
        .as_ref()
        .and_then(|d| d.get(RELEASE_KEY))
        .ok_or_else(|| StorageError::Corrupt {
            key: key.clone(),
            reason: format!("missing data key '{}'", RELEASE_KEY),
        })?;
    serde_json::from_slice(&raw.0).map_err(|e| StorageError::Corrupt {
        key,
        reason: e.to_string(),
    })
}

#[async_trait]
impl StorageHealth for SecretReleaseStore {
    async fn health(&self) -> StorageResult<()> {
        self.api.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }
}

#[async_trait]
impl ReleaseStore for SecretReleaseStore {
    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace))]
    async fn last(&self, name: &str) -> StorageResult<Release> {
        let records = self.history(name).await?;
        latest(records).ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    #[instrument(level = "debug", skip(self), fields(ns = %self.namespace))]
    async fn history(&self, name: &str) -> StorageResult<Vec<Release>> {
        let lp = ListParams::default().labels(&release_selector(name));
        let list = self.api.list(&lp).await?;
        debug!(count = list.items.len(), "history: listed release secrets");
        let mut out = Vec::with_capacity(list.items.len());
        for s in &list.items {
            match decode_secret(s) {
                Ok(r) if r.name == name => out.push(r),
                Ok(r) => {
                    warn!(
                        secret = %s.name_any(),
                        found = %r.name,
                        "history: label/name mismatch; skipping"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        out.sort_by_key(|r| r.version);
        Ok(out)
    }

    #[instrument(
        level = "debug",
        skip(self, release),
        fields(
            ns = %self.namespace,
            name = %release.name,
            version = release.version
        )
    )]
    async fn store(&self, release: &Release) -> StorageResult<()> {
        let secret = encode_secret(release, &self.namespace)?;
        let secret_name = secret_name(&release.name, release.version);
        let pp = PatchParams::apply(FIELD_MANAGER).force();
        self.api
            .patch(&secret_name, &pp, &Patch::Apply(&secret))
            .await?;
        Ok(())
    }
}
