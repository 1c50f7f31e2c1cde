use std::fmt;

use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;

use crate::cluster::ResolvedKind;
use crate::manifest::ManifestObject;

/// A concrete object from a release manifest, resolved against the cluster.
#[derive(Clone, Debug)]
pub struct ResourceInfo {
    pub gvk: GroupVersionKind,
    pub api_resource: ApiResource,
    /// `None` for cluster-scoped kinds.
    pub namespace: Option<String>,
    pub name: String,
    /// The object as declared in the manifest.
    pub object: DynamicObject,
}

impl ResourceInfo {
    pub fn new(
        declared: ManifestObject,
        resolved: ResolvedKind,
        default_namespace: &str,
    ) -> Self {
        let namespace = if resolved.namespaced {
            Some(
                declared
                    .namespace
                    .unwrap_or_else(|| default_namespace.to_string()),
            )
        } else {
            None
        };
        Self {
            gvk: declared.gvk,
            api_resource: resolved.api_resource,
            namespace,
            name: declared.name,
            object: declared.object,
        }
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn group(&self) -> &str {
        &self.gvk.group
    }

    /// `Kind/namespace/name`, or `Kind/name` when cluster-scoped.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ResourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.gvk.kind, ns, self.name),
            None => write!(f, "{}/{}", self.gvk.kind, self.name),
        }
    }
}

/// Resources of one release in manifest order.
#[derive(Clone, Debug, Default)]
pub struct ResourceSet {
    items: Vec<ResourceInfo>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, info: ResourceInfo) {
        self.items.push(info);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceInfo> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ResourceInfo> for ResourceSet {
    fn from_iter<T: IntoIterator<Item = ResourceInfo>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceInfo;
    type IntoIter = std::slice::Iter<'a, ResourceInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
