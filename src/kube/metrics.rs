use std::{borrow::Cow, collections::BTreeMap};

use k8s_openapi::{apimachinery::pkg::api::resource::Quantity, NamespaceResourceScope};
use kube::core::ObjectMeta;
use serde::Deserialize;

/// `metrics.k8s.io/v1beta1` PodMetrics, served by metrics-server.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PodMetricsResource {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: BTreeMap<String, Quantity>,
}

impl kube::Resource for PodMetricsResource {
    type DynamicType = ();
    type Scope = NamespaceResourceScope;

    fn kind(_: &Self::DynamicType) -> Cow<'_, str> {
        "PodMetrics".into()
    }

    fn group(_: &Self::DynamicType) -> Cow<'_, str> {
        "metrics.k8s.io".into()
    }

    fn version(_: &Self::DynamicType) -> Cow<'_, str> {
        "v1beta1".into()
    }

    fn plural(_: &Self::DynamicType) -> Cow<'_, str> {
        "pods".into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// Usage of a pod summed over its containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PodUsage {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
}

/// Pod name to usage, for one namespace.
pub type PodMetrics = BTreeMap<String, PodUsage>;

impl PodUsage {
    pub fn from_resource(metrics: &PodMetricsResource) -> Self {
        metrics
            .containers
            .iter()
            .fold(Self::default(), |total, container| {
                let value = |key: &str| {
                    container
                        .usage
                        .get(key)
                        .and_then(|quantity| parse_quantity(&quantity.0))
                        .unwrap_or_default()
                };

                Self {
                    cpu_millis: total.cpu_millis + (value("cpu") * 1000.0).round() as u64,
                    memory_bytes: total.memory_bytes + value("memory").round() as u64,
                }
            })
    }

    pub fn cpu(&self) -> String {
        format!("{}m", self.cpu_millis)
    }

    pub fn memory(&self) -> String {
        format!("{}Mi", self.memory_bytes / (1024 * 1024))
    }
}

pub fn pod_metrics(list: &[PodMetricsResource]) -> PodMetrics {
    list.iter()
        .filter_map(|metrics| {
            let name = metrics.metadata.name.clone()?;
            Some((name, PodUsage::from_resource(metrics)))
        })
        .collect()
}

const SUFFIXES: [(&str, f64); 15] = [
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Resource quantity in base units (cores, bytes).
fn parse_quantity(value: &str) -> Option<f64> {
    let value = value.trim();

    let (number, scale) = SUFFIXES
        .iter()
        .find_map(|(suffix, scale)| value.strip_suffix(suffix).map(|n| (n, *scale)))
        .unwrap_or((value, 1.0));

    number.parse::<f64>().ok().map(|n| n * scale)
}
