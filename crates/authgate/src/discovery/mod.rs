//! Label-based service configuration extraction.
//!
//! The pipeline host shares its process with a service-discovery layer
//! that publishes routing and auth properties as a flat label map. This
//! module turns such a map into the per-service property mapping
//! (`properties[service][property] = value`) and provides the typed
//! accessors used over it, including the `auth.bypass` prefixes consumed
//! at configuration time.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Label namespace for gate-relevant service properties.
pub const LABEL_PREFIX: &str = "authgate.";

/// Property holding the comma-separated exempt-path prefixes of a service.
pub const PROPERTY_AUTH_BYPASS: &str = "auth.bypass";

/// Map of service properties: `properties[service][property] = value`.
pub type ServiceProperties = HashMap<String, HashMap<String, String>>;

/// Pattern for service-scoped labels: `authgate.<service>.<property>`.
static SERVICE_PROPERTY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^authgate\.(?P<service_name>[A-Za-z0-9_-]+)\.(?P<property_name>[A-Za-z0-9_.-]+)$")
        .expect("Invalid regex pattern for service property labels")
});

/// Extract the per-service property mapping from a flat label map.
/// Labels outside the `authgate.` namespace are ignored.
pub fn extract_service_properties(labels: &HashMap<String, String>) -> ServiceProperties {
    let mut services = ServiceProperties::new();

    for (name, value) in labels {
        if let Some(captures) = SERVICE_PROPERTY_PATTERN.captures(name) {
            let service = captures["service_name"].to_string();
            let property = captures["property_name"].to_string();
            services
                .entry(service)
                .or_default()
                .insert(property, value.clone());
        }
    }

    services
}

/// String property of a service, or `default` when absent.
pub fn get_string_property<'a>(
    properties: &'a ServiceProperties,
    service: &str,
    property: &str,
    default: &'a str,
) -> &'a str {
    properties
        .get(service)
        .and_then(|props| props.get(property))
        .map(String::as_str)
        .unwrap_or(default)
}

/// Boolean property of a service: present, non-empty, and equal to
/// `"true"` ignoring case and surrounding whitespace.
pub fn get_bool_property(properties: &ServiceProperties, service: &str, property: &str) -> bool {
    properties
        .get(service)
        .and_then(|props| props.get(property))
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

/// List property of a service: comma-separated, trimmed, empty entries
/// dropped.
pub fn get_list_property(
    properties: &ServiceProperties,
    service: &str,
    property: &str,
) -> Vec<String> {
    properties
        .get(service)
        .and_then(|props| props.get(property))
        .map(|value| split_and_trim(value))
        .unwrap_or_default()
}

fn split_and_trim(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Collect every `auth.bypass` prefix declared across services,
/// deduplicated and in stable order.
pub fn collect_bypass_prefixes(properties: &ServiceProperties) -> Vec<String> {
    let mut prefixes: Vec<String> = properties
        .keys()
        .flat_map(|service| get_list_property(properties, service, PROPERTY_AUTH_BYPASS))
        .collect();
    prefixes.sort();
    prefixes.dedup();
    prefixes
}

/// Load a flat label map from a JSON file (`{"label": "value", ...}`).
pub fn load_labels(path: &Path) -> Result<HashMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading labels file {}", path.display()))?;
    let labels: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing labels file {}", path.display()))?;
    Ok(labels)
}
