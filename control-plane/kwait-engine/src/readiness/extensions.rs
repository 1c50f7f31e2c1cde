use kube::core::DynamicObject;
use serde_json::Value as JsonValue;

use super::Readiness;

fn condition<'a>(obj: &'a DynamicObject, type_: &str) -> Option<&'a JsonValue> {
    obj.data
        .get("status")
        .and_then(|s| s.get("conditions"))
        .and_then(|c| c.as_array())
        .and_then(|arr| {
            arr.iter().find(|cond| {
                cond.get("type").and_then(|v| v.as_str()) == Some(type_)
            })
        })
}

fn condition_status<'a>(
    obj: &'a DynamicObject,
    type_: &str,
) -> Option<&'a str> {
    condition(obj, type_)
        .and_then(|c| c.get("status"))
        .and_then(|v| v.as_str())
}

/// CRDs are usable once the API server reports them `Established`.
pub fn crd_established(obj: &DynamicObject) -> Readiness {
    if condition_status(obj, "Established") == Some("True") {
        return Readiness::Ready;
    }
    if condition_status(obj, "NamesAccepted") == Some("False") {
        let msg = condition(obj, "NamesAccepted")
            .and_then(|c| c.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("names not accepted");
        return Readiness::not_ready(format!("names not accepted: {msg}"));
    }
    Readiness::not_ready("not yet established")
}
