//! Reading the forwarding service back, for `genforward status`.

use genforward_core::{ForwardingStatus, ServiceName, StatusValue};
use serde_json::{json, Map, Value};

use crate::bus::Bus;
use crate::error::DaemonError;

/// Snapshot of the published paths, or `None` when the service is not on
/// the bus.
pub async fn read_status<B: Bus + ?Sized>(
    bus: &B,
    service: &ServiceName,
) -> Result<Option<Value>, DaemonError> {
    let names = bus.list_names().await?;
    if !names.iter().any(|name| name == service.as_str()) {
        return Ok(None);
    }

    let mut payload = Map::new();
    payload.insert("running".to_string(), json!(true));
    payload.insert("service".to_string(), json!(service.as_str()));
    for (path, template) in ForwardingStatus::default().to_paths() {
        let key = path.trim_start_matches('/').to_string();
        let value = match template {
            StatusValue::Text(_) => json!(bus.get_text(service, path).await?),
            StatusValue::Flag(_) => json!(bus.get_value(service, path).await? != 0),
            StatusValue::Int(_) | StatusValue::Invalid => {
                json!(bus.get_value(service, path).await?)
            }
        };
        payload.insert(key, value);
    }
    Ok(Some(Value::Object(payload)))
}
