//! The forwarding service: one BusItem object per published path.
//!
//! Values are read-only for other bus clients. `PropertiesChanged` is emitted
//! only when a value actually changes.

use std::collections::HashMap;

use async_trait::async_trait;
use genforward_core::{ForwardingStatus, StatusValue};
use zbus::zvariant::{OwnedValue, Value};
use zbus::{connection, interface, Connection, SignalContext};

use crate::bus::StatusSink;
use crate::config::{BusKind, DaemonConfig};
use crate::error::DaemonError;

/// `SetValue` reply for paths that refuse writes.
pub const SET_VALUE_REFUSED: i32 = 1;

/// Device identity paths every platform service carries. Fixed for the life
/// of the process.
pub fn management_paths(config: &DaemonConfig) -> Vec<(&'static str, StatusValue)> {
    vec![
        ("/Mgmt/ProcessName", StatusValue::Text(config.process_name.clone())),
        ("/Mgmt/ProcessVersion", StatusValue::Text(config.process_version.clone())),
        ("/Mgmt/Connection", StatusValue::Text("generator".to_string())),
        ("/DeviceInstance", StatusValue::Int(0)),
        ("/ProductId", StatusValue::Invalid),
        ("/ProductName", StatusValue::Invalid),
        ("/FirmwareVersion", StatusValue::Invalid),
        ("/HardwareVersion", StatusValue::Invalid),
        ("/Connected", StatusValue::Int(0)),
    ]
}

/// Bus representation of a published value.
pub fn to_bus_value(value: &StatusValue) -> Value<'static> {
    match value {
        StatusValue::Text(text) => Value::from(text.clone()),
        StatusValue::Int(int) => match i32::try_from(*int) {
            Ok(small) => Value::I32(small),
            Err(_) => Value::I64(*int),
        },
        StatusValue::Flag(flag) => Value::Bool(*flag),
        StatusValue::Invalid => Value::from(Vec::<i32>::new()),
    }
}

pub struct BusItem {
    value: StatusValue,
}

impl BusItem {
    pub fn new(value: StatusValue) -> Self {
        Self { value }
    }

    fn changes(&self) -> HashMap<&'static str, Value<'static>> {
        HashMap::from([
            ("Value", to_bus_value(&self.value)),
            ("Text", Value::from(self.value.to_string())),
        ])
    }
}

#[interface(name = "com.victronenergy.BusItem")]
impl BusItem {
    fn get_value(&self) -> zbus::fdo::Result<OwnedValue> {
        OwnedValue::try_from(to_bus_value(&self.value))
            .map_err(|err| zbus::fdo::Error::Failed(err.to_string()))
    }

    fn get_text(&self) -> String {
        self.value.to_string()
    }

    fn set_value(&self, _value: OwnedValue) -> i32 {
        SET_VALUE_REFUSED
    }

    #[zbus(signal)]
    async fn properties_changed(
        ctxt: &SignalContext<'_>,
        changes: HashMap<&str, Value<'_>>,
    ) -> zbus::Result<()>;
}

/// Connect to the configured bus, serve every path and claim the service name.
pub async fn serve(config: &DaemonConfig) -> Result<Connection, DaemonError> {
    let builder = match config.bus {
        BusKind::System => connection::Builder::system()?,
        BusKind::Session => connection::Builder::session()?,
    };

    let builder = builder.name(config.service_name.as_str())?;
    let connection = register_paths(builder, config)?.build().await?;
    tracing::info!(service = %config.service_name, "forwarding service registered");
    Ok(connection)
}

fn register_paths<'a>(
    mut builder: connection::Builder<'a>,
    config: &DaemonConfig,
) -> zbus::Result<connection::Builder<'a>> {
    for (path, value) in management_paths(config) {
        builder = builder.serve_at(path, BusItem::new(value))?;
    }
    for (path, value) in ForwardingStatus::default().to_paths() {
        builder = builder.serve_at(path, BusItem::new(value))?;
    }
    Ok(builder)
}

/// [`StatusSink`] backed by the objects registered in [`serve`].
pub struct DbusStatusPublisher {
    connection: Connection,
}

impl DbusStatusPublisher {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn update(&self, path: &str, value: StatusValue) -> Result<(), DaemonError> {
        let iface = self
            .connection
            .object_server()
            .interface::<_, BusItem>(path)
            .await?;
        // The write guard is released before the signal goes out.
        let changes = {
            let mut item = iface.get_mut().await;
            if item.value == value {
                return Ok(());
            }
            item.value = value;
            item.changes()
        };
        BusItem::properties_changed(iface.signal_context(), changes).await?;
        Ok(())
    }
}

#[async_trait]
impl StatusSink for DbusStatusPublisher {
    async fn publish(&self, status: &ForwardingStatus) -> Result<(), DaemonError> {
        for (path, value) in status.to_paths() {
            self.update(path, value).await?;
        }
        Ok(())
    }
}
