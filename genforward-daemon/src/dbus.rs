//! [`Bus`] over a zbus connection, speaking the `com.victronenergy.BusItem`
//! interface.

use async_trait::async_trait;
use genforward_core::ServiceName;
use zbus::fdo::DBusProxy;
use zbus::zvariant::{OwnedValue, Value};
use zbus::Connection;

use crate::bus::Bus;
use crate::config::BusKind;
use crate::error::DaemonError;

/// Interface implemented by every object of a platform service.
pub const BUS_ITEM_INTERFACE: &str = "com.victronenergy.BusItem";

pub async fn connect(kind: BusKind) -> Result<Connection, DaemonError> {
    let connection = match kind {
        BusKind::System => Connection::system().await?,
        BusKind::Session => Connection::session().await?,
    };
    Ok(connection)
}

pub struct ZbusBus {
    connection: Connection,
    daemon: DBusProxy<'static>,
}

impl ZbusBus {
    pub async fn new(connection: Connection) -> Result<Self, DaemonError> {
        let daemon = DBusProxy::new(&connection).await?;
        Ok(Self { connection, daemon })
    }

    async fn call_get(&self, service: &ServiceName, path: &str) -> Result<OwnedValue, DaemonError> {
        let reply = self
            .connection
            .call_method(
                Some(service.as_str()),
                path,
                Some(BUS_ITEM_INTERFACE),
                "GetValue",
                &(),
            )
            .await?;
        let value: OwnedValue = reply.body().deserialize()?;
        Ok(value)
    }
}

#[async_trait]
impl Bus for ZbusBus {
    async fn list_names(&self) -> Result<Vec<String>, DaemonError> {
        let names = self.daemon.list_names().await?;
        Ok(names.into_iter().map(|name| name.to_string()).collect())
    }

    async fn get_value(&self, service: &ServiceName, path: &str) -> Result<i64, DaemonError> {
        let value = self.call_get(service, path).await?;
        Ok(value_to_i64(&value))
    }

    async fn get_text(&self, service: &ServiceName, path: &str) -> Result<String, DaemonError> {
        let reply = self
            .connection
            .call_method(
                Some(service.as_str()),
                path,
                Some(BUS_ITEM_INTERFACE),
                "GetText",
                &(),
            )
            .await?;
        let text: String = reply.body().deserialize()?;
        Ok(text)
    }

    async fn set_value(
        &self,
        service: &ServiceName,
        path: &str,
        value: i64,
    ) -> Result<(), DaemonError> {
        let value = i32::try_from(value)
            .map_err(|_| DaemonError::Transport(format!("value {value} does not fit int32")))?;
        let reply = self
            .connection
            .call_method(
                Some(service.as_str()),
                path,
                Some(BUS_ITEM_INTERFACE),
                "SetValue",
                &Value::from(value),
            )
            .await?;
        let code: i32 = reply.body().deserialize()?;
        if code != 0 {
            tracing::warn!(service = %service, path, code, "SetValue refused");
        }
        Ok(())
    }
}

/// Integer view of a BusItem value. Invalid values (an empty array) and any
/// other non-numeric payload decode to 0; doubles are truncated.
pub fn value_to_i64(value: &Value<'_>) -> i64 {
    match value {
        Value::U8(v) => i64::from(*v),
        Value::Bool(v) => i64::from(*v),
        Value::I16(v) => i64::from(*v),
        Value::U16(v) => i64::from(*v),
        Value::I32(v) => i64::from(*v),
        Value::U32(v) => i64::from(*v),
        Value::I64(v) => *v,
        Value::U64(v) => i64::try_from(*v).unwrap_or(i64::MAX),
        Value::F64(v) => *v as i64,
        Value::Value(inner) => value_to_i64(inner),
        _ => 0,
    }
}
