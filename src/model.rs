use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerStatus {
    #[serde(rename = "SERVER_UP")]
    Up,
    #[serde(rename = "SERVER_DOWN")]
    Down,
}

impl ServerStatus {
    /// Wire value used by the server manager API.
    pub fn as_wire(self) -> &'static str {
        match self {
            ServerStatus::Up => "SERVER_UP",
            ServerStatus::Down => "SERVER_DOWN",
        }
    }

    /// Human-readable label for tables and messages.
    pub fn label(self) -> &'static str {
        match self {
            ServerStatus::Up => "SERVER UP",
            ServerStatus::Down => "SERVER DOWN",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ServerStatus::Up => ServerStatus::Down,
            ServerStatus::Down => ServerStatus::Up,
        }
    }
}

/// Status filter selectable from the dashboard.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum StatusFilter {
    #[default]
    #[serde(rename = "ALL")]
    #[value(name = "all")]
    All,
    #[serde(rename = "SERVER_UP")]
    #[value(name = "up")]
    Up,
    #[serde(rename = "SERVER_DOWN")]
    #[value(name = "down")]
    Down,
}

impl StatusFilter {
    pub fn matches(self, status: ServerStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Up => status == ServerStatus::Up,
            StatusFilter::Down => status == ServerStatus::Down,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Up => ServerStatus::Up.as_wire(),
            StatusFilter::Down => ServerStatus::Down.as_wire(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Up => ServerStatus::Up.label(),
            StatusFilter::Down => ServerStatus::Down.label(),
        }
    }

    /// Next filter in the All -> Up -> Down cycle used by the TUI.
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Up,
            StatusFilter::Up => StatusFilter::Down,
            StatusFilter::Down => StatusFilter::All,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    // Assigned by the backend; absent on records that have not been saved yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub ip_address: String,
    pub name: String,
    pub memory: String,
    #[serde(rename = "type")]
    pub server_type: String,
    #[serde(default)]
    pub image_url: String,
    pub status: ServerStatus,
}

impl ServerRecord {
    /// True when both records carry the same backend id.
    pub fn same_id(&self, other: &ServerRecord) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// Envelope status as reported by the backend. Any HTTP status name is
/// accepted; success names collapse to `Ok`, everything else to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvelopeStatus {
    Ok,
    Error,
}

impl From<String> for EnvelopeStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK" | "CREATED" | "ACCEPTED" | "NO_CONTENT" => EnvelopeStatus::Ok,
            _ => EnvelopeStatus::Error,
        }
    }
}

impl From<EnvelopeStatus> for String {
    fn from(s: EnvelopeStatus) -> Self {
        match s {
            EnvelopeStatus::Ok => "OK".into(),
            EnvelopeStatus::Error => "ERROR".into(),
        }
    }
}

/// Response wrapper used by every server manager endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(rename = "timeStamp", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub status: EnvelopeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer_message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Build a successful envelope that did not come from the wire.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            timestamp: None,
            status_code: Some(200),
            status: EnvelopeStatus::Ok,
            reason: None,
            message: message.into(),
            developer_message: None,
            data,
        }
    }

    /// Keep the metadata (status, message, timestamp) but swap the payload.
    pub fn with_data<U>(&self, data: U) -> Envelope<U> {
        Envelope {
            timestamp: self.timestamp.clone(),
            status_code: self.status_code,
            status: self.status,
            reason: self.reason.clone(),
            message: self.message.clone(),
            developer_message: self.developer_message.clone(),
            data,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub servers: Vec<ServerRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerItem {
    pub server: ServerRecord,
}

/// Payload of endpoints that return no data. Unknown fields (e.g. `deleted`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Loading,
    Loaded,
    Error,
}

/// Single view state rendered by presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    pub payload: Option<Envelope<ServerList>>,
    pub error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::loading()
    }
}

impl ViewState {
    pub fn loading() -> Self {
        Self {
            phase: Phase::Loading,
            payload: None,
            error: None,
        }
    }

    pub fn loaded(payload: Envelope<ServerList>) -> Self {
        Self {
            phase: Phase::Loaded,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Error,
            payload: None,
            error: Some(message.into()),
        }
    }

    /// Rows to render; empty unless the state is loaded.
    pub fn servers(&self) -> &[ServerRecord] {
        self.payload
            .as_ref()
            .map(|p| p.data.servers.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Default,
    Error,
}

/// Pop-up style message emitted on every terminal resolution of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Default,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Side-channel signals consumed by presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiSignal {
    Notify(Notification),
    /// A save succeeded: reset the input form to `reset_status` and close the dialog.
    SaveCompleted { reset_status: ServerStatus },
}
