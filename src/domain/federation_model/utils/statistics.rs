use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{OnceLock, mpsc};
use std::thread;

use chrono::Utc;

/// Target of the structured `tracing` events emitted on every order transition.
pub const ANALYTICS_TARGET: &str = "federation_broker::analytics";

/// Columns of the order audit file. Each audit event is a set of key-value pairs over these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AuditParameter {
    /// RFC 3339 timestamp, filled in by the collector if missing.
    Time,

    /// Why this row was written
    LogDescription,

    OrderId,
    ResourceType,

    /// Member that created the order
    Requester,

    /// Member that fulfills the order
    Provider,

    CloudName,
    FromState,
    ToState,
}

impl AuditParameter {
    /// Column order of the CSV output.
    pub const ALL: [AuditParameter; 9] = [
        AuditParameter::Time,
        AuditParameter::LogDescription,
        AuditParameter::OrderId,
        AuditParameter::ResourceType,
        AuditParameter::Requester,
        AuditParameter::Provider,
        AuditParameter::CloudName,
        AuditParameter::FromState,
        AuditParameter::ToState,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            AuditParameter::Time => "Time",
            AuditParameter::LogDescription => "LogDescription",
            AuditParameter::OrderId => "OrderId",
            AuditParameter::ResourceType => "ResourceType",
            AuditParameter::Requester => "Requester",
            AuditParameter::Provider => "Provider",
            AuditParameter::CloudName => "CloudName",
            AuditParameter::FromState => "FromState",
            AuditParameter::ToState => "ToState",
        }
    }

    pub fn headers() -> Vec<&'static str> {
        Self::ALL.iter().map(|param| param.header()).collect()
    }
}

/// Values keep their native format until they are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditValue {
    Integer(i64),
    Text(String),
}

impl AuditValue {
    fn render(&self) -> String {
        match self {
            AuditValue::Integer(i) => i.to_string(),
            AuditValue::Text(t) => t.clone(),
        }
    }
}

impl From<i64> for AuditValue {
    fn from(v: i64) -> Self {
        AuditValue::Integer(v)
    }
}

impl From<String> for AuditValue {
    fn from(v: String) -> Self {
        AuditValue::Text(v)
    }
}

impl From<&str> for AuditValue {
    fn from(v: &str) -> Self {
        AuditValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    data: HashMap<AuditParameter, AuditValue>,
}

impl AuditEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<V: Into<AuditValue>>(&mut self, param: AuditParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: AuditParameter) -> Option<&AuditValue> {
        self.data.get(&param)
    }

    /// One CSV row in column order, missing values are written as `NA`.
    pub fn to_row(&self) -> Vec<String> {
        AuditParameter::ALL.iter().map(|param| self.data.get(param).map(AuditValue::render).unwrap_or_else(|| "NA".to_string())).collect()
    }
}

enum AuditMessage {
    Log(AuditEvent),
    Flush,
    Shutdown,
}

/// Handle used by the broker to record audit rows. Writing happens on a background thread.
pub struct AuditCollector {
    sender: mpsc::Sender<AuditMessage>,
}

impl AuditCollector {
    /// Spawns the writer thread. Without a file name the rows go to stdout.
    pub fn init(filename: Option<String>) -> Self {
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new().name("audit-writer".to_string()).spawn(move || {
            Self::worker_loop(rx, filename);
        });
        if let Err(e) = spawned {
            log::error!("Audit writer thread could not be started: {}", e);
        }

        AuditCollector { sender: tx }
    }

    fn worker_loop(rx: mpsc::Receiver<AuditMessage>, filename: Option<String>) {
        let writer: Box<dyn Write> = match filename {
            Some(f) => match File::create(&f) {
                Ok(file) => Box::new(file),
                Err(e) => {
                    log::error!("Could not create audit file '{}': {}. Audit rows go to stdout.", f, e);
                    Box::new(io::stdout())
                }
            },
            None => Box::new(io::stdout()),
        };

        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        if let Err(e) = csv_wtr.write_record(AuditParameter::headers()) {
            log::error!("Audit Error: Failed to write headers: {}", e);
        }

        for msg in rx {
            match msg {
                AuditMessage::Log(event) => {
                    if let Err(e) = csv_wtr.write_record(event.to_row()) {
                        log::error!("Audit Error: Failed to write record: {}", e);
                    }
                }
                AuditMessage::Flush => {
                    let _ = csv_wtr.flush();
                }
                AuditMessage::Shutdown => {
                    let _ = csv_wtr.flush();
                    break;
                }
            }
        }
    }

    /// Non-blocking, only enqueues the row.
    pub fn add_event(&self, mut event: AuditEvent) {
        if event.get(AuditParameter::Time).is_none() {
            event.set(AuditParameter::Time, Utc::now().to_rfc3339());
        }

        // A dead writer thread must not take the broker down with it.
        let _ = self.sender.send(AuditMessage::Log(event));
    }

    pub fn flush(&self) {
        let _ = self.sender.send(AuditMessage::Flush);
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(AuditMessage::Shutdown);
    }
}

static GLOBAL_AUDIT: OnceLock<AuditCollector> = OnceLock::new();

/// Initializes the global audit collector. Later calls are ignored.
pub fn init_global(filename: Option<String>) {
    if GLOBAL_AUDIT.get().is_some() {
        return;
    }
    let _ = GLOBAL_AUDIT.set(AuditCollector::init(filename));
}

/// Records an event on the global collector, if one was initialized.
pub fn add_global_event(event: AuditEvent) {
    if let Some(collector) = GLOBAL_AUDIT.get() {
        collector.add_event(event);
    } else {
        log::trace!("Audit event dropped, no audit collector initialized.");
    }
}

pub fn flush_global() {
    if let Some(collector) = GLOBAL_AUDIT.get() {
        collector.flush();
    }
}
