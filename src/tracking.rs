//! Write-only event log
//!
//! Events are appended and never read back by the calculators. Recording is
//! fire-and-forget: a failing sink is logged and otherwise ignored.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Label used for events raised without an email identity
pub const ANONYMOUS: &str = "anonymous";

/// Coarse device class derived from a user-agent string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

fn tablet_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)tablet|ipad|playbook|silk").expect("valid tablet pattern"))
}

fn mobile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Mobile|Android|iP(hone|od)|IEMobile|BlackBerry|Kindle|Silk-Accelerated|(hpw|web)OS|Opera M(obi|ini)")
            .expect("valid mobile pattern")
    })
}

impl DeviceType {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let ua = match user_agent.map(str::trim) {
            Some(ua) if !ua.is_empty() => ua,
            _ => return DeviceType::Unknown,
        };

        // Android without a "mobi" token is a tablet
        let lower = ua.to_lowercase();
        let android_tablet = lower.contains("android") && !lower.contains("mobi");
        if tablet_pattern().is_match(ua) || android_tablet {
            DeviceType::Tablet
        } else if mobile_pattern().is_match(ua) {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }
}

/// Document id for a phone unlock without a signed-in email: `phone_` plus
/// the digits and `+` of the number
pub fn phone_document_id(phone: &str) -> String {
    let kept: String = phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    format!("phone_{}", kept)
}

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackedEvent {
    Login {
        email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    PhoneUnlock {
        phone: String,
        document_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        linked_email: Option<String>,
    },
    InsightGenerated {
        user: String,
        context: String,
        input: Value,
        insight: String,
    },
    OptimizationAccepted {
        user: String,
        context: String,
        original: Value,
        optimized: Value,
        explanation: String,
    },
}

/// An event as written to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: TrackedEvent,
    pub device: DeviceType,
    pub created_at: DateTime<Utc>,
}

/// Destination for event records
pub trait EventSink: Send + Sync {
    fn append(&self, record: &EventRecord) -> Result<()>;
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn append(&self, _record: &EventRecord) -> Result<()> {
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl EventSink for MemorySink {
    fn append(&self, record: &EventRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// One JSON object per line, appended to a file
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlSink {
    fn append(&self, record: &EventRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Stamps events with device and time before handing them to a sink
pub struct EventLog {
    sink: Box<dyn EventSink>,
    device: DeviceType,
}

impl EventLog {
    pub fn new(sink: Box<dyn EventSink>, device: DeviceType) -> Self {
        Self { sink, device }
    }

    /// Log that records nothing
    pub fn disabled() -> Self {
        Self::new(Box::new(NullSink), DeviceType::Unknown)
    }

    pub fn device(&self) -> DeviceType {
        self.device
    }

    pub fn record(&self, event: TrackedEvent) {
        let record = EventRecord {
            event,
            device: self.device,
            created_at: Utc::now(),
        };
        if let Err(e) = self.sink.append(&record) {
            log::warn!("Failed to record event: {}", e);
        }
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("device", &self.device).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Shared(Arc<MemorySink>);

    impl EventSink for Shared {
        fn append(&self, record: &EventRecord) -> Result<()> {
            self.0.append(record)
        }
    }

    struct Broken;

    impl EventSink for Broken {
        fn append(&self, _record: &EventRecord) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into())
        }
    }

    #[test]
    fn test_device_classification() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";
        let ipad = "Mozilla/5.0 (iPad; CPU OS 16_0 like Mac OS X) AppleWebKit/605.1.15";
        let android_phone = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0 Mobile Safari/537.36";
        let android_tablet = "Mozilla/5.0 (Linux; Android 13; SM-X700) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36";

        assert_eq!(DeviceType::from_user_agent(Some(iphone)), DeviceType::Mobile);
        assert_eq!(DeviceType::from_user_agent(Some(ipad)), DeviceType::Tablet);
        assert_eq!(DeviceType::from_user_agent(Some(android_phone)), DeviceType::Mobile);
        assert_eq!(DeviceType::from_user_agent(Some(android_tablet)), DeviceType::Tablet);
        assert_eq!(DeviceType::from_user_agent(Some(desktop)), DeviceType::Desktop);
        assert_eq!(DeviceType::from_user_agent(Some("  ")), DeviceType::Unknown);
        assert_eq!(DeviceType::from_user_agent(None), DeviceType::Unknown);
    }

    #[test]
    fn test_phone_document_id() {
        assert_eq!(phone_document_id("+91 98765-43210"), "phone_+919876543210");
        assert_eq!(phone_document_id("98765 43210"), "phone_9876543210");
    }

    #[test]
    fn test_record_stamps_device() {
        let memory = Arc::new(MemorySink::new());
        let log = EventLog::new(Box::new(Shared(memory.clone())), DeviceType::Mobile);

        log.record(TrackedEvent::Login {
            email: "a@b.co".to_string(),
            display_name: None,
        });

        let records = memory.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device, DeviceType::Mobile);
    }

    #[test]
    fn test_memory_sink_survives_poisoned_lock() {
        let memory = Arc::new(MemorySink::new());
        let holder = memory.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.records.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();
        assert!(memory.records.is_poisoned());

        let log = EventLog::new(Box::new(Shared(memory.clone())), DeviceType::Desktop);
        log.record(TrackedEvent::Login {
            email: "a@b.co".to_string(),
            display_name: None,
        });
        assert_eq!(memory.records().len(), 1);
    }

    #[test]
    fn test_failing_sink_is_swallowed() {
        let log = EventLog::new(Box::new(Broken), DeviceType::Desktop);
        log.record(TrackedEvent::Login {
            email: "a@b.co".to_string(),
            display_name: None,
        });
    }

    #[test]
    fn test_jsonl_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let log = EventLog::new(Box::new(JsonlSink::new(&path)), DeviceType::Desktop);

        log.record(TrackedEvent::PhoneUnlock {
            phone: "+91 9876543210".to_string(),
            document_id: phone_document_id("+91 9876543210"),
            linked_email: None,
        });
        log.record(TrackedEvent::Login {
            email: "a@b.co".to_string(),
            display_name: Some("A".to_string()),
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["type"], "phone_unlock");
        assert_eq!(first["document_id"], "phone_+919876543210");
        assert_eq!(first["device"], "desktop");

        let second: EventRecord = serde_json::from_str(lines[1]).unwrap();
        assert!(matches!(second.event, TrackedEvent::Login { .. }));
    }
}
