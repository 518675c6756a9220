//! Persistence sinks for readings, actuator changes and alarms.
//!
//! The storage backend is external to the controller; the monitoring loop
//! only needs something that accepts timestamped records. Two sinks ship
//! here: a JSON-lines file (one record per line, `"type"` tagged) and an
//! in-memory sink for tests and status views, which also answers
//! newest-first history queries.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mgb_common::reading::{ActuatorEvent, Alarm, Reading};

#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("datalog I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("datalog encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatalogRecord {
    Reading(Reading),
    Actuator(ActuatorEvent),
    Alarm(Alarm),
}

/// Accepts timestamped readings and actuator state changes.
pub trait ReadingSink: Send {
    fn record(&mut self, record: DatalogRecord) -> Result<(), DatalogError>;

    /// Push buffered records to storage.
    fn flush(&mut self) -> Result<(), DatalogError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ReadingSink for NullSink {
    fn record(&mut self, _record: DatalogRecord) -> Result<(), DatalogError> {
        Ok(())
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<DatalogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DatalogRecord> {
        self.records.lock().clone()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                DatalogRecord::Reading(reading) => Some(reading.clone()),
                _ => None,
            })
            .collect()
    }

    /// Up to `limit` readings, newest first, optionally for one sensor.
    pub fn recent_readings(&self, sensor: Option<&str>, limit: usize) -> Vec<Reading> {
        self.records
            .lock()
            .iter()
            .rev()
            .filter_map(|r| match r {
                DatalogRecord::Reading(reading)
                    if sensor.is_none_or(|name| name == reading.sensor) =>
                {
                    Some(reading.clone())
                }
                _ => None,
            })
            .take(limit)
            .collect()
    }

    pub fn actuator_events(&self) -> Vec<ActuatorEvent> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                DatalogRecord::Actuator(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn alarms(&self) -> Vec<Alarm> {
        self.records
            .lock()
            .iter()
            .filter_map(|r| match r {
                DatalogRecord::Alarm(alarm) => Some(alarm.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ReadingSink for MemorySink {
    fn record(&mut self, record: DatalogRecord) -> Result<(), DatalogError> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// Appends one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, DatalogError> {
        let io_err = |source| DatalogError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadingSink for JsonLinesSink {
    fn record(&mut self, record: DatalogRecord) -> Result<(), DatalogError> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n").map_err(|source| DatalogError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn flush(&mut self) -> Result<(), DatalogError> {
        self.writer.flush().map_err(|source| DatalogError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
