/*
 * This file is part of Clevofan.
 *
 * Copyright (C) 2025 Clevofan contributors
 *
 * Clevofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Clevofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Clevofan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const DEFAULT_LOG_PATH: &str = "/var/log/clevofan/events.json";
const FALLBACK_LOG_PATH: &str = "/tmp/clevofan_events.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Start the JSON event log at the default location, falling back to /tmp.
pub fn init_logging() {
    let file = open_append(Path::new(DEFAULT_LOG_PATH))
        .or_else(|_| open_append(Path::new(FALLBACK_LOG_PATH)));
    if let Ok(f) = file {
        if let Ok(mut guard) = LOG_FILE.lock() {
            *guard = Some(f);
        }
    }
}

pub fn init_logging_at(path: &Path) -> io::Result<()> {
    let f = open_append(path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(f);
    }
    Ok(())
}

pub fn shutdown_logging() {
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = None;
    }
}

pub fn is_enabled() -> bool {
    LOG_FILE.lock().map(|g| g.is_some()).unwrap_or(false)
}

/// Append one `{"ts_ms", "event", "data"}` line. No-op until a log is open.
pub fn log_event(event: &str, data: Value) {
    let Ok(mut guard) = LOG_FILE.lock() else { return };
    let Some(f) = guard.as_mut() else { return };

    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    })
    .to_string();
    let _ = writeln!(f, "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    // Other tests may log concurrently, so only look at our own events.
    fn read_events(path: &Path, prefix: &str) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .filter(|v| v["event"].as_str().is_some_and(|e| e.starts_with(prefix)))
            .collect()
    }

    #[test]
    #[serial]
    fn test_log_event_writes_json_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        init_logging_at(&path).unwrap();

        log_event("logtest_write", json!({ "index": 1, "duty": 128 }));
        shutdown_logging();

        let lines = read_events(&path, "logtest_");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "logtest_write");
        assert_eq!(lines[0]["data"]["index"], 1);
        assert_eq!(lines[0]["data"]["duty"], 128);
        assert!(lines[0]["ts_ms"].as_u64().unwrap() > 0);
    }

    #[test]
    #[serial]
    fn test_log_event_is_noop_when_disabled() {
        shutdown_logging();
        assert!(!is_enabled());
        log_event("logtest_disabled", json!({}));
        assert!(!is_enabled());
    }

    #[test]
    #[serial]
    fn test_init_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("events.json");
        init_logging_at(&path).unwrap();
        assert!(is_enabled());
        log_event("logtest_nested", json!({ "mode": "test" }));
        shutdown_logging();

        assert!(path.exists());
        assert_eq!(read_events(&path, "logtest_").len(), 1);
    }

    #[test]
    #[serial]
    fn test_log_appends_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");

        init_logging_at(&path).unwrap();
        log_event("logtest_a", json!({}));
        shutdown_logging();

        init_logging_at(&path).unwrap();
        log_event("logtest_b", json!({}));
        shutdown_logging();

        let events: Vec<_> = read_events(&path, "logtest_").iter().map(|v| v["event"].clone()).collect();
        assert_eq!(events, vec![json!("logtest_a"), json!("logtest_b")]);
    }
}
