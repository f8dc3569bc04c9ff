use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::booking::{BookingField, BookingRecord, ConfirmationStatus, CustomerIdentity};
use crate::logging::SESSIONS_TARGET;

const RULE_WIDTH: usize = 70;

/// Session identifier derived from the local start time
pub fn new_session_id() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Local>,
    pub user: String,
    pub assistant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingUpdateEntry {
    pub timestamp: DateTime<Local>,
    pub field: BookingField,
    pub value: String,
}

/// Record of one call
///
/// Kept as a readable `session_<id>.log` that grows turn by turn, and
/// written once as `session_<id>.json` when the call ends. Every entry is
/// also emitted on the sessions log target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub session_start: DateTime<Local>,
    pub session_end: Option<DateTime<Local>>,
    pub duration_seconds: Option<f64>,
    pub customer: CustomerIdentity,
    pub conversation: Vec<ConversationTurn>,
    pub booking_updates: Vec<BookingUpdateEntry>,
    pub confirmation_status: ConfirmationStatus,
    pub booking_data: Option<BookingRecord>,
    #[serde(skip)]
    text_path: Option<PathBuf>,
}

impl SessionLog {
    pub fn new(session_id: &str, customer: CustomerIdentity) -> Self {
        Self {
            session_id: session_id.to_string(),
            session_start: Local::now(),
            session_end: None,
            duration_seconds: None,
            customer,
            conversation: Vec::new(),
            booking_updates: Vec::new(),
            confirmation_status: ConfirmationStatus::Pending,
            booking_data: None,
            text_path: None,
        }
    }

    /// Create `session_<id>.log` in `dir` with the call header
    pub fn open_text_log(&mut self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let path = dir.join(self.text_file_name());
        let rule = "=".repeat(RULE_WIDTH);
        let header = format!(
            "{rule}\nDROPTRUCK AI SALES AGENT - CONVERSATION LOG\n{rule}\n\
             Session ID: {}\nStarted: {}\n{rule}\n\n",
            self.session_id,
            self.session_start.format("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(&path, header)
            .with_context(|| format!("Failed to write session log: {}", path.display()))?;

        info!(target: SESSIONS_TARGET, "SESSION STARTED: {}", self.session_id);
        self.text_path = Some(path.clone());
        Ok(path)
    }

    pub fn text_log_path(&self) -> Option<&Path> {
        self.text_path.as_deref()
    }

    pub fn record_turn(&mut self, user: &str, assistant: &str) {
        let timestamp = Local::now();
        let stamp = timestamp.format("%H:%M:%S");
        self.append_text(&format!(
            "[{stamp}] USER: {user}\n[{stamp}] ASSISTANT: {assistant}\n{}\n",
            "-".repeat(RULE_WIDTH)
        ));
        info!(target: SESSIONS_TARGET, "USER: {}", user);
        info!(target: SESSIONS_TARGET, "ASSISTANT: {}", assistant);

        self.conversation.push(ConversationTurn {
            timestamp,
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
    }

    pub fn record_update(&mut self, field: BookingField, value: &str) {
        let timestamp = Local::now();
        self.append_text(&format!(
            "[{}] BOOKING UPDATE: {} = {}\n",
            timestamp.format("%H:%M:%S"),
            field,
            value
        ));
        info!(target: SESSIONS_TARGET, "BOOKING UPDATE: {} = {}", field, value);

        self.booking_updates.push(BookingUpdateEntry {
            timestamp,
            field,
            value: value.to_string(),
        });
    }

    pub fn record_status(&mut self, status: ConfirmationStatus) {
        self.append_text(&format!(
            "[{}] CONFIRMATION STATUS: {}\n{}\n",
            Local::now().format("%H:%M:%S"),
            status,
            "-".repeat(RULE_WIDTH)
        ));
        info!(target: SESSIONS_TARGET, "CONFIRMATION STATUS: {}", status);

        self.confirmation_status = status;
    }

    /// Close the log with the final booking state
    pub fn finish(&mut self, record: &BookingRecord) {
        let end = Local::now();
        let duration = (end - self.session_start).num_milliseconds() as f64 / 1000.0;
        self.duration_seconds = Some(duration);
        self.session_end = Some(end);
        self.confirmation_status = record.confirmation_status();
        self.booking_data = Some(record.clone());

        self.append_text(&self.summary(end, duration, record));
        info!(
            target: SESSIONS_TARGET,
            "SESSION ENDED - Duration: {}s, Turns: {}",
            duration as u64,
            self.conversation.len()
        );
    }

    fn summary(&self, end: DateTime<Local>, duration: f64, record: &BookingRecord) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut text = format!(
            "\n{rule}\nSESSION SUMMARY\n{rule}\nSession ended: {}\nDuration: {} seconds\n\
             Conversation turns: {}\n\nFINAL BOOKING DATA:\n{}\n",
            end.format("%Y-%m-%d %H:%M:%S"),
            duration as u64,
            self.conversation.len(),
            "-".repeat(RULE_WIDTH),
        );
        for field in BookingField::ALL {
            let value = record.get(field).unwrap_or("[NOT PROVIDED]");
            text.push_str(&format!("{:.<30} {}\n", field.name(), value));
        }
        text.push_str(&format!(
            "{:.<30} {}\n{rule}\n",
            "confirmation_status",
            record.confirmation_status()
        ));
        text
    }

    fn append_text(&self, text: &str) {
        let Some(path) = &self.text_path else {
            return;
        };

        let written = OpenOptions::new()
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(text.as_bytes()));
        if let Err(e) = written {
            warn!("Failed to append to {}: {}", path.display(), e);
        }
    }

    pub fn file_name(&self) -> String {
        format!("session_{}.json", self.session_id)
    }

    pub fn text_file_name(&self) -> String {
        format!("session_{}.log", self.session_id)
    }

    /// Write the log into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write session log: {}", path.display()))?;

        info!("Session log saved: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_id_format() {
        let id = new_session_id();
        assert!(chrono::NaiveDateTime::parse_from_str(&id, "%Y-%m-%d_%H-%M-%S").is_ok());
    }

    #[test]
    fn test_save_writes_json() {
        let dir = TempDir::new().unwrap();
        let mut log = SessionLog::new("2025-11-27_10-00-00", CustomerIdentity::default());
        log.record_turn("from Chennai to Bangalore", "Got it. What truck do you need?");
        log.record_update(BookingField::PickupLocation, "Chennai");
        log.finish(&BookingRecord::new());

        let path = log.save(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "session_2025-11-27_10-00-00.json");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["conversation"][0]["user"], "from Chennai to Bangalore");
        assert_eq!(json["booking_updates"][0]["field"], "pickup_location");
        assert_eq!(json["confirmation_status"], "pending");
        assert!(json["duration_seconds"].is_number());
        assert!(json.get("text_path").is_none());
    }

    #[test]
    fn test_text_log_follows_the_call() {
        let dir = TempDir::new().unwrap();
        let mut log = SessionLog::new("2025-11-27_10-00-00", CustomerIdentity::default());
        let path = log.open_text_log(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "session_2025-11-27_10-00-00.log");
        assert_eq!(log.text_log_path(), Some(path.as_path()));

        log.record_turn("from Chennai to Bangalore", "Got it. Which vehicle do you need?");
        log.record_update(BookingField::DropLocation, "Bangalore");
        log.record_status(ConfirmationStatus::Confirmed);

        let mut record = BookingRecord::new();
        record.force_confirmed();
        log.finish(&record);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(&"=".repeat(70)));
        assert!(text.contains("Session ID: 2025-11-27_10-00-00"));
        assert!(text.contains("USER: from Chennai to Bangalore"));
        assert!(text.contains("ASSISTANT: Got it. Which vehicle do you need?"));
        assert!(text.contains("BOOKING UPDATE: drop_location = Bangalore"));
        assert!(text.contains("CONFIRMATION STATUS: confirmed"));
        assert!(text.contains("SESSION SUMMARY"));
        assert!(text.contains("Conversation turns: 1"));
        assert!(text.contains("pickup_location............... [NOT PROVIDED]"));
    }

    #[test]
    fn test_entries_without_text_log_are_kept_in_memory() {
        let mut log = SessionLog::new("2025-11-27_10-00-00", CustomerIdentity::default());
        log.record_turn("hello", "Hello, how can I help?");
        assert_eq!(log.conversation.len(), 1);
        assert_eq!(log.text_log_path(), None);
    }
}
