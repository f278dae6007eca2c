use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::command::CommandName;
use crate::session::SessionState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: SessionEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEventType {
    Started,
    CommandApplied {
        command: CommandName,
        from: SessionState,
        to: SessionState,
    },
    CommandFailed {
        command: CommandName,
        error: String,
    },
    CommandRejected {
        command: CommandName,
        state: SessionState,
    },
    ReleaseWarning {
        message: String,
    },
    Exited,
}

/// Bounded log of what happened to a session; oldest events drop first.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    events: VecDeque<SessionEvent>,
    max_events: usize,
}

impl SessionHistory {
    pub fn new(max_events: usize) -> Self {
        let max_events = max_events.max(1);
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    pub fn add_event(&mut self, event_type: SessionEventType) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(SessionEvent {
            timestamp: Utc::now(),
            event_type,
        });
    }

    pub fn events(&self) -> &VecDeque<SessionEvent> {
        &self.events
    }

    pub fn recent_events(&self, count: usize) -> Vec<SessionEvent> {
        let skip = self.events.len().saturating_sub(count);
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Hardware release problems logged during `exit_session`.
    pub fn release_warnings(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match &e.event_type {
                SessionEventType::ReleaseWarning { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn to_summary(&self) -> SessionSummary {
        let mut summary = SessionSummary {
            start_time: self.events.front().map(|e| e.timestamp),
            end_time: self.events.back().map(|e| e.timestamp),
            total_events: self.events.len(),
            ..Default::default()
        };

        for event in &self.events {
            match &event.event_type {
                SessionEventType::CommandApplied { .. } => summary.applied += 1,
                SessionEventType::CommandFailed { .. } => summary.failed += 1,
                SessionEventType::CommandRejected { .. } => summary.rejected += 1,
                SessionEventType::ReleaseWarning { .. } => summary.release_warnings += 1,
                _ => {}
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_events: usize,
    pub applied: usize,
    pub failed: usize,
    pub rejected: usize,
    pub release_warnings: usize,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(256)
    }
}
