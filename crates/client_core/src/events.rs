//! Notifications published by controllers, the stats poller and mutations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::error::{ApiError, ErrorCategory};

use crate::{error::GatewayError, paginator::PageState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient, user-facing message; the console prints these, a UI would toast them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
            category: None,
        }
    }

    pub fn failure(description: impl Into<String>, error: &GatewayError) -> Self {
        let ApiError { category, message } = error.to_api_error();
        Self {
            level: NoticeLevel::Error,
            title: category.title().to_string(),
            description: format!("{}: {message}", description.into()),
            category: Some(category),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone)]
pub enum AdminEvent {
    Notice(Notice),
    ListLoaded {
        resource: &'static str,
        page: PageState,
        filter: Option<String>,
    },
    StatsRefreshed {
        fetched_at: DateTime<Utc>,
    },
}
