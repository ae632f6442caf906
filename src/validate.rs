use anyhow::Result;

use crate::error::OpError;

pub const DEFAULT_HISTORY_DAYS: u32 = 7;
pub const MAX_HISTORY_DAYS: u32 = 365;

/// Trim a task title; it must not be empty afterwards.
pub fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(OpError::EmptyTitle.into());
    }
    Ok(title)
}

/// Parse a task id taken from a URL path.
pub fn parse_task_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| OpError::MalformedTaskId(raw.to_string()).into())
}

/// History windows are between 1 and [`MAX_HISTORY_DAYS`] days long.
pub fn validate_window(days: u32) -> Result<u32> {
    if days == 0 || days > MAX_HISTORY_DAYS {
        return Err(OpError::InvalidWindow {
            days,
            max: MAX_HISTORY_DAYS,
        }
        .into());
    }
    Ok(days)
}
