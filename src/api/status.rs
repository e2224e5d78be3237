use reqwest::StatusCode;
use serde_json::Value;

use crate::errors::AppError;

/// Maps a non-success response from the quiz service onto the error taxonomy.
pub fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let message = extract_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string()
    });

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::ValidationError(message)
        }
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            AppError::Network(format!("{}: {}", status.as_u16(), message))
        }
        s if s.is_server_error() => AppError::Network(format!("{}: {}", s.as_u16(), message)),
        s => AppError::InternalError(format!("{}: {}", s.as_u16(), message)),
    }
}

// The service answers with either a plain string or a problem-details object.
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ["message", "title", "detail", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(trimmed.to_string())),
        Ok(Value::String(text)) => Some(text),
        _ => Some(trimmed.to_string()),
    }
}
