//! Classification of raw slurmrestd responses

use crate::error::{SlurmrestdError, SlurmrestdResult};
use crate::transport::RawResponse;
use serde_json::Value;
use slurmgate_shared::ResourceQuery;
use tracing::warn;

/// Body of the 500 answer some slurmrestd releases send instead of a 401
pub const AUTHENTICATION_NOT_APPLICABLE: &str = "Authentication does not apply to request";

const JSON_MEDIA_TYPE: &str = "application/json";

/// Validate a response and extract the payload under the query envelope key
///
/// Checks run in order and the first failing one decides the error:
/// authentication, not found, content type, envelope errors. Warnings are
/// only logged.
pub fn validate(response: &RawResponse, query: &ResourceQuery) -> SlurmrestdResult<Value> {
    let url = query.url_path();

    if response.status == 401
        || (response.status == 500 && response.body == AUTHENTICATION_NOT_APPLICABLE)
    {
        return Err(SlurmrestdError::authentication(format!(
            "Authentication failed on {} (status {})",
            url, response.status
        )));
    }

    if response.status == 404 && !query.ignore_notfound {
        return Err(SlurmrestdError::not_found(url));
    }

    if !is_json(response.content_type.as_deref()) {
        return Err(SlurmrestdError::invalid_response(format!(
            "Unsupported Content-Type for slurmrestd response {}: {}",
            url,
            response.content_type.as_deref().unwrap_or("none")
        )));
    }

    let mut envelope: Value = serde_json::from_str(&response.body).map_err(|e| {
        SlurmrestdError::invalid_response(format!("Malformed JSON in response {}: {}", url, e))
    })?;

    if let Some(error) = envelope
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        return Err(internal_error(error));
    }

    match envelope.get("warnings").and_then(Value::as_array) {
        None => warn!("Unable to extract warnings from slurmrestd response {}", url),
        Some(warnings) => {
            for warning in warnings {
                warn!(
                    "slurmrestd query warning on {}: {}",
                    url,
                    text_field(warning, "description")
                );
            }
        }
    }

    envelope
        .get_mut(query.envelope_key())
        .map(Value::take)
        .ok_or_else(|| {
            SlurmrestdError::invalid_response(format!(
                "Missing key {} in slurmrestd response {}",
                query.envelope_key(),
                url
            ))
        })
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
        .unwrap_or(false)
}

fn internal_error(error: &Value) -> SlurmrestdError {
    let code = error.get("error_number").and_then(Value::as_i64).unwrap_or(-1);
    let mut description = text_field(error, "description");
    if description.is_empty() {
        description = text_field(error, "error");
    }
    SlurmrestdError::internal(code, description, text_field(error, "source"))
}

fn text_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
