use crate::error::{PipelineError, Result};
use crate::fetch::RawResponse;
use serde_json::Value;
use tracing::{instrument, warn};

/// Accept only a 200 whose body parses as a JSON array of arrays.
///
/// The body is always treated as text and parsed here; nothing upstream
/// decodes JSON. On a non-200 status the body is not looked at.
#[instrument(level = "debug", skip(resp), fields(status = resp.status))]
pub fn validate(resp: &RawResponse) -> Result<Vec<Vec<Value>>> {
    if !resp.is_success() {
        warn!(status = resp.status, "non-success status");
        return Err(PipelineError::Status {
            status: resp.status,
            body: resp.body.clone(),
        });
    }

    let rows: Vec<Vec<Value>> =
        serde_json::from_str(&resp.body).map_err(|source| PipelineError::Parse {
            source,
            body: resp.body.clone(),
        })?;

    if rows.is_empty() {
        return Err(PipelineError::Shape(
            "response contained no header row".to_string(),
        ));
    }
    Ok(rows)
}
