use tempgraph_core::{GraphError, Result};

/// Parse a raw message payload into a temperature reading.
///
/// The payload must be UTF-8 text holding a single decimal number, optionally
/// surrounded by whitespace (`"21.5"`, `" -3\n"`, `"1e2"`).  Non-finite values
/// are rejected since they cannot be plotted.
pub fn parse_reading(payload: &[u8]) -> Result<f64> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| GraphError::Parse(format!("payload is not UTF-8: {e}")))?;

    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| GraphError::Parse(format!("not a number: {trimmed:?}")))?;

    if !value.is_finite() {
        return Err(GraphError::Parse(format!("non-finite reading: {trimmed:?}")));
    }
    Ok(value)
}
