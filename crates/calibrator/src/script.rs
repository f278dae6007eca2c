use anyhow::{Context, Result};
use protocol::CommandRequest;

/// Parse one script line. Blank lines and `#` comments yield `None`.
///
/// A bare command name (`pick_up_tip`) is accepted as shorthand for
/// `{"command": "pick_up_tip"}`.
pub fn parse_line(line: &str, line_no: usize) -> Option<Result<CommandRequest>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if !line.starts_with('{') {
        return Some(Ok(CommandRequest::new(line).with_id(line_no.to_string())));
    }

    let parsed = serde_json::from_str::<CommandRequest>(line)
        .with_context(|| format!("line {}: not a command request", line_no))
        .map(|mut request| {
            if request.id.is_none() {
                request.id = Some(line_no.to_string());
            }
            request
        });
    Some(parsed)
}
