//! Instruction prompt and deterministic capture rendering.

use loop_core::Capture;
use loop_core::time::format_timestamp;

/// Instruction sent ahead of every capture.
pub const EXTRACTION_PROMPT: &str = "Extract concise, structured facts about scheduling, \
availability, and agenda items from the capture. Return ONLY JSON with a list under the \
`facts` key where each entry has category, detail, time_range, location, and confidence. \
Category examples: schedule, availability, agenda, reminder.";

/// Render a capture as the text block submitted after the instruction.
///
/// Missing source or creation time render as empty values so the layout is
/// identical for every capture.
pub fn render_capture(capture: &Capture) -> String {
    let created_at = capture.created_at.map(format_timestamp).unwrap_or_default();
    let source = capture.source.as_deref().unwrap_or_default();
    format!(
        "Capture metadata:\n\
         capture_id: {}\n\
         source: {source}\n\
         created_at: {created_at}\n\
         Transcript:\n\
         {}",
        capture.capture_id, capture.transcript
    )
}
