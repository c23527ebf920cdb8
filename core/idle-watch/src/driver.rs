//! Reads host commands line by line and forwards them to the idle service.

use crate::protocol::{parse_command, Command, Event, MAX_LINE_BYTES};
use crate::sink::EventSink;
use idle_core::IdleHandle;
use std::io::{BufRead, Read};

/// Why the command loop ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Exit {
    Shutdown,
    EndOfInput,
}

/// Outcome of reading one inbound line.
enum LineRead {
    Line(String),
    TooLarge,
    InvalidUtf8,
}

pub fn run<R: BufRead>(mut reader: R, handle: &IdleHandle, sink: &EventSink) -> idle_core::Result<Exit> {
    let mut buffer = Vec::new();
    loop {
        let line = match read_line(&mut reader, &mut buffer) {
            Ok(Some(LineRead::Line(line))) => line,
            Ok(Some(LineRead::TooLarge)) => {
                let message = format!("command exceeds {} bytes", MAX_LINE_BYTES);
                tracing::warn!(error = %message, "Rejected command");
                report(sink, Event::Error { message });
                continue;
            }
            Ok(Some(LineRead::InvalidUtf8)) => {
                let message = "command is not valid UTF-8".to_string();
                tracing::warn!(error = %message, "Rejected command");
                report(sink, Event::Error { message });
                continue;
            }
            Ok(None) => return Ok(Exit::EndOfInput),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read command line");
                return Ok(Exit::EndOfInput);
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                tracing::warn!(error = %message, "Rejected command");
                report(sink, Event::Error { message });
                continue;
            }
        };

        tracing::debug!(command = ?command, "Command received");
        match command {
            Command::AffordanceVisible => handle.notify_affordance_visible()?,
            Command::AffordanceHidden => handle.notify_affordance_hidden()?,
            Command::TaskStarted => handle.notify_task_started()?,
            Command::TaskCompleted => handle.notify_task_completed_or_message_sent()?,
            Command::UserActivity => handle.notify_user_activity()?,
            Command::Pause => handle.pause()?,
            Command::Resume => handle.resume()?,
            Command::UpdateConfig { config } => {
                if let Some(show) = config.show_status_indicator {
                    sink.set_show_status(show);
                }
                handle.update_config(config)?;
            }
            Command::SetWorkspace { path } => handle.update_workspace_path(path)?,
            Command::Status => {
                let snapshot = handle.snapshot()?;
                report(sink, Event::Snapshot { snapshot });
            }
            Command::Shutdown => return Ok(Exit::Shutdown),
        }
    }
}

/// Reads one line, buffering at most `MAX_LINE_BYTES` plus the newline.
/// The remainder of an oversized line is discarded. `None` at end of input.
fn read_line<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> std::io::Result<Option<LineRead>> {
    buffer.clear();
    let limit = MAX_LINE_BYTES as u64 + 1;
    let read = Read::take(&mut *reader, limit).read_until(b'\n', buffer)?;
    if read == 0 {
        return Ok(None);
    }

    if buffer.last() == Some(&b'\n') {
        buffer.pop();
    } else if buffer.len() > MAX_LINE_BYTES {
        discard_rest_of_line(reader)?;
        return Ok(Some(LineRead::TooLarge));
    }

    match String::from_utf8(std::mem::take(buffer)) {
        Ok(line) => Ok(Some(LineRead::Line(line))),
        Err(_) => Ok(Some(LineRead::InvalidUtf8)),
    }
}

fn discard_rest_of_line<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|byte| *byte == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

fn report(sink: &EventSink, event: Event) {
    if let Err(err) = sink.emit(&event) {
        tracing::warn!(error = %err, "Failed to write event");
    }
}
