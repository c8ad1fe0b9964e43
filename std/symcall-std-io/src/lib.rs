//!
//! symcall-std-io - Bounded Line Input
//!
//! Provides the line-reading collaborator behind the `readLine(prompt)`
//! script entry point.
//!
//! ## Types
//!
//! - `LineReader` - source of input lines, shown a prompt first
//! - `StdinLineReader` - reads from the process stdin, prompts on stdout
//! - `ScriptedLineReader` - replays queued lines, records prompts
//!
//! ## Buffers
//!
//! Prompt and result both live in fixed-size buffers on the native side
//! (128 bytes including the terminator by default). `read_line_bounded`
//! truncates both to `buffer - 1` bytes, always on a UTF-8 boundary, so
//! nothing ever overflows.
//!

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use thiserror::Error;

/// Default size of the prompt and line buffers, terminator included.
pub const DEFAULT_LINE_BUFFER: usize = 128;

#[derive(Debug, Error)]
pub enum LineError {
    #[error("line buffer of {0} bytes cannot hold any text")]
    BufferTooSmall(usize),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub trait LineReader {
    /// Show `prompt` and read one line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, LineError>;
}

/// Reads lines from stdin, writing the prompt to stdout first.
#[derive(Debug, Default)]
pub struct StdinLineReader;

impl LineReader for StdinLineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, LineError> {
        let mut stdout = std::io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;

        let mut input = String::new();
        let n = std::io::stdin().lock().read_line(&mut input)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(input))
    }
}

/// Replays a fixed list of lines. Used by hosts that feed scripts from
/// somewhere other than a terminal, and by tests.
#[derive(Debug, Default)]
pub struct ScriptedLineReader {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedLineReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Prompts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl LineReader for ScriptedLineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, LineError> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
pub fn truncate_at_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Read one line through `reader` as if prompt and result lived in
/// `buffer`-byte native buffers. End of input yields an empty string.
pub fn read_line_bounded(
    reader: &mut dyn LineReader,
    prompt: &str,
    buffer: usize,
) -> Result<String, LineError> {
    if buffer < 2 {
        return Err(LineError::BufferTooSmall(buffer));
    }
    let capacity = buffer - 1;

    let prompt = truncate_at_boundary(prompt, capacity);
    let Some(mut line) = reader.read_line(prompt)? else {
        return Ok(String::new());
    };

    if line.ends_with('\n') { line.pop(); }
    if line.ends_with('\r') { line.pop(); }

    let kept = truncate_at_boundary(&line, capacity).len();
    line.truncate(kept);
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_boundary() {
        assert_eq!(truncate_at_boundary("hello", 10), "hello");
        assert_eq!(truncate_at_boundary("hello", 3), "hel");
        // 'é' is two bytes; cutting inside it backs off to the previous char
        assert_eq!(truncate_at_boundary("aé", 2), "a");
        assert_eq!(truncate_at_boundary("", 0), "");
    }

    #[test]
    fn test_read_line_strips_newline() {
        let mut reader = ScriptedLineReader::new(["yes\r\n"]);
        let line = read_line_bounded(&mut reader, "continue? ", DEFAULT_LINE_BUFFER).unwrap();
        assert_eq!(line, "yes");
        assert_eq!(reader.prompts(), ["continue? "]);
    }

    #[test]
    fn test_read_line_truncates_prompt_and_result() {
        let long = "x".repeat(300);
        let mut reader = ScriptedLineReader::new([long.clone()]);
        let line = read_line_bounded(&mut reader, &long, DEFAULT_LINE_BUFFER).unwrap();
        assert_eq!(line.len(), 127);
        assert_eq!(reader.prompts()[0].len(), 127);
    }

    #[test]
    fn test_read_line_end_of_input() {
        let mut reader = ScriptedLineReader::default();
        let line = read_line_bounded(&mut reader, "> ", DEFAULT_LINE_BUFFER).unwrap();
        assert_eq!(line, "");
    }

    #[test]
    fn test_buffer_too_small() {
        let mut reader = ScriptedLineReader::new(["a"]);
        let err = read_line_bounded(&mut reader, "> ", 1).unwrap_err();
        assert!(err.to_string().contains("1 bytes"));
    }
}
