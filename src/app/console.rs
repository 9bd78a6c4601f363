// ImpLog - app/console.rs
//
// Output sink that writes rendered records to any `io::Write`
// (stdout for the CLI, a Vec<u8> in tests).

use crate::app::collaborators::OutputSink;
use crate::util::error::CollateralError;
use std::io::Write;

/// ANSI "erase display, cursor home".
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct ConsoleSink<W: Write> {
    writer: W,
    /// Emit terminal control sequences for `clear`.
    interactive: bool,
    lines_written: u64,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W, interactive: bool) -> Self {
        Self {
            writer,
            interactive,
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn sink_error(operation: &'static str, source: std::io::Error) -> CollateralError {
    CollateralError::Sink { operation, source }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    fn append_line(&mut self, text: &str) -> Result<(), CollateralError> {
        writeln!(self.writer, "{text}").map_err(|e| sink_error("append_line", e))?;
        self.writer.flush().map_err(|e| sink_error("append_line", e))?;
        self.lines_written += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CollateralError> {
        if self.interactive {
            self.writer
                .write_all(CLEAR_SCREEN.as_bytes())
                .and_then(|()| self.writer.flush())
                .map_err(|e| sink_error("clear", e))?;
        }
        Ok(())
    }

    fn show(&mut self, _preserve_focus: bool) -> Result<(), CollateralError> {
        // A console is always in view.
        Ok(())
    }
}
