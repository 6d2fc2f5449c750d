//! Line-buffered output for the fault report.
//!
//! The report is produced through `core::fmt::Write` but the console wants
//! whole lines: defmt frames are atomic, and a line split across frames is
//! hard to read on the host. [`LineSink`] collects characters into a fixed
//! `heapless::String<N>` and hands each complete line to a callback.
//!
//! A line longer than `N` bytes is emitted in `N`-byte pieces. The sink never
//! reports a write error, so a report is never cut short by formatting.
//!
//! ```rust,ignore
//! let mut sink = LineSink::<_, 96>::new(|line| defmt::println!("{=str}", line));
//! report.write_to(&mut sink)?;
//! sink.flush();
//! ```

use core::fmt;

use heapless::String;

/// `fmt::Write` adapter that forwards complete lines to `emit`.
pub struct LineSink<F, const N: usize>
where
    F: FnMut(&str),
{
    line: String<N>,
    emit: F,
}

impl<F, const N: usize> LineSink<F, N>
where
    F: FnMut(&str),
{
    /// Create an empty sink.
    pub fn new(emit: F) -> Self {
        Self {
            line: String::new(),
            emit,
        }
    }

    /// Emit whatever is buffered, if anything.
    pub fn flush(&mut self) {
        if !self.line.is_empty() {
            self.emit_line();
        }
    }

    /// Bytes buffered for the current line.
    pub fn pending(&self) -> usize {
        self.line.len()
    }

    fn emit_line(&mut self) {
        (self.emit)(self.line.as_str());
        self.line.clear();
    }

    fn push(&mut self, c: char) {
        if self.line.push(c).is_ok() {
            return;
        }
        // Full: emit the piece and start over. A char that cannot fit an
        // empty buffer (N < 4) is dropped.
        self.emit_line();
        let _ = self.line.push(c);
    }
}

impl<F, const N: usize> fmt::Write for LineSink<F, N>
where
    F: FnMut(&str),
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if c == '\n' {
                self.emit_line();
            } else {
                self.push(c);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn collect<const N: usize>(input: &str) -> Vec<std::string::String> {
        let mut lines = Vec::new();
        let mut sink = LineSink::<_, N>::new(|line: &str| lines.push(line.to_owned()));
        sink.write_str(input).unwrap();
        sink.flush();
        drop(sink);
        lines
    }

    #[test]
    fn test_splits_on_newline() {
        assert_eq!(collect::<32>("one\ntwo\n"), ["one", "two"]);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        assert_eq!(collect::<32>("a\n\nb\n"), ["a", "", "b"]);
    }

    #[test]
    fn test_trailing_partial_line_needs_flush() {
        let mut lines = Vec::new();
        let mut sink = LineSink::<_, 32>::new(|line: &str| lines.push(line.to_owned()));
        write!(sink, "tail").unwrap();
        assert_eq!(sink.pending(), 4);
        sink.flush();
        assert_eq!(sink.pending(), 0);
        // A second flush has nothing to emit.
        sink.flush();
        drop(sink);
        assert_eq!(lines, ["tail"]);
    }

    #[test]
    fn test_long_line_is_split_at_capacity() {
        assert_eq!(collect::<4>("abcdefghij\n"), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_writes_across_calls_join() {
        let mut lines = Vec::new();
        let mut sink = LineSink::<_, 32>::new(|line: &str| lines.push(line.to_owned()));
        write!(sink, "psp:").unwrap();
        write!(sink, " {:#010X}", 0x2000_7FD8u32).unwrap();
        writeln!(sink).unwrap();
        drop(sink);
        assert_eq!(lines, ["psp: 0x20007FD8"]);
    }
}
