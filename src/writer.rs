//! Line editing writer
//!
//! [`Writer`] wraps any `io::Write` sink. Bytes written to it are split into
//! lines on `\n`; each complete line is run through the editors that may
//! apply to it and, unless removed, written to the sink followed by its
//! original line ending (`\n` or `\r\n`). A trailing partial line is held
//! back until more bytes arrive or [`Writer::flush`] is called.

use std::io::{self, Write};
use std::mem;

use tracing::{debug, trace, warn};

use crate::editor::{Action, Editor};
use crate::trie::PrefixTrie;

/// A writer that edits lines on their way to `W`.
///
/// The writer never flushes on its own. Call `flush` once the input is
/// exhausted, otherwise a final line without a terminating newline is
/// discarded when the writer is dropped.
#[derive(Debug)]
pub struct Writer<W: Write> {
    inner: W,
    trie: PrefixTrie,
    /// Tail of a line whose `\n` has not arrived yet.
    pending: Vec<u8>,
    /// Length of the prefix of `pending` known to contain no `\n`.
    scanned: usize,
    candidates: Vec<usize>,
    out: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Creates a writer applying `editors`, in order, to every line.
    pub fn new(inner: W, editors: impl IntoIterator<Item = Editor>) -> Self {
        let trie = PrefixTrie::new(editors);
        debug!(
            editors = trie.len(),
            unindexed = trie.unindexed(),
            "built line editor index"
        );
        Self {
            inner,
            trie,
            pending: Vec::new(),
            scanned: 0,
            candidates: Vec::new(),
            out: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Writing directly to the sink bypasses editing.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Bytes of an unterminated line waiting for its `\n`.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Returns the sink. Pending bytes are discarded, not flushed.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Emits every complete line in `data`, returning how many bytes were
    /// consumed. On a sink error the failing line is not consumed.
    fn process_lines(&mut self, data: &[u8]) -> (usize, io::Result<()>) {
        let mut consumed = 0;
        let mut from = self.scanned;

        while let Some(offset) = data[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            let (line, ending) = split_line_ending(&data[consumed..end]);

            if let Err(err) = self.emit(line, ending) {
                return (consumed, Err(err));
            }
            consumed = end + 1;
            from = consumed;
        }

        (consumed, Ok(()))
    }

    fn emit(&mut self, line: &[u8], ending: &[u8]) -> io::Result<()> {
        let (edited, action) = self.trie.edit(line, &mut self.candidates);

        if action == Action::Remove {
            trace!(len = line.len(), "removed line");
            return Ok(());
        }
        if *edited != *line {
            trace!(from = line.len(), to = edited.len(), "rewrote line");
        }

        self.out.clear();
        self.out.extend_from_slice(&edited);
        self.out.extend_from_slice(ending);
        self.inner.write_all(&self.out).inspect_err(|err| {
            warn!(error = %err, "sink write failed");
        })
    }
}

impl<W: Write> Write for Writer<W> {
    /// Accepts `buf`, emitting every line it completes.
    ///
    /// When the sink fails, only the bytes of `buf` up to the last line
    /// written before the failure are accepted and their count returned.
    /// The error itself is returned when no byte of `buf` was accepted, in
    /// which case the writer is left as it was before the call.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let held = self.pending.len();
        self.pending.extend_from_slice(buf);

        let pending = mem::take(&mut self.pending);
        let (consumed, result) = self.process_lines(&pending);
        self.pending = pending;

        if let Err(err) = result {
            // Bytes of `buf` from the failing line on are handed back.
            let accepted = consumed.saturating_sub(held);
            self.pending.truncate(held + accepted);
            self.pending.drain(..consumed);
            self.scanned = self.pending.len();
            return if accepted > 0 { Ok(accepted) } else { Err(err) };
        }

        self.pending.drain(..consumed);
        self.scanned = self.pending.len();
        Ok(buf.len())
    }

    /// Emits the buffered partial line, if any, as a final line without a
    /// line ending, then flushes the sink.
    ///
    /// If the sink fails the partial line stays buffered.
    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            debug!(len = self.pending.len(), "flushing unterminated line");
            let mut pending = mem::take(&mut self.pending);
            let result = self.emit(&pending, b"");
            if result.is_ok() {
                pending.clear();
            }
            self.pending = pending;
            self.scanned = self.pending.len();
            result?;
        }
        self.inner.flush()
    }
}

fn split_line_ending(line: &[u8]) -> (&[u8], &'static [u8]) {
    match line.strip_suffix(b"\r") {
        Some(body) => (body, b"\r\n"),
        None => (line, b"\n"),
    }
}
