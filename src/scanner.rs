use std::ops::Range;
use std::str;

use log::debug;

use crate::Demangler;

/// One piece of a scanned line.
///
/// Spans are byte ranges into the scanned line. Concatenating the segments
/// in order, with each translated span replaced by its demangled text,
/// gives the output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied through untouched, including candidates that failed.
    Literal(Range<usize>),
    /// A candidate that demangled successfully.
    Translated {
        span: Range<usize>,
        demangled: String,
    },
}

impl Segment {
    pub fn span(&self) -> &Range<usize> {
        match self {
            Segment::Literal(span) => span,
            Segment::Translated { span, .. } => span,
        }
    }
}

// Scanner states. A `PendingUnderscore` always holds the byte right before
// the current position, and an `InToken` candidate always starts with `_Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    PendingUnderscore,
    InToken { start: usize },
}

fn is_token_byte(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

/// Finds `_Z`-prefixed candidates in a line and demangles them.
///
/// A candidate is the longest run of `_`, ASCII letters and digits that
/// starts with `_Z`. The scanner keeps no state between lines.
#[derive(Debug, Clone, Default)]
pub struct LineScanner<D> {
    demangler: D,
}

impl<D: Demangler> LineScanner<D> {
    pub fn new(demangler: D) -> LineScanner<D> {
        LineScanner { demangler }
    }

    pub fn demangler(&self) -> &D {
        &self.demangler
    }

    /// Splits `line` into literal and translated segments.
    pub fn segments(&self, line: &[u8]) -> Vec<Segment> {
        let mut out = Segments {
            segments: Vec::new(),
            literal_start: 0,
        };
        let mut state = State::Outside;
        let mut pos = 0;

        while pos < line.len() {
            let c = line[pos];
            state = match state {
                State::Outside => {
                    pos += 1;
                    if c == b'_' {
                        State::PendingUnderscore
                    } else {
                        State::Outside
                    }
                }
                State::PendingUnderscore => {
                    pos += 1;
                    if c == b'Z' {
                        State::InToken { start: pos - 2 }
                    } else {
                        // The held `_` and `c` both stay literal; `c` is not
                        // looked at again.
                        State::Outside
                    }
                }
                State::InToken { start } => {
                    if is_token_byte(c) {
                        pos += 1;
                        State::InToken { start }
                    } else {
                        // `c` ends the candidate and is reprocessed as
                        // ordinary text on the next turn.
                        self.finish_token(line, start..pos, &mut out);
                        State::Outside
                    }
                }
            };
        }

        // A trailing pending `_` is already covered by the open literal span.
        if let State::InToken { start } = state {
            self.finish_token(line, start..line.len(), &mut out);
        }
        out.close_literal(line.len());
        out.segments
    }

    /// Scans `line`, returning it with every demangled candidate replaced.
    pub fn scan(&self, line: &str, brackets: bool) -> String {
        let mut result = String::with_capacity(line.len());
        for segment in self.segments(line.as_bytes()) {
            match segment {
                Segment::Literal(span) => result.push_str(&line[span]),
                Segment::Translated { demangled, .. } => {
                    if brackets {
                        result.push('[');
                    }
                    result.push_str(&demangled);
                    if brackets {
                        result.push(']');
                    }
                }
            }
        }
        result
    }

    /// Like `scan`, but for raw bytes. Anything that isn't part of a
    /// demangled candidate is copied over byte for byte, valid UTF-8 or not.
    pub fn scan_bytes(&self, line: &[u8], brackets: bool, out: &mut Vec<u8>) -> usize {
        let mut translated = 0;
        for segment in self.segments(line) {
            match segment {
                Segment::Literal(span) => out.extend_from_slice(&line[span]),
                Segment::Translated { demangled, .. } => {
                    translated += 1;
                    if brackets {
                        out.push(b'[');
                    }
                    out.extend_from_slice(demangled.as_bytes());
                    if brackets {
                        out.push(b']');
                    }
                }
            }
        }
        translated
    }

    fn finish_token(&self, line: &[u8], span: Range<usize>, out: &mut Segments) {
        // Token bytes are all ASCII, so this never fails in practice.
        let Ok(candidate) = str::from_utf8(&line[span.clone()]) else {
            return;
        };
        match self.demangler.demangle(candidate) {
            Ok(demangled) => {
                out.close_literal(span.start);
                out.literal_start = span.end;
                out.segments.push(Segment::Translated { span, demangled });
            }
            Err(err) => {
                // Left in the open literal span.
                debug!("leaving {:?} as is: {}", candidate, err);
            }
        }
    }
}

struct Segments {
    segments: Vec<Segment>,
    literal_start: usize,
}

impl Segments {
    fn close_literal(&mut self, end: usize) {
        if end > self.literal_start {
            self.segments.push(Segment::Literal(self.literal_start..end));
        }
        self.literal_start = end;
    }
}
