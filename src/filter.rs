use std::io::{self, BufRead, Write};

use log::trace;

use crate::{Demangler, LineScanner};

/// Counters collected while filtering a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub lines: usize,
    pub translated: usize,
}

/// Copies `reader` to `writer` line by line, demangling embedded names.
///
/// Lines end at `\n`, which is not part of the scanned text. Every input
/// line produces exactly one `\n`-terminated output line, in order. Only
/// one line is held in memory at a time.
pub fn filter_lines<R, W, D>(
    mut reader: R,
    mut writer: W,
    scanner: &LineScanner<D>,
    brackets: bool,
) -> io::Result<FilterStats>
where
    R: BufRead,
    W: Write,
    D: Demangler,
{
    let mut stats = FilterStats::default();
    let mut line = Vec::new();
    let mut out = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }

        out.clear();
        let translated = scanner.scan_bytes(&line, brackets, &mut out);
        out.push(b'\n');
        writer.write_all(&out)?;

        stats.lines += 1;
        stats.translated += translated;
        trace!("line {}: {} name(s) demangled", stats.lines, translated);
    }

    writer.flush()?;
    Ok(stats)
}
