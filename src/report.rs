//! Console reporting of merge decisions.

use std::io::{self, Write};

use lmsp_core::{MergeEvent, MergeListener, MergeSummary};

/// Prints one aligned line per merge decision.
///
/// Write failures do not interrupt the merge; the first one is kept and
/// returned by [`ConsoleReporter::finish`].
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Print the closing summary line.
    ///
    /// # Errors
    /// The first write failure seen by this reporter.
    pub fn finish(mut self, summary: &MergeSummary) -> io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        writeln!(
            self.out,
            "{} linked, {} copied, {} deleted, {} calls remapped ({} blocks, {} comments inserted)",
            summary.links,
            summary.copies,
            summary.deletions,
            summary.remapped_calls,
            summary.inserted_blocks,
            summary.inserted_comments,
        )?;
        self.out.flush()
    }
}

impl<W: Write> MergeListener for ConsoleReporter<W> {
    fn on_event(&mut self, event: &MergeEvent) {
        if self.error.is_some() {
            return;
        }
        let action = event.action.to_string();
        let kind = event.kind.to_string();
        if let Err(err) = writeln!(self.out, "{action:<6} {kind:<9} {}", event.name) {
            self.error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmsp_core::{EventKind, MergeAction};

    #[test]
    fn aligned_lines_and_summary() {
        let mut buf = Vec::new();
        let mut reporter = ConsoleReporter::new(&mut buf);
        reporter.on_event(&MergeEvent::new(MergeAction::Link, EventKind::Variable, "speed"));
        reporter.on_event(
            &MergeEvent::new(MergeAction::Delete, EventKind::Procedure, "drive %s").old_id("d1"),
        );
        let summary = MergeSummary {
            links: 1,
            deletions: 1,
            ..MergeSummary::default()
        };
        reporter.finish(&summary).unwrap();
        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "LINK   variable  speed");
        assert_eq!(lines[1], "DELETE procedure drive %s");
        assert!(lines[2].starts_with("1 linked, 0 copied, 1 deleted"));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_error_is_returned() {
        let mut reporter = ConsoleReporter::new(Broken);
        reporter.on_event(&MergeEvent::new(MergeAction::Copy, EventKind::List, "xs"));
        let err = reporter.finish(&MergeSummary::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
