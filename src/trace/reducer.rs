//! Collapse runs of adjacent duplicate frames.

use super::frame::{Frame, FrameSequence};

/// Collapse maximal runs of consecutive frames with the same site
/// (class, file, line) into their first member.
pub fn reduce(sequence: &FrameSequence) -> FrameSequence {
    let frames = collapse_runs(
        sequence.frames().to_vec(),
        |frame| frame,
        |_, _| {},
    );
    FrameSequence::new(frames).unwrap_or_else(|| sequence.clone())
}

/// Generic run collapse used by [`reduce`] and by the assembler, which folds
/// its anchor marker into the surviving run member.
pub(super) fn collapse_runs<T>(
    items: Vec<T>,
    frame_of: impl Fn(&T) -> &Frame,
    mut merge: impl FnMut(&mut T, T),
) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        match out.last_mut() {
            Some(last) if frame_of(last).same_site(frame_of(&item)) => merge(last, item),
            _ => out.push(item),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::FileName;

    fn f(class: &str, method: &str, line: u32) -> Frame {
        Frame::new(class, method, FileName::Source("F.java".to_string()), line)
    }

    fn seq(frames: Vec<Frame>) -> FrameSequence {
        FrameSequence::new(frames).unwrap()
    }

    #[test]
    fn test_collapses_adjacent_runs_only() {
        let s = seq(vec![
            f("A", "a", 1),
            f("A", "a", 1),
            f("A", "other", 1),
            f("B", "b", 2),
            f("A", "a", 1),
        ]);
        let reduced = reduce(&s);
        assert_eq!(
            reduced.frames(),
            &[f("A", "a", 1), f("B", "b", 2), f("A", "a", 1)]
        );
    }

    #[test]
    fn test_reduce_is_idempotent() {
        let inputs = [
            vec![f("A", "a", 1)],
            vec![f("A", "a", 1), f("A", "a", 1), f("A", "a", 1)],
            vec![
                f("A", "a", 1),
                f("B", "b", 1),
                f("B", "c", 1),
                f("A", "a", 1),
                f("A", "a", 2),
            ],
        ];
        for frames in inputs {
            let once = reduce(&seq(frames));
            assert_eq!(reduce(&once), once);
        }
    }
}
