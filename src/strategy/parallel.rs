//! Parallel Batch Annotation
//!
//! Uses Rayon to parse and annotate independent documents concurrently.
//! Each document gets its own scanner, recorder and queue, so nothing is
//! shared between workers.

use rayon::prelude::*;

use super::annotated::{element_lines, parse_with_lines, ParseOptions};
use crate::error::Error;

/// Owned (name, line) pairs for one document
pub type ElementLines = Vec<(String, u32)>;

/// Parse every input in parallel, returning each document's element lines.
///
/// Results are in input order; one failing document does not affect others.
pub fn element_lines_parallel<I>(inputs: &[I], options: &ParseOptions) -> Vec<Result<ElementLines, Error>>
where
    I: AsRef<[u8]> + Sync,
{
    inputs
        .par_iter()
        .map(|input| {
            let doc = parse_with_lines(input.as_ref(), options)?;
            Ok(element_lines(&doc)
                .into_iter()
                .map(|(name, line)| (name.into_owned(), line))
                .collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Mismatch, PositionError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_batch_preserves_order() {
        let inputs: Vec<String> = (0..64)
            .map(|i| format!("{}<doc{}/>", "\n".repeat(i), i))
            .collect();
        let results = element_lines_parallel(&inputs, &ParseOptions::default());

        assert_eq!(results.len(), 64);
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap(), vec![(format!("doc{}", i), i as u32 + 1)]);
        }
    }

    #[test]
    fn test_batch_isolates_failures() {
        let inputs: [&[u8]; 3] = [b"<a/>", b"", b"<b>\n<c/></b>"];
        let results = element_lines_parallel(&inputs, &ParseOptions::default());

        assert_eq!(results[0], Ok(vec![("a".to_string(), 1)]));
        assert_eq!(
            results[1],
            Err(Error::Position(PositionError::mismatch(Mismatch::NoRootElement)))
        );
        assert_eq!(
            results[2],
            Ok(vec![("b".to_string(), 1), ("c".to_string(), 2)])
        );
    }

    #[test]
    fn test_batch_lists_every_element() {
        let inputs: [&[u8]; 1] = [b"<a>\n<\xfe\xff/>\n<c/></a>"];
        let results = element_lines_parallel(&inputs, &ParseOptions::default());
        let lines: Vec<u32> = results[0].as_ref().unwrap().iter().map(|(_, l)| *l).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_batch_strict() {
        let inputs = ["<a></b>", "<a/>"];
        let results = element_lines_parallel(&inputs, &ParseOptions::strict());
        assert!(matches!(results[0], Err(Error::Parse(_))));
        assert!(results[1].is_ok());
    }
}
