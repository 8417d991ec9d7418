use std::ops::Range;

use crate::PipelineError;

/// Splits `corpus_len` words into `n_mappers` contiguous half-open ranges.
///
/// Every range holds `corpus_len / n_mappers` words except the last, which
/// also takes the remainder. When the corpus is shorter than `n_mappers`
/// the leading ranges are empty.
pub fn partition(corpus_len: usize, n_mappers: usize) -> Result<Vec<Range<usize>>, PipelineError> {
    if n_mappers < 1 {
        return Err(PipelineError::invalid_config(
            "cannot partition a corpus across zero mappers",
        ));
    }

    let chunk = corpus_len / n_mappers;
    let ranges = (0..n_mappers)
        .map(|id| {
            let start = id * chunk;
            let end = if id == n_mappers - 1 {
                corpus_len
            } else {
                start + chunk
            };
            start..end
        })
        .collect();
    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split() {
        assert_eq!(
            partition(56, 4).unwrap(),
            vec![0..14, 14..28, 28..42, 42..56]
        );
    }

    #[test]
    fn last_range_absorbs_remainder() {
        assert_eq!(
            partition(56, 5).unwrap(),
            vec![0..11, 11..22, 22..33, 33..44, 44..56]
        );
    }

    #[test]
    fn short_corpus_yields_empty_ranges() {
        assert_eq!(partition(3, 5).unwrap(), vec![0..0, 0..0, 0..0, 0..0, 0..3]);
        assert_eq!(partition(0, 3).unwrap(), vec![0..0, 0..0, 0..0]);
    }

    #[test]
    fn ranges_cover_every_index_once() {
        for len in [0, 1, 7, 56, 101] {
            for n in 1..=16 {
                let ranges = partition(len, n).unwrap();
                assert_eq!(ranges.len(), n);
                let covered: Vec<usize> = ranges.into_iter().flatten().collect();
                assert_eq!(covered, (0..len).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn zero_mappers_is_invalid() {
        assert!(matches!(
            partition(10, 0),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
