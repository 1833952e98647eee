use std::num::NonZeroUsize;

/// Splits `items` into contiguous chunks of at most `max_batch_size`.
///
/// Concatenating the chunks in order reproduces `items`. Empty input yields
/// no chunks.
#[must_use]
pub fn batch<T>(items: &[T], max_batch_size: NonZeroUsize) -> Vec<&[T]> {
    items.chunks(max_batch_size.get()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let items: Vec<u32> = Vec::new();
        assert!(batch(&items, size(4)).is_empty());
    }

    #[test]
    fn chunks_concatenate_to_input_and_respect_limit() {
        for len in 1..=20usize {
            let items: Vec<usize> = (0..len).collect();
            for max in 1..=7usize {
                let chunks = batch(&items, size(max));
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= max));
                let joined: Vec<usize> = chunks.concat();
                assert_eq!(joined, items, "len={len} max={max}");
                assert_eq!(chunks.len(), len.div_ceil(max));
            }
        }
    }

    #[test]
    fn single_chunk_when_limit_exceeds_input() {
        let items = ["a", "b", "c"];
        let chunks = batch(&items, size(128));
        assert_eq!(chunks, vec![&items[..]]);
    }
}
