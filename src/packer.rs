//! Greedy packing of text blocks into size-bounded chat payloads.
//!
//! Blocks are never split. A block that alone exceeds the ceiling is sent
//! on its own as an oversized payload and logged; it is not truncated or
//! dropped.

/// Length used for the ceiling check. Chat platforms count characters,
/// not bytes.
pub fn text_len(text: &str) -> usize {
    text.chars().count()
}

/// Pack `blocks` in order into the fewest payloads of at most `ceiling`
/// characters each, closing a payload as soon as the next block does not
/// fit.
pub fn pack_blocks<S: AsRef<str>>(blocks: &[S], ceiling: usize) -> Vec<String> {
    let mut payloads = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for block in blocks {
        let block = block.as_ref();
        let block_len = text_len(block);

        if block_len > ceiling {
            tracing::warn!(
                "Block of {} chars exceeds the {} char ceiling; sending it oversized",
                block_len,
                ceiling
            );
        }

        if buffer_len + block_len > ceiling && !buffer.is_empty() {
            payloads.push(std::mem::take(&mut buffer));
            buffer_len = 0;
        }

        buffer.push_str(block);
        buffer_len += block_len;
    }

    if !buffer.is_empty() {
        payloads.push(buffer);
    }

    payloads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(lens: &[usize]) -> Vec<String> {
        lens.iter()
            .enumerate()
            .map(|(i, len)| {
                let c = (b'a' + (i % 26) as u8) as char;
                std::iter::repeat(c).take(*len).collect()
            })
            .collect()
    }

    #[test]
    fn test_concatenation_preserved() {
        let input = blocks(&[5, 7, 3, 9, 1, 4]);
        let packed = pack_blocks(&input, 10);
        assert_eq!(packed.concat(), input.concat());
    }

    #[test]
    fn test_ceiling_respected() {
        let input = blocks(&[5, 5, 5, 4, 6, 10, 1]);
        let packed = pack_blocks(&input, 10);
        assert!(packed.iter().all(|p| text_len(p) <= 10));
        assert_eq!(
            packed.iter().map(|p| text_len(p)).collect::<Vec<_>>(),
            vec![10, 9, 6, 10, 1]
        );
    }

    #[test]
    fn test_exact_fit_stays_together() {
        let input = blocks(&[4, 6]);
        assert_eq!(pack_blocks(&input, 10).len(), 1);
    }

    #[test]
    fn test_oversized_block_sent_alone() {
        let input = blocks(&[3, 25, 3]);
        let packed = pack_blocks(&input, 10);
        assert_eq!(packed.len(), 3);
        assert_eq!(text_len(&packed[1]), 25);
        assert_eq!(packed.concat(), input.concat());
    }

    #[test]
    fn test_empty_input() {
        let input: Vec<String> = Vec::new();
        assert!(pack_blocks(&input, 2000).is_empty());
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let input = vec!["ééééé", "üüüüü"];
        assert_eq!(pack_blocks(&input, 10).len(), 1);
    }

    #[test]
    fn test_greedy_payload_count() {
        // greedy left-to-right: [6], [6,3], [8,2], [2,2]
        let input = blocks(&[6, 6, 3, 8, 2, 2, 2]);
        let packed = pack_blocks(&input, 10);
        assert_eq!(packed.len(), 4);
    }
}
