//! Hash-chain match finder.
//!
//! Positions are indexed by an FNV-1a hash of the `H` bytes starting there.
//! Each lookup bucket is a fixed head node holding the most recent position
//! for that hash; older positions hang off the head in a doubly linked chain
//! whose nodes come from a cyclic arena the size of the match window. When
//! the arena wraps, the slot being reused is unlinked from whatever chain it
//! sits in, so memory stays bounded and stale entries age out on their own.
//!
//! Heads and arena nodes share one `Vec`: indices `0..lookup_capacity` are
//! bucket heads, the rest is the arena. Links are plain indices.

use lzhx_core::error::Result;
use lzhx_core::hash::Fnv1a;
use lzhx_core::{CodecSettings, DictionaryBuffer};

/// A back-reference candidate: ring position and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Match {
    /// Ring position of the first matching byte.
    pub position: usize,
    /// Number of matching bytes (0 means no match).
    pub length: usize,
}

impl Match {
    /// True when no bytes matched.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A chain node. `position == None` marks a node that holds nothing.
#[derive(Debug, Clone, Copy, Default)]
struct ChainNode {
    position: Option<u32>,
    next: Option<u32>,
    prev: Option<u32>,
}

/// Incremental index of dictionary positions keyed by prefix hash.
#[derive(Debug, Clone)]
pub struct MatchFinder {
    nodes: Vec<ChainNode>,
    /// Number of bucket heads at the front of `nodes`.
    lookup_capacity: usize,
    lookup_mask: usize,
    /// Next arena slot to hand out, relative to `lookup_capacity`.
    next_slot: usize,
    arena_mask: usize,
    hash_len: usize,
    max_match_len: usize,
    run_limit: usize,
}

impl MatchFinder {
    /// Allocate heads and arena for `settings`.
    ///
    /// Fails with `Configuration` if the settings do not validate.
    pub fn new(settings: &CodecSettings) -> Result<Self> {
        settings.validate()?;
        let lookup_capacity = settings.lookup_capacity();
        let arena_size = settings.window_size();

        Ok(Self {
            nodes: vec![ChainNode::default(); lookup_capacity + arena_size],
            lookup_capacity,
            lookup_mask: settings.lookup_mask(),
            next_slot: 0,
            arena_mask: arena_size - 1,
            hash_len: settings.hash_len(),
            max_match_len: settings.max_match_len(),
            run_limit: settings.run_limit(),
        })
    }

    /// Drop every indexed position.
    pub fn reset(&mut self) {
        self.nodes.fill(ChainNode::default());
        self.next_slot = 0;
    }

    /// Bucket for the first `H` bytes of `prefix`.
    #[inline]
    pub fn hash(&self, prefix: &[u8]) -> usize {
        Fnv1a::compute(&prefix[..self.hash_len]) as usize & self.lookup_mask
    }

    /// Index `input[pos..]` under the dictionary's current write position.
    ///
    /// Must be called right before the byte at `pos` is appended to
    /// `dictionary`. Does nothing when `H` or fewer bytes remain.
    pub fn insert(&mut self, input: &[u8], pos: usize, dictionary: &DictionaryBuffer) {
        if input.len().saturating_sub(pos) <= self.hash_len {
            return;
        }

        let head = self.hash(&input[pos..]);
        if self.nodes[head].position.is_some() {
            self.demote_head(head);
        }

        let node = &mut self.nodes[head];
        node.position = Some(dictionary.position() as u32);
        node.prev = None;
    }

    /// Move the head's entry into the next arena slot, right behind the head.
    fn demote_head(&mut self, head: usize) {
        let slot = self.lookup_capacity + self.next_slot;
        self.next_slot = (self.next_slot + 1) & self.arena_mask;

        self.unlink(slot);

        // Read the head only now: the reused slot may have been its successor.
        let old = self.nodes[head];
        self.nodes[slot] = ChainNode {
            position: old.position,
            next: old.next,
            prev: Some(head as u32),
        };
        if let Some(next) = old.next {
            self.nodes[next as usize].prev = Some(slot as u32);
        }
        self.nodes[head].next = Some(slot as u32);
    }

    /// Detach `index` from its chain, joining its neighbours.
    fn unlink(&mut self, index: usize) {
        let ChainNode { next, prev, .. } = self.nodes[index];
        if let Some(prev) = prev {
            self.nodes[prev as usize].next = next;
        }
        if let Some(next) = next {
            self.nodes[next as usize].prev = prev;
        }
        self.nodes[index] = ChainNode::default();
    }

    /// Longest earlier occurrence of the bytes at `input[pos..]`.
    ///
    /// Walks at most `run_limit` chain nodes. A candidate replaces the best
    /// so far only if strictly longer, so on ties the most recent wins. A
    /// match never reaches the last byte of `input`, never crosses the end of
    /// the ring and never exceeds the maximum match length.
    pub fn find(&self, input: &[u8], pos: usize, dictionary: &DictionaryBuffer) -> Match {
        let mut best = Match::default();
        if pos == 0 || input.len().saturating_sub(pos) <= self.hash_len {
            return best;
        }

        let input_limit = input.len() - 1 - pos;
        let history = dictionary.len();
        let mut current = Some(self.hash(&input[pos..]));
        let mut runs = 0;

        while let Some(index) = current {
            if runs == self.run_limit {
                break;
            }
            runs += 1;

            let node = &self.nodes[index];
            if let Some(start) = node.position {
                let start = start as usize;
                let limit = input_limit
                    .min(history.saturating_sub(1).saturating_sub(start))
                    .min(self.max_match_len);

                let mut length = 0;
                while length < limit && input[pos + length] == dictionary.get_byte(start + length)
                {
                    length += 1;
                }

                if best.length < length {
                    best = Match {
                        position: start,
                        length,
                    };
                }
            }
            current = node.next.map(|n| n as usize);
        }

        best
    }

    /// Number of entries reachable from the bucket of `prefix`, for tests and diagnostics.
    pub fn chain_len(&self, prefix: &[u8]) -> usize {
        let mut count = 0;
        let mut current = Some(self.hash(prefix));
        while let Some(index) = current {
            if self.nodes[index].position.is_some() {
                count += 1;
            }
            current = self.nodes[index].next.map(|n| n as usize);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CodecSettings {
        CodecSettings::default()
            .with_lookup_bits(10)
            .with_match_pos_bits(8)
            .with_hash_len(3)
    }

    /// Index and append every byte of `input`, like the encoder's literal path.
    fn feed(finder: &mut MatchFinder, dict: &mut DictionaryBuffer, input: &[u8]) {
        for pos in 0..input.len() {
            finder.insert(input, pos, dict);
            dict.put_byte(input[pos]);
        }
    }

    #[test]
    fn test_rejects_oversized_window() {
        let settings = CodecSettings::default().with_match_pos_bits(64);
        assert!(matches!(
            MatchFinder::new(&settings),
            Err(lzhx_core::LzhxError::Configuration { .. })
        ));
    }

    #[test]
    fn test_no_match_at_start_or_tail() {
        let settings = settings();
        let finder = MatchFinder::new(&settings).unwrap();
        let dict = DictionaryBuffer::new(settings.window_size());
        let input = b"abcdefgh";

        assert!(finder.find(input, 0, &dict).is_empty());
        // Only H bytes left.
        assert!(finder.find(input, 5, &dict).is_empty());
    }

    #[test]
    fn test_finds_repeat() {
        let settings = settings();
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());
        let input = b"hello world, hello world!";

        feed(&mut finder, &mut dict, &input[..13]);
        let found = finder.find(input, 13, &dict);
        assert_eq!(found.position, 0);
        // The last input byte never takes part in a match.
        assert_eq!(found.length, 11);
    }

    #[test]
    fn test_prefers_longer_then_most_recent() {
        let settings = settings();
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());
        let input = b"abcX..abcY..abcY..abcYZ";

        feed(&mut finder, &mut dict, &input[..18]);
        let found = finder.find(input, 18, &dict);
        // "abcY" occurs at 6 and 12; both give 4 bytes, the more recent wins.
        assert_eq!(found.length, 4);
        assert_eq!(found.position, 12);
    }

    #[test]
    fn test_run_limit_bounds_search() {
        let settings = settings().with_runs_bits(0);
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());
        let input = b"abcdefg_abcdxx_abcdefg";

        feed(&mut finder, &mut dict, &input[..15]);
        // With a single step only the most recent "abc" (at 8) is examined.
        let found = finder.find(input, 15, &dict);
        assert_eq!(found.position, 8);
        assert_eq!(found.length, 4);
    }

    #[test]
    fn test_arena_wrap_keeps_chains_bounded() {
        let settings = settings();
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());
        let input = vec![b'z'; 2000];

        feed(&mut finder, &mut dict, &input);
        // Head plus at most one arena's worth of demoted entries.
        assert!(finder.chain_len(b"zzz") <= settings.window_size() + 1);
        assert!(finder.chain_len(b"zzz") > 1);
    }

    #[test]
    fn test_match_bounds() {
        let settings = settings();
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());

        let mut input = Vec::new();
        let mut seed: u32 = 12345;
        for _ in 0..3000 {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            input.push(b"aab"[(seed >> 16) as usize % 3]);
        }

        for pos in 0..input.len() {
            let found = finder.find(&input, pos, &dict);
            assert!(found.length <= settings.max_match_len());
            assert!(found.position < settings.window_size());
            if !found.is_empty() {
                assert!(found.position + found.length < dict.len());
                for k in 0..found.length {
                    assert_eq!(dict.get_byte(found.position + k), input[pos + k]);
                }
            }
            finder.insert(&input, pos, &dict);
            dict.put_byte(input[pos]);
        }
    }

    #[test]
    fn test_reset() {
        let settings = settings();
        let mut finder = MatchFinder::new(&settings).unwrap();
        let mut dict = DictionaryBuffer::new(settings.window_size());
        feed(&mut finder, &mut dict, b"abcabcabc");
        assert!(finder.chain_len(b"abc") > 0);

        finder.reset();
        assert_eq!(finder.chain_len(b"abc"), 0);
    }
}
