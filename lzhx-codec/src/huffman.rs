//! Per-block Huffman coding.
//!
//! A fresh tree is built for every block by repeatedly merging the two
//! lowest-frequency live nodes of a flat arena. The block format is:
//!
//! ```text
//! u32 LE symbol count | tree | codes | zero padding to a byte boundary
//! ```
//!
//! The tree is stored by shape: a leaf is bit 1 followed by its symbol, an
//! internal node is bit 0 followed by its right subtree, then its left one.
//! Codes are LSB-first, with bit `depth` set when the path turns right.
//! A block of one distinct symbol stores a single leaf and zero-length codes;
//! an empty block stores only the count.

use lzhx_core::bitstream::{BitReader, BitWriter};
use lzhx_core::buffer::BufferKind;
use lzhx_core::bytes::{read_u32_le, write_u32_le};
use lzhx_core::error::{LzhxError, Result};
use lzhx_core::{Codec, CodecStream, CodecType};

/// Default symbol width: byte alphabet.
pub const DEFAULT_SYMBOL_BITS: u8 = 8;

/// Longest code a block may use.
pub const MAX_CODE_BITS: u8 = 32;

/// Bytes preceding the tree.
const SIZE_BYTES: usize = 4;

/// Index into the node arena.
pub type NodeId = usize;

/// A node of the flat tree arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanNode {
    /// Symbol, meaningful for leaves only.
    pub symbol: u16,
    /// Frequency; zero once merged into a parent.
    pub freq: u32,
    /// Child reached by a 0 bit.
    pub left: Option<NodeId>,
    /// Child reached by a 1 bit.
    pub right: Option<NodeId>,
}

impl HuffmanNode {
    fn leaf(symbol: u16) -> Self {
        Self {
            symbol,
            ..Self::default()
        }
    }

    /// True if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Code of one symbol: the low `bit_count` bits of `bits`, LSB first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Code bits.
    pub bits: u32,
    /// Code length.
    pub bit_count: u8,
}

/// Huffman encoder/decoder with a reusable node arena.
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    symbol_bits: u8,
    alphabet_size: usize,
    nodes: Vec<HuffmanNode>,
    codes: Vec<HuffmanCode>,
    /// Allocation cursor into `nodes`.
    next_free: NodeId,
    total_in: u64,
    total_out: u64,
}

impl Default for HuffmanCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl HuffmanCodec {
    /// Create a codec over the byte alphabet.
    pub fn new() -> Self {
        Self::build(DEFAULT_SYMBOL_BITS)
    }

    /// Create a codec over an alphabet of `1 << symbol_bits` symbols.
    pub fn with_symbol_bits(symbol_bits: u8) -> Result<Self> {
        if symbol_bits == 0 || symbol_bits > DEFAULT_SYMBOL_BITS {
            return Err(LzhxError::configuration(format!(
                "symbol bits {symbol_bits} outside 1..={DEFAULT_SYMBOL_BITS}"
            )));
        }
        Ok(Self::build(symbol_bits))
    }

    fn build(symbol_bits: u8) -> Self {
        let alphabet_size = 1usize << symbol_bits;
        let mut codec = Self {
            symbol_bits,
            alphabet_size,
            nodes: vec![HuffmanNode::default(); 2 * alphabet_size],
            codes: vec![HuffmanCode::default(); alphabet_size],
            next_free: alphabet_size,
            total_in: 0,
            total_out: 0,
        };
        codec.reset();
        codec
    }

    /// Number of symbols in the alphabet.
    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Clear the arena and code table for a new block.
    pub fn reset(&mut self) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            *node = if i < self.alphabet_size {
                HuffmanNode::leaf(i as u16)
            } else {
                HuffmanNode::default()
            };
        }
        self.codes.fill(HuffmanCode::default());
        self.next_free = self.alphabet_size;
    }

    /// Code table built by the last [`encode`](Self::encode).
    pub fn codes(&self) -> &[HuffmanCode] {
        &self.codes
    }

    /// Node at `id`.
    pub fn node(&self, id: NodeId) -> Option<&HuffmanNode> {
        self.nodes.get(id)
    }

    /// Tally symbol occurrences into the leaves.
    pub fn count_frequencies(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            let symbol = usize::from(byte);
            if symbol >= self.alphabet_size {
                return Err(LzhxError::configuration(format!(
                    "symbol {byte} outside alphabet of {}",
                    self.alphabet_size
                )));
            }
            self.nodes[symbol].freq += 1;
        }
        Ok(())
    }

    /// The two live nodes of lowest frequency, lowest first.
    ///
    /// A linear scan over the arena; ties go to the lower index.
    fn lowest_pair(&self) -> (Option<NodeId>, Option<NodeId>) {
        let mut first: Option<NodeId> = None;
        let mut second: Option<NodeId> = None;

        for (id, node) in self.nodes[..self.next_free].iter().enumerate() {
            if node.freq == 0 {
                continue;
            }
            match first {
                Some(a) if node.freq >= self.nodes[a].freq => match second {
                    Some(b) if node.freq >= self.nodes[b].freq => {}
                    _ => second = Some(id),
                },
                _ => {
                    second = first;
                    first = Some(id);
                }
            }
        }
        (first, second)
    }

    /// Merge lowest pairs until one live node remains; returns the root.
    ///
    /// Returns `None` when no symbol was counted.
    pub fn build_tree(&mut self) -> Option<NodeId> {
        loop {
            match self.lowest_pair() {
                (None, _) => return None,
                (Some(root), None) => return Some(root),
                (Some(low), Some(high)) => {
                    let parent = self.next_free;
                    self.nodes[parent] = HuffmanNode {
                        symbol: 0,
                        freq: self.nodes[low].freq + self.nodes[high].freq,
                        left: Some(high),
                        right: Some(low),
                    };
                    self.nodes[low].freq = 0;
                    self.nodes[high].freq = 0;
                    self.next_free += 1;
                }
            }
        }
    }

    /// Assign codes to every leaf below `node`.
    pub fn make_codes(&mut self, node: NodeId, code: u32, bit_count: u8) -> Result<()> {
        let current = self.nodes[node];
        if current.is_leaf() {
            self.codes[usize::from(current.symbol)] = HuffmanCode {
                bits: code,
                bit_count,
            };
            return Ok(());
        }

        if bit_count >= MAX_CODE_BITS {
            return Err(LzhxError::configuration(
                "Huffman code longer than 32 bits; use a smaller block",
            ));
        }
        if let Some(right) = current.right {
            self.make_codes(right, code | (1 << bit_count), bit_count + 1)?;
        }
        if let Some(left) = current.left {
            self.make_codes(left, code, bit_count + 1)?;
        }
        Ok(())
    }

    /// Serialize the shape of the tree below `node`.
    pub fn write_tree(&self, node: NodeId, writer: &mut BitWriter<'_>) -> Result<()> {
        let current = self.nodes[node];
        match (current.left, current.right) {
            (Some(left), Some(right)) => {
                writer.write_bit(false)?;
                self.write_tree(right, writer)?;
                self.write_tree(left, writer)
            }
            _ => {
                writer.write_bit(true)?;
                writer.write_bits(u32::from(current.symbol), self.symbol_bits)
            }
        }
    }

    /// Hand out the next arena slot.
    ///
    /// Tree reading takes slots strictly in the order nodes appear in the
    /// serialized tree: a node, then its right subtree, then its left one.
    pub fn alloc_node(&mut self) -> Result<NodeId> {
        let id = self.next_free;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| LzhxError::corrupt(0, "Huffman tree larger than its alphabet"))?;
        *node = HuffmanNode::default();
        self.next_free += 1;
        Ok(id)
    }

    /// Rebuild a serialized tree; returns its root.
    pub fn read_tree(&mut self, reader: &mut BitReader<'_>) -> Result<NodeId> {
        let id = self.alloc_node()?;
        if reader.read_bit()? {
            let symbol = reader.read_bits(self.symbol_bits)? as u16;
            self.nodes[id] = HuffmanNode::leaf(symbol);
        } else {
            let right = self.read_tree(reader)?;
            let left = self.read_tree(reader)?;
            self.nodes[id].right = Some(right);
            self.nodes[id].left = Some(left);
        }
        Ok(id)
    }

    /// Walk from `root` to a leaf, one bit per internal node.
    pub fn decode_symbol(&self, root: NodeId, reader: &mut BitReader<'_>) -> Result<u16> {
        let mut id = root;
        loop {
            let node = &self.nodes[id];
            if node.is_leaf() {
                return Ok(node.symbol);
            }
            let next = if reader.read_bit()? { node.right } else { node.left };
            id = next.ok_or_else(|| LzhxError::corrupt(0, "Huffman node missing a child"))?;
        }
    }

    /// Encode `input` into `output`; returns the bytes written.
    pub fn encode(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let count = u32::try_from(input.len())
            .map_err(|_| LzhxError::configuration("Huffman block longer than 4 GiB"))?;
        write_u32_le(output, 0, count)?;

        self.reset();
        self.count_frequencies(input)?;
        let Some(root) = self.build_tree() else {
            return Ok(SIZE_BYTES);
        };
        self.make_codes(root, 0, 0)?;

        let mut writer = BitWriter::at(output, SIZE_BYTES);
        self.write_tree(root, &mut writer)?;
        for &byte in input {
            let code = self.codes[usize::from(byte)];
            writer.write_bits(code.bits, code.bit_count)?;
        }
        Ok(writer.bytes_used())
    }

    /// Decode a block from `input` into `output`; returns the symbol count.
    pub fn decode(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let count = read_u32_le(input, 0).map_err(|e| e.into_corrupt("Huffman header"))? as usize;
        if count > output.len() {
            return Err(LzhxError::corrupt(
                0,
                format!(
                    "Huffman block of {count} symbols exceeds buffer capacity {}",
                    output.len()
                ),
            ));
        }
        if count == 0 {
            return Ok(0);
        }

        self.reset();
        self.next_free = 0;
        let mut reader = BitReader::at(input, SIZE_BYTES);
        let root = self
            .read_tree(&mut reader)
            .map_err(|e| e.into_corrupt("Huffman tree"))?;
        for slot in &mut output[..count] {
            *slot = self
                .decode_symbol(root, &mut reader)
                .map_err(|e| e.into_corrupt("Huffman codes"))? as u8;
        }
        Ok(count)
    }
}

impl Codec for HuffmanCodec {
    fn codec_type(&self) -> CodecType {
        CodecType::Huffman
    }

    fn init_stream(&mut self, _stream: &mut CodecStream) {
        self.total_in = 0;
        self.total_out = 0;
    }

    fn compress_block(&mut self, stream: &mut CodecStream) -> Result<usize> {
        let out = stream.claim(BufferKind::Empty, BufferKind::Hf)?;
        let input = stream
            .find(BufferKind::Lz)
            .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Lz))?;

        let [source, target] = stream.many_mut([input, out])?;
        let written = self.encode(source.data(), target.storage_mut())?;
        target.set_size(written)?;
        self.total_in += source.size() as u64;
        self.total_out += written as u64;
        source.release();

        Ok(written)
    }

    fn decompress_block(&mut self, stream: &mut CodecStream) -> Result<usize> {
        let out = stream.claim(BufferKind::Empty, BufferKind::Lz)?;
        let input = stream
            .find(BufferKind::Hf)
            .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Hf))?;

        let [source, target] = stream.many_mut([input, out])?;
        let produced = self.decode(source.data(), target.storage_mut())?;
        target.set_size(produced)?;
        self.total_in += source.size() as u64;
        self.total_out += produced as u64;
        source.release();

        Ok(produced)
    }

    fn total_in(&self) -> u64 {
        self.total_in
    }

    fn total_out(&self) -> u64 {
        self.total_out
    }
}
