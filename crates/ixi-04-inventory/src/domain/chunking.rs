//! `Inventory` message framing: `varint(count) ‖ items`.
//!
//! Chunks respect both the byte limit and the item limit. An item that
//! would overflow the current chunk starts the next one; a single item
//! larger than the byte limit travels alone.

use super::errors::InventoryError;
use shared_types::{varint_len, BinaryReader, BinaryWriter, InventoryItem};

pub fn encode_inventory_chunks(
    items: &[InventoryItem],
    max_message_size: usize,
    max_items_per_chunk: usize,
) -> Vec<Vec<u8>> {
    let max_items = max_items_per_chunk.max(1);
    let mut chunks = Vec::new();
    let mut body = BinaryWriter::new();
    let mut count = 0usize;

    for item in items {
        let encoded = item.encode();
        let projected = varint_len(count as u64 + 1) + body.len() + encoded.len();
        if count > 0 && (count == max_items || projected > max_message_size) {
            chunks.push(finish_chunk(count, body));
            body = BinaryWriter::new();
            count = 0;
        }
        body.write_raw(&encoded);
        count += 1;
    }
    if count > 0 {
        chunks.push(finish_chunk(count, body));
    }
    chunks
}

fn finish_chunk(count: usize, body: BinaryWriter) -> Vec<u8> {
    let mut chunk = BinaryWriter::with_capacity(varint_len(count as u64) + body.len());
    chunk.write_varint(count as u64).write_raw(body.as_bytes());
    chunk.into_bytes()
}

/// Decodes one chunk, verifying every item's declared hash.
pub fn decode_inventory(
    bytes: &[u8],
    max_items: usize,
) -> Result<Vec<InventoryItem>, InventoryError> {
    let mut reader = BinaryReader::new(bytes);
    let count = reader.read_varint()? as usize;
    if count > max_items {
        return Err(InventoryError::TooManyItems {
            count,
            max: max_items,
        });
    }
    (0..count)
        .map(|_| InventoryItem::decode_from(&mut reader).map_err(InventoryError::from))
        .collect()
}
