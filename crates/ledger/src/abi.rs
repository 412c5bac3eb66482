//! Minimal Solidity ABI codec for the `items(uint256)` getter.

use sha3::{Digest, Keccak256};
use thiserror::Error;

use dappazon_core::domain::catalog::{CatalogEntry, Category, EntryId};

pub const WORD: usize = 32;
pub const ITEMS_SIGNATURE: &str = "items(uint256)";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("return data is not valid hex: {0}")]
    Hex(String),
    #[error("return data too short: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("field `{field}` does not fit in {bits} bits")]
    Overflow { field: &'static str, bits: u32 },
    #[error("field `{field}` is not valid utf-8")]
    Utf8 { field: &'static str },
}

pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Calldata for `items(id)`, hex encoded with a `0x` prefix.
pub fn encode_items_call(id: u64) -> String {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(ITEMS_SIGNATURE));
    data.extend_from_slice(&encode_u64_word(id));
    format!("0x{}", hex::encode(data))
}

fn encode_u64_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn decode_hex(raw: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|error| AbiError::Hex(error.to_string()))
}

/// Decodes the `(id, name, category, image, cost, rating, stock)` tuple.
/// A zero id means the slot was never listed and yields `None`.
pub fn decode_item(data: &[u8]) -> Result<Option<CatalogEntry>, AbiError> {
    let id = read_u64(data, 0, "id")?;
    if id == 0 {
        return Ok(None);
    }

    let name = read_string(data, 1, "name")?;
    let category = read_string(data, 2, "category")?;
    let price_wei = read_u128(data, 4, "cost")?;
    let rating = read_u64(data, 5, "rating")?;
    let rating =
        u8::try_from(rating).map_err(|_| AbiError::Overflow { field: "rating", bits: 8 })?;
    let stock = read_u64(data, 6, "stock")?;

    Ok(Some(CatalogEntry {
        id: EntryId(id),
        name,
        category: Category::parse(&category),
        price_wei,
        rating,
        stock,
    }))
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset
        .checked_add(WORD)
        .ok_or(AbiError::Truncated { needed: usize::MAX, actual: data.len() })?;
    data.get(offset..end).ok_or(AbiError::Truncated { needed: end, actual: data.len() })
}

fn read_u128(data: &[u8], index: usize, field: &'static str) -> Result<u128, AbiError> {
    let word = word_at(data, index * WORD)?;
    word_to_u128(word, field)
}

fn read_u64(data: &[u8], index: usize, field: &'static str) -> Result<u64, AbiError> {
    let value = read_u128(data, index, field)?;
    u64::try_from(value).map_err(|_| AbiError::Overflow { field, bits: 64 })
}

fn word_to_u128(word: &[u8], field: &'static str) -> Result<u128, AbiError> {
    let (high, low) = word.split_at(WORD - 16);
    if high.iter().any(|byte| *byte != 0) {
        return Err(AbiError::Overflow { field, bits: 128 });
    }
    let mut buf = [0u8; 16];
    buf.copy_from_slice(low);
    Ok(u128::from_be_bytes(buf))
}

fn read_string(data: &[u8], index: usize, field: &'static str) -> Result<String, AbiError> {
    let offset = read_u64(data, index, field)?;
    let offset =
        usize::try_from(offset).map_err(|_| AbiError::Overflow { field, bits: usize::BITS })?;
    let length = word_to_u128(word_at(data, offset)?, field)?;
    let length =
        usize::try_from(length).map_err(|_| AbiError::Overflow { field, bits: usize::BITS })?;

    let start = offset + WORD;
    let end = start.checked_add(length).ok_or(AbiError::Overflow { field, bits: usize::BITS })?;
    let bytes =
        data.get(start..end).ok_or(AbiError::Truncated { needed: end, actual: data.len() })?;

    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::Utf8 { field })
}

#[cfg(test)]
pub(crate) mod tests {
    use dappazon_core::domain::catalog::{Category, EntryId};

    use super::{decode_hex, decode_item, encode_items_call, selector, AbiError, WORD};

    fn u128_word(value: u128) -> Vec<u8> {
        let mut word = vec![0u8; WORD - 16];
        word.extend_from_slice(&value.to_be_bytes());
        word
    }

    fn string_tail(value: &str) -> Vec<u8> {
        let mut tail = u128_word(value.len() as u128);
        let mut body = value.as_bytes().to_vec();
        let padded = body.len().div_ceil(WORD) * WORD;
        body.resize(padded, 0);
        tail.extend(body);
        tail
    }

    /// ABI-encodes an item tuple the way the contract getter returns it.
    pub(crate) fn encode_item(
        id: u128,
        name: &str,
        category: &str,
        cost: u128,
        rating: u128,
        stock: u128,
    ) -> Vec<u8> {
        let tails = [string_tail(name), string_tail(category), string_tail("ipfs://image")];
        let head_len = 7 * WORD;
        let name_offset = head_len;
        let category_offset = name_offset + tails[0].len();
        let image_offset = category_offset + tails[1].len();

        let mut data = Vec::new();
        data.extend(u128_word(id));
        data.extend(u128_word(name_offset as u128));
        data.extend(u128_word(category_offset as u128));
        data.extend(u128_word(image_offset as u128));
        data.extend(u128_word(cost));
        data.extend(u128_word(rating));
        data.extend(u128_word(stock));
        for tail in tails {
            data.extend(tail);
        }
        data
    }

    #[test]
    fn selector_matches_known_erc20_transfer() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn items_call_is_selector_plus_one_word() {
        let call = encode_items_call(2);
        let bytes = decode_hex(&call).expect("hex");

        assert!(call.starts_with("0x"));
        assert_eq!(bytes.len(), 4 + WORD);
        assert_eq!(&bytes[..4], &selector("items(uint256)"));
        assert_eq!(bytes[4 + WORD - 1], 2);
        assert!(bytes[4..4 + WORD - 1].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn decodes_listed_item() {
        let data = encode_item(2, "Drone", "electronics", 2_000_000_000_000_000_000, 5, 6);
        let entry = decode_item(&data).expect("decode").expect("listed");

        assert_eq!(entry.id, EntryId(2));
        assert_eq!(entry.name, "Drone");
        assert_eq!(entry.category, Category::Electronics);
        assert_eq!(entry.price_wei, 2_000_000_000_000_000_000);
        assert_eq!(entry.rating, 5);
        assert_eq!(entry.stock, 6);
    }

    #[test]
    fn zero_id_is_an_unlisted_slot() {
        let data = encode_item(0, "", "", 0, 0, 0);
        assert_eq!(decode_item(&data), Ok(None));
    }

    #[test]
    fn truncated_or_oversized_words_are_decode_errors() {
        assert!(matches!(decode_item(&[0u8; 10]), Err(AbiError::Truncated { .. })));

        let mut data = encode_item(1, "Camera", "electronics", 1, 4, 10);
        data[5 * WORD] = 1;
        assert_eq!(decode_item(&data), Err(AbiError::Overflow { field: "rating", bits: 128 }));

        let data = encode_item(1, "Camera", "electronics", 1, 300, 10);
        assert_eq!(decode_item(&data), Err(AbiError::Overflow { field: "rating", bits: 8 }));
    }

    #[test]
    fn empty_return_data_is_rejected() {
        let bytes = decode_hex("0x").expect("hex");
        assert!(matches!(decode_item(&bytes), Err(AbiError::Truncated { .. })));
    }
}
