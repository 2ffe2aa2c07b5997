//! Storage slot key derivation for mapping entries.
//!
//! A mapping value lives at `keccak256(abi.encode(slot, key))`, and nested
//! mappings chain that hash: the result of one step becomes the slot of the
//! next. [`SlotPath`] captures a base slot plus an ordered key path and
//! folds it into the final [`StorageKey`].

use alloy_primitives::{keccak256, Address, B256, U256};

/// A derived storage key, ready for `eth_getProof`.
pub type StorageKey = B256;

/// One mapping key along a slot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKey {
    /// Key encoded as a 32-byte big-endian unsigned integer.
    Uint(U256),
    /// Key encoded as an address left-padded to 32 bytes.
    Address(Address),
}

impl SlotKey {
    fn to_word(self) -> [u8; 32] {
        match self {
            SlotKey::Uint(value) => value.to_be_bytes::<32>(),
            SlotKey::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr.as_slice());
                word
            }
        }
    }
}

/// Hash one mapping step: the current slot (or accumulated key) plus one
/// mapping key, ABI-encoded as two 32-byte words.
pub fn mapping_key(slot: B256, key: SlotKey) -> StorageKey {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(slot.as_slice());
    buf[32..].copy_from_slice(&key.to_word());
    keccak256(buf)
}

/// Builder for a storage key path: a base slot and zero or more mapping
/// keys applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPath {
    base_slot: U256,
    keys: Vec<SlotKey>,
}

impl SlotPath {
    pub fn new(base_slot: U256) -> Self {
        Self {
            base_slot,
            keys: Vec::new(),
        }
    }

    pub fn key_uint(mut self, key: U256) -> Self {
        self.keys.push(SlotKey::Uint(key));
        self
    }

    pub fn key_address(mut self, key: Address) -> Self {
        self.keys.push(SlotKey::Address(key));
        self
    }

    /// Fold the path into the storage key. With no keys this is just the
    /// base slot as a 32-byte word.
    pub fn derive(&self) -> StorageKey {
        let mut acc = B256::from(self.base_slot.to_be_bytes::<32>());
        for key in &self.keys {
            acc = mapping_key(acc, *key);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn bare_slot_is_base_word() {
        let key = SlotPath::new(U256::from(7u64)).derive();
        let mut expected = [0u8; 32];
        expected[31] = 7;
        assert_eq!(key, B256::from(expected));
    }

    #[test]
    fn zero_slot_zero_key_pins_keccak_of_64_zero_bytes() {
        let key = SlotPath::new(U256::ZERO).key_uint(U256::ZERO).derive();
        assert_eq!(
            key,
            b256!("ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5")
        );
    }

    #[test]
    fn derivation_is_deterministic() {
        let path = SlotPath::new(U256::from(3u64))
            .key_address(Address::repeat_byte(0xaa))
            .key_uint(U256::from(42u64));
        assert_eq!(path.derive(), path.derive());
    }

    #[test]
    fn transposed_keys_derive_different_slots() {
        let forward = SlotPath::new(U256::from(3u64))
            .key_uint(U256::from(1u64))
            .key_uint(U256::from(2u64))
            .derive();
        let reversed = SlotPath::new(U256::from(3u64))
            .key_uint(U256::from(2u64))
            .key_uint(U256::from(1u64))
            .derive();
        assert_ne!(forward, reversed);
    }

    #[test]
    fn address_key_matches_padded_uint_key() {
        let addr = Address::repeat_byte(0x42);
        let as_addr = SlotPath::new(U256::from(5u64)).key_address(addr).derive();
        let as_uint = SlotPath::new(U256::from(5u64))
            .key_uint(U256::from_be_slice(addr.as_slice()))
            .derive();
        assert_eq!(as_addr, as_uint);
    }

    #[test]
    fn nested_path_matches_manual_fold() {
        let addr = Address::repeat_byte(0x11);
        let path = SlotPath::new(U256::from(2u64))
            .key_address(addr)
            .key_uint(U256::from(9u64))
            .derive();

        let step1 = mapping_key(
            B256::from(U256::from(2u64).to_be_bytes::<32>()),
            SlotKey::Address(addr),
        );
        let step2 = mapping_key(step1, SlotKey::Uint(U256::from(9u64)));
        assert_eq!(path, step2);
    }
}
