//! Misc utils

use ethers::{
    types::{Address, Bytes, U256},
    utils::to_checksum,
};
use serde::{de, Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// Converts Option address to checksum
pub fn as_checksum_addr_opt<S>(val: &Option<Address>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if let Some(addr) = val {
        s.serialize_str(&to_checksum(addr, None))
    } else {
        s.serialize_none()
    }
}

/// Serializes U256 as a 0x-prefixed lowercase hex quantity (zero is "0x0")
pub fn as_hex_quantity<S>(val: &U256, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&to_hex_quantity(val))
}

/// Formats U256 as a 0x-prefixed lowercase hex quantity (zero is "0x0")
pub fn to_hex_quantity(val: &U256) -> String {
    format!("0x{val:x}")
}

/// Parses a JSON-RPC quantity
///
/// Accepts hex strings (an empty "0x" is zero), decimal strings and JSON numbers. A missing value
/// is zero.
pub fn parse_quantity(value: Option<&Value>) -> Result<U256, String> {
    match value {
        None | Some(Value::Null) => Ok(U256::zero()),
        Some(Value::String(s)) => parse_quantity_str(s),
        Some(Value::Number(n)) => {
            n.as_u64().map(U256::from).ok_or_else(|| format!("quantity {n} is not an unsigned integer"))
        }
        Some(other) => Err(format!("unexpected quantity {other}")),
    }
}

fn parse_quantity_str(s: &str) -> Result<U256, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_str_radix(hex, 16).map_err(|e| format!("invalid hex quantity {s}: {e}"))
    } else if s.is_empty() {
        Ok(U256::zero())
    } else {
        U256::from_dec_str(s).map_err(|e| format!("invalid quantity {s}: {e}"))
    }
}

/// Serde helpers for optional integers carried as decimal strings (e.g. `"1000000000000000"`)
pub mod decimal_u256_opt {
    use super::*;

    pub fn serialize<S>(val: &Option<U256>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match val {
            Some(v) => s.serialize_str(&v.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<U256>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(d)?;
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => parse_quantity(Some(&v)).map(Some).map_err(de::Error::custom),
        }
    }
}

/// If possible, parses address from the first 20 bytes
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Packs factory address and factory call data into init code
pub fn pack_factory_data(factory: Address, factory_data: &Bytes) -> Bytes {
    if factory.is_zero() {
        Bytes::default()
    } else {
        [factory.0.to_vec(), factory_data.to_vec()].concat().into()
    }
}

/// Splits init code into factory address and factory call data
pub fn unpack_factory_data(init_code: &[u8]) -> (Address, Bytes) {
    if init_code.len() > 20 {
        (Address::from_slice(&init_code[0..20]), Bytes::from(init_code[20..].to_vec()))
    } else {
        (Address::default(), Bytes::default())
    }
}
