//! Bluetooth UUID parsing
//!
//! Services and characteristics are commonly written in their 16-bit or
//! 32-bit short form ("180D", "0x2A37"). Short forms expand onto the Bluetooth
//! base UUID `0000xxxx-0000-1000-8000-00805f9b34fb`.

use uuid::Uuid;

use crate::errors::{LinkError, LinkResult};

/// Bluetooth SIG base UUID
pub const BLUETOOTH_BASE_UUID: Uuid = Uuid::from_u128(0x0000_0000_0000_1000_8000_0080_5f9b_34fb);

/// Expand a 16-bit assigned number onto the base UUID
pub const fn uuid_from_u16(short: u16) -> Uuid {
    uuid_from_u32(short as u32)
}

/// Expand a 32-bit assigned number onto the base UUID
pub const fn uuid_from_u32(short: u32) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID.as_u128() | ((short as u128) << 96))
}

/// Parse a UUID in full, 16-bit or 32-bit form
pub fn parse_uuid(input: &str) -> LinkResult<Uuid> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let invalid = || LinkError::InvalidUuid(input.to_string());

    if matches!(digits.len(), 4 | 8) && !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match digits.len() {
        4 => u16::from_str_radix(digits, 16)
            .map(uuid_from_u16)
            .map_err(|_| invalid()),
        8 => u32::from_str_radix(digits, 16)
            .map(uuid_from_u32)
            .map_err(|_| invalid()),
        _ => Uuid::parse_str(digits).map_err(|_| invalid()),
    }
}
