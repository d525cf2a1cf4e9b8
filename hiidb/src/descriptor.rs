// SPDX-License-Identifier: MIT OR Apache-2.0

/// Value of the `HiiDB` variable.
///
/// Describes where the exported package lists live in runtime memory. Both
/// fields are 32 bits wide: `pointer` only carries the low half of the
/// buffer address on 64-bit platforms, so consumers must either know that
/// the allocation sits below 4 GiB or treat the value as a hint.
///
/// The descriptor is stored little-endian, which is the native layout on
/// every UEFI architecture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ExportDescriptor {
    /// Size of the exported blob in bytes.
    pub length: u32,
    /// Low 32 bits of the blob's address.
    pub pointer: u32,
}

impl ExportDescriptor {
    /// Size of the serialized descriptor in bytes.
    pub const SIZE: usize = 8;

    /// Describe a blob of `size` bytes at `address`.
    ///
    /// Both values are truncated to their low 32 bits.
    #[must_use]
    pub const fn new(size: usize, address: usize) -> Self {
        Self {
            length: size as u32,
            pointer: address as u32,
        }
    }

    /// Whether `size` and `address` survive the truncation in [`Self::new`].
    #[must_use]
    pub const fn fits(size: usize, address: usize) -> bool {
        size as u64 <= u32::MAX as u64 && address as u64 <= u32::MAX as u64
    }

    /// Serialize into the variable payload.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..].copy_from_slice(&self.pointer.to_le_bytes());
        bytes
    }

    /// Parse a variable payload. Returns `None` unless `bytes` is exactly
    /// [`Self::SIZE`] bytes long.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::SIZE] = bytes.try_into().ok()?;
        let (length, pointer) = bytes.split_at(4);
        Some(Self {
            length: u32::from_le_bytes(length.try_into().ok()?),
            pointer: u32::from_le_bytes(pointer.try_into().ok()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<ExportDescriptor>(), ExportDescriptor::SIZE);

        let desc = ExportDescriptor {
            length: 0x200,
            pointer: 0x7e65_1018,
        };
        assert_eq!(
            desc.to_bytes(),
            [0x00, 0x02, 0x00, 0x00, 0x18, 0x10, 0x65, 0x7e]
        );
    }

    #[test]
    fn test_new_truncates() {
        let desc = ExportDescriptor::new(512, 0x7e65_1018);
        assert_eq!(desc.length, 512);
        assert_eq!(desc.pointer, 0x7e65_1018);
        assert!(ExportDescriptor::fits(512, 0x7e65_1018));

        #[cfg(target_pointer_width = "64")]
        {
            let desc = ExportDescriptor::new(512, 0x1_2345_6000);
            assert_eq!(desc.pointer, 0x2345_6000);
            assert!(!ExportDescriptor::fits(512, 0x1_2345_6000));
            assert!(!ExportDescriptor::fits(0x1_0000_0000, 0x1000));
        }
    }

    #[test]
    fn test_from_bytes() {
        let desc = ExportDescriptor::new(0x1234, 0xdead_b000);
        assert_eq!(ExportDescriptor::from_bytes(&desc.to_bytes()), Some(desc));

        // The efivarfs view prefixes the payload with four attribute bytes.
        let efivarfs = [0x06, 0x00, 0x00, 0x00, 0x34, 0x12, 0x00, 0x00, 0x00, 0xb0, 0xad, 0xde];
        assert_eq!(ExportDescriptor::from_bytes(&efivarfs), None);
        assert_eq!(ExportDescriptor::from_bytes(&efivarfs[4..]), Some(desc));

        assert_eq!(ExportDescriptor::from_bytes(&[]), None);
        assert_eq!(ExportDescriptor::from_bytes(&[0; 7]), None);
    }
}
