//! Copy-with-checksum of one scanline.
//!
//! The checksum is CRC-32 over the IEEE 802.3 polynomial, processed MSB-first
//! from a zero seed with no final XOR: the value a DMA sniffer produces while
//! it copies the line. Identical lines always hash identically and byte order
//! matters. Every change confined to a single 32-bit burst is detected; for
//! arbitrary changes the chance that a changed line keeps its hash (and is
//! therefore not retransmitted) is 2^-32.
//!
//! With a zero seed the checksum is linear: the all-zero line hashes to 0,
//! and so does any line whose bytes read as a multiple of the polynomial.

/// IEEE 802.3 CRC-32 generator polynomial (without the x^32 term).
pub const CRC32_POLY: u32 = 0x04C1_1DB7;

const CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CRC32_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Copies a pixel line and returns a checksum of the bytes copied.
pub trait LineHasher: Send {
    /// Copies `src` into `dst` and returns the checksum of `src`.
    ///
    /// Both slices must have the same length.
    fn copy_and_hash(&mut self, src: &[u8], dst: &mut [u8]) -> u32;
}

/// Software model of the sniffing bulk copy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Crc32Hasher;

impl Crc32Hasher {
    pub const fn new() -> Self {
        Self
    }

    /// Checksum of `bytes` without copying them.
    pub fn checksum(bytes: &[u8]) -> u32 {
        bytes.iter().fold(0, |crc, &byte| crc_step(crc, byte))
    }
}

#[inline(always)]
fn crc_step(crc: u32, byte: u8) -> u32 {
    let idx = ((crc >> 24) as u8 ^ byte) as usize;
    (crc << 8) ^ CRC_TABLE[idx]
}

impl LineHasher for Crc32Hasher {
    fn copy_and_hash(&mut self, src: &[u8], dst: &mut [u8]) -> u32 {
        debug_assert_eq!(src.len(), dst.len());
        let mut crc = 0u32;
        for (out, &byte) in dst.iter_mut().zip(src) {
            *out = byte;
            crc = crc_step(crc, byte);
        }
        crc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_polynomial() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], CRC32_POLY);
    }

    #[test]
    fn matches_crc32_mpeg2_reference_after_seed_adjustment() {
        // CRC-32/MPEG-2 of "123456789" is 0x0376E6E7 with seed 0xFFFFFFFF.
        // With a zero seed the same polynomial gives 0x89A1897F.
        assert_eq!(Crc32Hasher::checksum(b"123456789"), 0x89A1_897F);
    }

    #[test]
    fn copy_and_hash_copies_every_byte() {
        let src: Vec<u8> = (0..160u32).map(|x| (x * 7) as u8).collect();
        let mut dst = vec![0u8; src.len()];
        let hash = Crc32Hasher::new().copy_and_hash(&src, &mut dst);
        assert_eq!(dst, src);
        assert_eq!(hash, Crc32Hasher::checksum(&src));
    }
}
