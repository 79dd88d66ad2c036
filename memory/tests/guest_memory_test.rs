//! Property tests for guest memory accessors.
//!
//! Every accessor shares one bounds check, so these properties hold for the
//! whole address space rather than a handful of hand-picked offsets.

use memory::{GuestAddr, GuestMemory, LittleEndian, MemoryError};
use proptest::prelude::*;

const SIZE: usize = 256;

fn filled(seed: u8) -> GuestMemory {
    let mut mem = GuestMemory::new(SIZE);
    for i in 0..SIZE {
        mem.write_byte(GuestAddr(i as u64), seed.wrapping_add(i as u8))
            .unwrap();
    }
    mem
}

proptest! {
    #[test]
    fn write_then_read_byte_roundtrips(addr in 0..SIZE as u64, value: u8) {
        let mut mem = GuestMemory::new(SIZE);
        mem.write_byte(GuestAddr(addr), value).unwrap();
        prop_assert_eq!(mem.read_byte(GuestAddr(addr)), Ok(value));
    }

    #[test]
    fn out_of_range_access_faults_without_mutation(
        addr in SIZE as u64..u64::MAX,
        value: u8,
        seed: u8,
    ) {
        let mut mem = filled(seed);
        let before = mem.as_slice().to_vec();
        let a = GuestAddr(addr);

        prop_assert!(
            matches!(mem.read_byte(a), Err(MemoryError::OutOfBounds { .. })),
            "read_byte must fault"
        );
        prop_assert!(
            matches!(mem.write_byte(a, value), Err(MemoryError::OutOfBounds { .. })),
            "write_byte must fault"
        );
        prop_assert!(
            matches!(mem.read_cstring(a), Err(MemoryError::OutOfBounds { .. })),
            "read_cstring must fault"
        );
        prop_assert!(
            matches!(mem.write_bytes(a, &[value; 3]), Err(MemoryError::OutOfBounds { .. })),
            "write_bytes must fault"
        );
        prop_assert!(
            matches!(
                mem.write_u32::<LittleEndian>(a, u32::from(value)),
                Err(MemoryError::OutOfBounds { .. })
            ),
            "write_u32 must fault"
        );
        prop_assert_eq!(mem.as_slice(), &before[..]);
    }

    #[test]
    fn cstring_returns_bytes_before_terminator(
        addr in 0..(SIZE as u64 - 64),
        body in proptest::collection::vec(1u8..=255, 0..63),
    ) {
        let mut mem = filled(0xA5);
        let a = GuestAddr(addr);
        mem.write_bytes(a, &body).unwrap();
        mem.write_byte(GuestAddr(addr + body.len() as u64), 0).unwrap();

        prop_assert_eq!(mem.read_cstring(a), Ok(&body[..]));
    }

    #[test]
    fn cstring_without_terminator_is_rejected(addr in 0..SIZE as u64, fill in 1u8..=255) {
        let mut mem = GuestMemory::new(SIZE);
        mem.fill(GuestAddr(0), SIZE, fill).unwrap();

        prop_assert_eq!(
            mem.read_cstring(GuestAddr(addr)),
            Err(MemoryError::UnterminatedString { addr: GuestAddr(addr) })
        );
    }

    #[test]
    fn multibyte_reads_match_sequential_bytes(addr in 0..(SIZE as u64 - 4), seed: u8) {
        let mem = filled(seed);
        let a = GuestAddr(addr);
        let bytes: Vec<u8> = (0..4)
            .map(|i| mem.read_byte(GuestAddr(addr + i)).unwrap())
            .collect();

        prop_assert_eq!(
            mem.read_u32::<LittleEndian>(a),
            Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        );
        prop_assert_eq!(
            mem.read_u32::<memory::BigEndian>(a),
            Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        );
    }
}
