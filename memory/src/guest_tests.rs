#[cfg(test)]
mod tests {
    use crate::{BigEndian, GuestAddr, GuestMemory, LittleEndian, MemoryError};

    fn addr(a: u64) -> GuestAddr {
        GuestAddr(a)
    }

    #[test]
    fn test_new_memory_is_zeroed() {
        let mem = GuestMemory::new(64);
        assert_eq!(mem.len(), 64);
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_byte_roundtrip_at_edges() {
        let mut mem = GuestMemory::new(16);
        mem.write_byte(addr(0), 0xAB).unwrap();
        mem.write_byte(addr(15), 0xCD).unwrap();
        assert_eq!(mem.read_byte(addr(0)), Ok(0xAB));
        assert_eq!(mem.read_byte(addr(15)), Ok(0xCD));
    }

    #[test]
    fn test_byte_at_size_is_out_of_bounds() {
        let mut mem = GuestMemory::new(16);
        assert_eq!(
            mem.read_byte(addr(16)),
            Err(MemoryError::OutOfBounds {
                addr: addr(16),
                len: 1,
                size: 16
            })
        );
        assert!(mem.write_byte(addr(16), 1).is_err());
    }

    #[test]
    fn test_huge_address_does_not_wrap() {
        let mem = GuestMemory::new(16);
        assert!(matches!(
            mem.read_bytes(addr(u64::MAX), 2),
            Err(MemoryError::OutOfBounds { .. })
        ));
        assert!(matches!(
            mem.read_u64::<LittleEndian>(addr(u64::MAX - 3)),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_zero_length_access_still_checks_start() {
        let mem = GuestMemory::new(8);
        assert_eq!(mem.read_bytes(addr(7), 0), Ok(&b""[..]));
        assert!(mem.read_bytes(addr(8), 0).is_err());
    }

    #[test]
    fn test_straddling_write_does_not_mutate() {
        let mut mem = GuestMemory::new(8);
        let err = mem.write_bytes(addr(6), &[1, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            MemoryError::OutOfBounds {
                addr: addr(6),
                len: 3,
                size: 8
            }
        );
        assert_eq!(mem.as_slice(), &[0u8; 8]);

        assert!(mem.write_u32::<LittleEndian>(addr(5), 0xFFFF_FFFF).is_err());
        assert_eq!(mem.as_slice(), &[0u8; 8]);
    }

    #[test]
    fn test_multibyte_byte_order() {
        let mut mem = GuestMemory::new(16);
        mem.write_u32::<LittleEndian>(addr(0), 0x1122_3344).unwrap();
        assert_eq!(mem.read_bytes(addr(0), 4), Ok(&[0x44, 0x33, 0x22, 0x11][..]));
        assert_eq!(mem.read_u32::<BigEndian>(addr(0)), Ok(0x4433_2211));

        mem.write_u16::<BigEndian>(addr(4), 0xBEEF).unwrap();
        assert_eq!(mem.read_byte(addr(4)), Ok(0xBE));
        assert_eq!(mem.read_byte(addr(5)), Ok(0xEF));

        mem.write_u64::<LittleEndian>(addr(8), u64::MAX - 1).unwrap();
        assert_eq!(mem.read_u64::<LittleEndian>(addr(8)), Ok(u64::MAX - 1));
    }

    #[test]
    fn test_unaligned_access() {
        let mut mem = GuestMemory::new(16);
        mem.write_u64::<LittleEndian>(addr(3), 0x0102_0304_0506_0708)
            .unwrap();
        assert_eq!(
            mem.read_u64::<LittleEndian>(addr(3)),
            Ok(0x0102_0304_0506_0708)
        );
    }

    #[test]
    fn test_cstring_stops_at_nul() {
        let mut mem = GuestMemory::new(32);
        mem.write_bytes(addr(4), b"Demo\0tail").unwrap();
        assert_eq!(mem.read_cstring(addr(4)), Ok(&b"Demo"[..]));
        assert_eq!(mem.read_cstring(addr(9)), Ok(&b"tail"[..]));
    }

    #[test]
    fn test_empty_cstring() {
        let mem = GuestMemory::new(4);
        assert_eq!(mem.read_cstring(addr(2)), Ok(&b""[..]));
    }

    #[test]
    fn test_cstring_running_off_the_end() {
        let mut mem = GuestMemory::new(4);
        mem.write_bytes(addr(0), b"abcd").unwrap();
        assert_eq!(
            mem.read_cstring(addr(1)),
            Err(MemoryError::UnterminatedString { addr: addr(1) })
        );
    }

    #[test]
    fn test_cstring_start_out_of_bounds() {
        let mem = GuestMemory::new(4);
        assert!(matches!(
            mem.read_cstring(addr(4)),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_write_cstring_appends_terminator() {
        let mut mem = GuestMemory::new(8);
        mem.fill(addr(0), 8, 0xFF).unwrap();
        mem.write_cstring(addr(1), b"hi").unwrap();
        assert_eq!(mem.read_bytes(addr(1), 3), Ok(&b"hi\0"[..]));
        assert_eq!(mem.read_cstring(addr(1)), Ok(&b"hi"[..]));

        // Terminator would land past the end.
        assert!(mem.write_cstring(addr(6), b"xy").is_err());
        assert_eq!(mem.read_byte(addr(6)), Ok(0xFF));
    }

    #[test]
    fn test_error_reports_start_address() {
        let mem = GuestMemory::new(4);
        let err = mem.read_bytes(addr(3), 4).unwrap_err();
        assert_eq!(err.addr(), addr(3));
        assert_eq!(
            err.to_string(),
            "out of bounds: 4 byte(s) at 0x3 (guest memory is 4 bytes)"
        );
    }
}
