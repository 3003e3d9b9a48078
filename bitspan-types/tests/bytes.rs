use bitspan_types::bytes;

#[test]
fn byte_len_ceils_to_whole_bytes() {
    assert_eq!(0, bytes::byte_len(0, 0));
    assert_eq!(1, bytes::byte_len(0, 1));
    assert_eq!(1, bytes::byte_len(0, 8));
    assert_eq!(2, bytes::byte_len(0, 9));
    assert_eq!(2, bytes::byte_len(7, 8));
    assert_eq!(1, bytes::byte_len(7, 1));
}

#[test]
fn high_mask_covers_msb_runs() {
    assert_eq!(0x00, bytes::high_mask(0));
    assert_eq!(0x80, bytes::high_mask(1));
    assert_eq!(0xf0, bytes::high_mask(4));
    assert_eq!(0xff, bytes::high_mask(8));
}

#[test]
fn get_set_flip_roundtrip() {
    let mut buf = [0u8; 2];
    bytes::set_bit(&mut buf, 0, true);
    bytes::set_bit(&mut buf, 9, true);
    assert_eq!([0x80, 0x40], buf);
    assert!(bytes::get_bit(&buf, 0));
    assert!(!bytes::get_bit(&buf, 1));
    assert!(bytes::get_bit(&buf, 9));
    bytes::flip_bit(&mut buf, 0);
    bytes::flip_bit(&mut buf, 15);
    assert_eq!([0x00, 0x41], buf);
}

#[test]
fn extract_bits_shifts_to_zero_offset() {
    // 0001_1010 1111_0000
    let src = [0x1a, 0xf0];
    assert_eq!(vec![0x1a, 0xf0], bytes::extract_bits(&src, 0, 16));
    // bits 3..15 -> 1101_0111_1000 padded
    assert_eq!(vec![0xd7, 0x80], bytes::extract_bits(&src, 3, 12));
    // single bit
    assert_eq!(vec![0x80], bytes::extract_bits(&src, 3, 1));
    assert_eq!(Vec::<u8>::new(), bytes::extract_bits(&src, 5, 0));
}

#[test]
fn realign_moves_window_to_new_phase() {
    let src = [0b0001_1010, 0b1111_0000];
    // bits 3..15 placed at offset 2: 00_110101_11, 10_000000
    let out = bytes::realign(&src, 3, 12, 2);
    assert_eq!(vec![0b0011_0101, 0b1110_0000], out);
    // offset 0 is a plain extraction
    assert_eq!(bytes::extract_bits(&src, 3, 12), bytes::realign(&src, 3, 12, 0));
}

#[test]
fn copy_bits_masks_both_edges() {
    let mut dst = [0xffu8; 2];
    let src = [0x00u8; 2];
    bytes::copy_bits(&mut dst, 3, &src, 3, 7);
    assert_eq!([0b1110_0000, 0b0011_1111], dst);

    // unaligned phases realign the source side
    let mut dst = [0x00u8; 2];
    let src = [0b1111_1111u8];
    bytes::copy_bits(&mut dst, 6, &src, 1, 5);
    assert_eq!([0b0000_0011, 0b1110_0000], dst);
}

#[test]
fn fill_and_invert_regions() {
    let mut buf = [0u8; 2];
    bytes::fill_bits(&mut buf, 2, 9, true);
    assert_eq!([0b0011_1111, 0b1110_0000], buf);
    bytes::invert_bits(&mut buf, 0, 16);
    assert_eq!([0b1100_0000, 0b0001_1111], buf);
    bytes::fill_bits(&mut buf, 0, 2, false);
    assert_eq!([0b0000_0000, 0b0001_1111], buf);
}

#[test]
fn count_zeros_scans_through_whole_bytes() {
    let buf = [0x00, 0x00, 0x01];
    assert_eq!(23, bytes::count_zeros_from(&buf, 0, 24));
    assert_eq!(20, bytes::count_zeros_from(&buf, 3, 24));
    // capped by the end of the region
    assert_eq!(10, bytes::count_zeros_from(&buf, 0, 10));
    let buf = [0b0010_0000];
    assert_eq!(2, bytes::count_zeros_from(&buf, 0, 8));
    assert_eq!(0, bytes::count_zeros_from(&buf, 2, 8));
}

#[test]
fn peek8_reads_across_byte_boundaries() {
    let buf = [0b1010_1100, 0b1100_0000];
    assert_eq!(0b101, bytes::peek8(&buf, 0, 3));
    assert_eq!(0b0101_1001, bytes::peek8(&buf, 1, 8));
    assert_eq!(0b0011, bytes::peek8(&buf, 6, 4));
}

#[test]
fn bits_eq_compares_sub_byte_regions() {
    let a = [0b0101_1010, 0b1111_0000];
    let b = [0b1011_0101, 0b1110_0000];
    // a[1..9] == b[0..8]
    assert!(bytes::bits_eq(&a, 1, &b, 0, 8));
    assert!(!bytes::bits_eq(&a, 0, &b, 0, 8));
    assert!(bytes::bits_eq(&a, 0, &a, 0, 16));
    assert!(bytes::bits_eq(&a, 5, &b, 4, 0));
}
