use bitspan::{Bits, Error, Value};

#[test]
fn typed_reads_advance_the_cursor() {
    let bits = Bits::parse("uint:12=352, bin:3=111, bool=true").unwrap();
    let mut r = bits.reader();
    assert_eq!(0, r.pos());
    assert_eq!(352, r.read_uint(12).unwrap());
    assert_eq!(12, r.pos());
    assert_eq!(0b111, r.read_uint(3).unwrap());
    assert!(r.read_bool().unwrap());
    assert_eq!(0, r.remaining());
}

#[test]
fn reads_past_the_end_restore_the_cursor() {
    let bits = Bits::from_bin("1010").unwrap();
    let mut r = bits.reader();
    r.read_uint(2).unwrap();
    assert!(matches!(r.read_uint(3), Err(Error::OutOfRange(_))));
    assert_eq!(2, r.pos());
    assert!(matches!(
        r.read_fmt("uint:1, uint:3"),
        Err(Error::OutOfRange(_))
    ));
    assert_eq!(2, r.pos());
}

#[test]
fn peeks_do_not_move() {
    let bits = Bits::from_hex("abcd").unwrap();
    let mut r = bits.reader();
    assert_eq!(0xab, r.peek_uint(8).unwrap());
    assert_eq!(0xab, r.peek_uint(8).unwrap());
    assert_eq!(0, r.pos());
    let values = r.peek_fmt("hex:8, hex:8").unwrap();
    assert_eq!(vec![Value::Hex("ab".into()), Value::Hex("cd".into())], values);
    assert_eq!(0, r.pos());
}

#[test]
fn byte_align_skips_to_the_boundary() {
    let bits = Bits::from_bytes(vec![0xff, 0x0f]);
    let mut r = bits.reader();
    assert_eq!(0, r.byte_align().unwrap());
    r.read_uint(3).unwrap();
    assert_eq!(5, r.byte_align().unwrap());
    assert_eq!(8, r.pos());
}

#[test]
fn read_bits_shares_the_buffer() {
    let bits = Bits::from_hex("cafe").unwrap();
    let mut r = bits.reader();
    let head = r.read_bits(8).unwrap();
    assert_eq!("ca", head.to_hex().unwrap());
    assert_eq!(8, r.pos());
}

#[test]
fn exp_golomb_stream_reads() {
    // ue(3) ue(0) se(-2) back to back
    let bits = Bits::parse("ue=3, ue=0, se=-2").unwrap();
    let mut r = bits.reader();
    assert_eq!(3, r.read_ue().unwrap());
    assert_eq!(0, r.read_ue().unwrap());
    assert_eq!(-2, r.read_se().unwrap());
    assert_eq!(0, r.remaining());
}

#[test]
fn stream_find_moves_to_the_match() {
    let bits = Bits::from_hex("00ff00ff").unwrap();
    let pattern = Bits::from_hex("ff").unwrap();
    let mut r = bits.reader();
    assert_eq!(Some(8), r.find(&pattern, true).unwrap());
    assert_eq!(8, r.pos());
    r.skip(8).unwrap();
    assert_eq!(Some(24), r.find(&pattern, true).unwrap());
}

#[test]
fn read_to_consumes_through_the_pattern() {
    let bits = Bits::from_hex("12ab34").unwrap();
    let pattern = Bits::from_hex("ab").unwrap();
    let mut r = bits.reader();
    let span = r.read_to(&pattern, true).unwrap();
    assert_eq!("12ab", span.to_hex().unwrap());
    assert_eq!(16, r.pos());

    let mut r2 = bits.reader();
    let missing = Bits::from_hex("ee").unwrap();
    assert!(r2.read_to(&missing, true).is_err());
    assert_eq!(0, r2.pos());
}

#[test]
fn format_reads_with_stretchy_tail() {
    let bits = Bits::parse("uint:8=7, 0b10110").unwrap();
    let mut r = bits.reader();
    let values = r.read_fmt("uint:8, bin").unwrap();
    assert_eq!(vec![Value::Uint(7), Value::Bin("10110".into())], values);
    assert_eq!(13, r.pos());
}

#[test]
fn mutable_sequences_embed_a_cursor() {
    let mut s = Bits::parse("uint:8=3, uint:8=5").unwrap().to_mut().unwrap();
    assert_eq!(3, s.read_uint(8).unwrap());
    assert_eq!(8, s.pos());
    assert_eq!(5, s.read_uint(8).unwrap());

    // a destructive edit resets the cursor
    s.delete(8, 0).unwrap();
    assert_eq!(0, s.pos());

    // an insert leaves it just past the inserted bits
    let piece = Bits::from_bin("11").unwrap();
    s.insert(&piece, 4).unwrap();
    assert_eq!(6, s.pos());
}

#[test]
fn mutable_format_reads() {
    let mut s = Bits::parse("uint:4=9, bin:4=0110").unwrap().to_mut().unwrap();
    let values = s.read_fmt("uint:4, bin:4").unwrap();
    assert_eq!(vec![Value::Uint(9), Value::Bin("0110".into())], values);
    assert_eq!(8, s.pos());
    s.set_pos(0).unwrap();
    let peeked = s.peek_fmt("uint:4").unwrap();
    assert_eq!(vec![Value::Uint(9)], peeked);
    assert_eq!(0, s.pos());
}

#[test]
fn two_readers_share_one_sequence() {
    let bits = Bits::from_hex("1234").unwrap();
    let mut a = bits.reader();
    let mut b = bits.reader();
    assert_eq!(0x1, a.read_uint(4).unwrap());
    assert_eq!(0x12, b.read_uint(8).unwrap());
    assert_eq!(4, a.pos());
    assert_eq!(8, b.pos());
}
