//! The only test binary that flips the process-wide bit numbering mode;
//! test binaries run as separate processes, so the global cannot leak into
//! the other suites. Everything runs inside one test to keep the flips
//! ordered.

use bitspan::{bit_order, set_bit_order, BitOrder, Bits, BitsMut};

#[test]
fn lsb0_renumbers_indexing_and_find() {
    assert_eq!(BitOrder::Msb0, bit_order());

    // 0b100110 has MSB0 bit 0 set; in LSB0 numbering that bit is index 5
    let s = Bits::from_bin("100110").unwrap();
    assert!(s.get(0).unwrap());
    assert!(!s.get(5).unwrap());

    set_bit_order(BitOrder::Lsb0);
    assert_eq!(BitOrder::Lsb0, bit_order());
    assert!(!s.get(0).unwrap());
    assert!(s.get(1).unwrap());
    assert!(s.get(5).unwrap());

    // single-bit writes translate the same way
    let mut m = BitsMut::zeros(8);
    m.set(0, true).unwrap();
    set_bit_order(BitOrder::Msb0);
    assert_eq!("00000001", m.to_bin().unwrap());

    // wire formats are unaffected by the numbering mode
    set_bit_order(BitOrder::Lsb0);
    let v = Bits::from_uint(0xa5, 8).unwrap();
    assert_eq!(0xa5, v.to_uint().unwrap());
    assert_eq!("a5", v.to_hex().unwrap());

    // find coordinates count from the low end, lowest position first
    let haystack = Bits::from_bin("01100000").unwrap();
    let pattern = Bits::from_bin("11").unwrap();
    assert_eq!(Some(5), haystack.find(&pattern, false).unwrap());
    assert_eq!(Some(5), haystack.rfind(&pattern, false).unwrap());

    let spread = Bits::from_bin("11000011").unwrap();
    let all: Vec<u64> = spread
        .find_all(&pattern, false, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(vec![0, 6], all);

    set_bit_order(BitOrder::Msb0);
    assert_eq!(Some(0), spread.find(&pattern, false).unwrap());
}
