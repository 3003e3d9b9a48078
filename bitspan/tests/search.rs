use bitspan::{Bits, Error};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn find_unaligned_pattern() {
    let haystack = Bits::from_bin("00010010010010001111").unwrap();
    let pattern = Bits::from_hex("48").unwrap();
    assert_eq!(Some(8), haystack.find(&pattern, false).unwrap());
    assert_eq!(Some(8), haystack.find(&pattern, true).unwrap());
}

#[test]
fn find_honors_byte_alignment() {
    // 0x48 also appears shifted by four bits
    let haystack = Bits::from_hex("04812345").unwrap();
    let pattern = Bits::from_hex("48").unwrap();
    assert_eq!(Some(4), haystack.find(&pattern, false).unwrap());
    assert_eq!(None, haystack.find(&pattern, true).unwrap());
}

#[test]
fn find_postcondition_holds() {
    let haystack = Bits::from_hex("a5a5ffa5").unwrap();
    let pattern = Bits::from_hex("ff").unwrap();
    let p = haystack.find(&pattern, false).unwrap().unwrap();
    assert_eq!(
        pattern,
        haystack.slice(p..p + pattern.len()).unwrap()
    );
    // nothing earlier matches
    assert_eq!(None, haystack.find_in(&pattern, 0, p + pattern.len() - 1, false).unwrap());
}

#[test]
fn rfind_returns_the_highest_match() {
    let haystack = Bits::from_bin("1101101").unwrap();
    let pattern = Bits::from_bin("11").unwrap();
    assert_eq!(Some(0), haystack.find(&pattern, false).unwrap());
    assert_eq!(Some(3), haystack.rfind(&pattern, false).unwrap());
}

#[test]
fn find_within_a_window() {
    let haystack = Bits::from_bin("1111").unwrap();
    let pattern = Bits::from_bin("11").unwrap();
    assert_eq!(Some(1), haystack.find_in(&pattern, 1, 4, false).unwrap());
    assert_eq!(None, haystack.find_in(&pattern, 3, 4, false).unwrap());
}

#[test]
fn empty_pattern_is_rejected() {
    let haystack = Bits::from_bin("1010").unwrap();
    assert!(matches!(
        haystack.find(&Bits::new(), false),
        Err(Error::Construction(_))
    ));
    assert!(haystack.find_all(&Bits::new(), false, None).is_err());
}

#[test]
fn find_all_overlapping_and_not() {
    let haystack = Bits::from_bin("11111").unwrap();
    let pattern = Bits::from_bin("11").unwrap();
    let positions: Vec<u64> = haystack
        .find_all(&pattern, false, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(vec![0, 1, 2, 3], positions);

    let haystack = Bits::from_hex("ababab").unwrap();
    let pattern = Bits::from_hex("ab").unwrap();
    let positions: Vec<u64> = haystack
        .find_all(&pattern, true, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(vec![0, 8, 16], positions);

    // the count cap limits the yield
    let capped: Vec<u64> = haystack
        .find_all(&pattern, true, Some(2))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(vec![0, 8], capped);
}

#[test]
fn byte_search_crosses_window_boundaries() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut data = vec![0u8; 40 * 1024];
    rng.fill(&mut data[..]);
    let needle = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67];
    // clear any accidental occurrences, then plant two
    for chunk in data.chunks_exact_mut(needle.len()) {
        if chunk == needle {
            chunk[0] ^= 0xff;
        }
    }
    let first = 17 * 1024 + 3;
    let second = 39 * 1024;
    data[first..first + needle.len()].copy_from_slice(&needle);
    data[second..second + needle.len()].copy_from_slice(&needle);

    let haystack = Bits::from_bytes(data);
    let pattern = Bits::from_bytes(needle.to_vec());
    assert_eq!(
        Some(first as u64 * 8),
        haystack.find(&pattern, true).unwrap()
    );
    assert_eq!(
        Some(second as u64 * 8),
        haystack.rfind(&pattern, true).unwrap()
    );
    let all: Vec<u64> = haystack
        .find_all(&pattern, true, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(vec![first as u64 * 8, second as u64 * 8], all);
}

#[test]
fn bit_search_crosses_window_boundaries() {
    // a long run of zeros with a distinctive pattern planted off-alignment
    let mut haystack = Bits::zeros(40_000).to_mut().unwrap();
    let pattern = Bits::from_bin("1011101110111").unwrap();
    haystack.overwrite(&pattern, 33_003).unwrap();
    let haystack = haystack.freeze();
    assert_eq!(Some(33_003), haystack.find(&pattern, false).unwrap());
    assert_eq!(None, haystack.find(&pattern, true).unwrap());
}

#[test]
fn pattern_longer_than_haystack() {
    let haystack = Bits::from_bin("101").unwrap();
    let pattern = Bits::from_bin("10101").unwrap();
    assert_eq!(None, haystack.find(&pattern, false).unwrap());
    assert_eq!(None, haystack.rfind(&pattern, false).unwrap());
}

#[test]
fn sub_byte_offset_haystack_still_matches() {
    // slicing shifts the logical sequence off the byte grid
    let backing = Bits::from_hex("0deadbee").unwrap();
    let haystack = backing.slice(4..32).unwrap();
    let pattern = Bits::from_hex("adbe").unwrap();
    assert_eq!(Some(8), haystack.find(&pattern, true).unwrap());
}
