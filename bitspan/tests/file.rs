use std::fs;
use std::path::PathBuf;
use std::process;

use bitspan::{Bits, Error};

struct TempFile(PathBuf);

impl TempFile {
    fn with_bytes(name: &str, data: &[u8]) -> Self {
        let path = std::env::temp_dir().join(format!("bitspan-{}-{name}", process::id()));
        fs::write(&path, data).expect("write temp file");
        TempFile(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

#[test]
fn file_backed_reads_without_materializing() {
    let tmp = TempFile::with_bytes("reads", &[0x12, 0x34, 0x56, 0x78]);
    let bits = Bits::from_file(&tmp.0).unwrap();
    assert_eq!(32, bits.len());
    assert_eq!("12345678", bits.to_hex().unwrap());
    assert!(bits.get(3).unwrap());

    let mut r = bits.reader();
    assert_eq!(0x1234, r.read_uint(16).unwrap());
}

#[test]
fn file_windows_take_bit_offsets() {
    let tmp = TempFile::with_bytes("window", &[0x12, 0x34, 0x56]);
    let bits = Bits::from_file_window(&tmp.0, 4, Some(16)).unwrap();
    assert_eq!(16, bits.len());
    assert_eq!("2345", bits.to_hex().unwrap());
}

#[test]
fn windows_past_the_end_fail_to_construct() {
    let tmp = TempFile::with_bytes("eof", &[0xaa, 0xbb]);
    assert!(matches!(
        Bits::from_file_window(&tmp.0, 24, None),
        Err(Error::Construction(_))
    ));
    assert!(matches!(
        Bits::from_file_window(&tmp.0, 0, Some(17)),
        Err(Error::Construction(_))
    ));
    // a window ending exactly at the end is fine
    assert!(Bits::from_file_window(&tmp.0, 8, Some(8)).is_ok());
}

#[test]
fn mutation_copies_the_window_into_memory() {
    let tmp = TempFile::with_bytes("mutate", &[0x0f, 0xf0]);
    let bits = Bits::from_file(&tmp.0).unwrap();
    let mut owned = bits.to_mut().unwrap();
    owned.set(0, true).unwrap();
    assert_eq!(vec![0x8f, 0xf0], owned.to_bytes());
    // the file-backed sequence still reads the original bytes
    assert_eq!("0ff0", bits.to_hex().unwrap());
}

#[test]
fn searching_a_file_window() {
    let mut data = vec![0u8; 5000];
    data[4096] = 0xde;
    data[4097] = 0xad;
    let tmp = TempFile::with_bytes("search", &data);
    let bits = Bits::from_file(&tmp.0).unwrap();
    let pattern = Bits::from_hex("dead").unwrap();
    assert_eq!(Some(4096 * 8), bits.find(&pattern, true).unwrap());
}

#[test]
fn dumping_a_file_window_masks_the_tail() {
    let tmp = TempFile::with_bytes("dump", &[0xff, 0xff]);
    let bits = Bits::from_file_window(&tmp.0, 0, Some(12)).unwrap();
    assert_eq!(vec![0xff, 0xf0], bits.to_bytes().unwrap());

    let mut sink = Vec::new();
    let written = bits.write_to(&mut sink).unwrap();
    assert_eq!(2, written);
    assert_eq!(vec![0xff, 0xf0], sink);
}
