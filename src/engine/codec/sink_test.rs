use std::io::Write;

use crate::engine::codec::{CountingSink, FixedSizeWriter};

#[test]
fn counting_sink_counts_without_storing() {
    let mut sink = CountingSink::new();
    sink.write_all(b"hello").unwrap();
    sink.write_all(&[0u8; 1024]).unwrap();
    assert_eq!(sink.written(), 1029);
}

#[test]
fn fixed_size_writer_fills_exactly() {
    let mut buf = [0u8; 8];
    let mut writer = FixedSizeWriter::new(&mut buf);
    writer.write_all(b"abcd").unwrap();
    writer.write_all(b"efgh").unwrap();
    assert_eq!(writer.position(), 8);
    assert_eq!(writer.remaining(), 0);
    assert_eq!(&buf, b"abcdefgh");
}

#[test]
fn fixed_size_writer_refuses_to_grow() {
    let mut buf = [0u8; 4];
    let mut writer = FixedSizeWriter::new(&mut buf);
    writer.write_all(b"abc").unwrap();
    let err = writer.write_all(b"de").expect_err("5 bytes do not fit in 4");
    assert_eq!(err.kind(), std::io::ErrorKind::WriteZero);
    assert_eq!(writer.position(), 3);
}
