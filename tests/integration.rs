use std::io::{Cursor, Read};

use tar_format::{Archive, ArchiveOptions, TarError};

fn checksum_of(block: &[u8]) -> u64 {
    let mut sum = 0u64;
    for (i, &b) in block.iter().enumerate() {
        if (148..156).contains(&i) {
            sum += u64::from(b' ');
        } else {
            sum += u64::from(b);
        }
    }
    sum
}

fn header_block(name: &str, typeflag: u8, size: u64, magic: &[u8; 8]) -> Vec<u8> {
    let mut block = vec![0u8; 512];
    block[..name.len()].copy_from_slice(name.as_bytes());
    block[100..108].copy_from_slice(b"0000644\0");
    block[108..116].copy_from_slice(b"0000000\0");
    block[116..124].copy_from_slice(b"0000000\0");
    let size_octal = format!("{size:011o}\0");
    block[124..136].copy_from_slice(size_octal.as_bytes());
    block[136..148].copy_from_slice(b"00000000000\0");
    block[156] = typeflag;
    block[257..265].copy_from_slice(magic);
    let checksum = checksum_of(&block);
    block[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());
    block
}

fn pad_to_block(buf: &mut Vec<u8>) {
    let padding = (512 - buf.len() % 512) % 512;
    buf.extend(std::iter::repeat(0u8).take(padding));
}

const ZERO_MAGIC: &[u8; 8] = &[0u8; 8];
const USTAR_MAGIC_VERSION: &[u8; 8] = b"ustar\x0000";

#[test]
fn gnu_long_path_fuses_into_the_next_entry() {
    let long_name = "a/very/deeply/nested/path/that/does/not/fit/in/the/header/name/field.txt";
    let mut archive_bytes = Vec::new();

    let long_name_data = format!("{long_name}\0");
    let mut long_header = header_block("././@LongLink", b'L', long_name_data.len() as u64, ZERO_MAGIC);
    let checksum = checksum_of(&{
        let mut zeroed = long_header.clone();
        zeroed[148..156].copy_from_slice(b"        ");
        zeroed
    });
    long_header[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());
    archive_bytes.extend(long_header);
    archive_bytes.extend(long_name_data.as_bytes());
    pad_to_block(&mut archive_bytes);

    let mut real_header = header_block("short.txt", 0, 4, ZERO_MAGIC);
    let checksum = checksum_of(&{
        let mut zeroed = real_header.clone();
        zeroed[148..156].copy_from_slice(b"        ");
        zeroed
    });
    real_header[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());
    archive_bytes.extend(real_header);
    archive_bytes.extend(b"data");
    pad_to_block(&mut archive_bytes);
    archive_bytes.extend(std::iter::repeat(0u8).take(1024));

    let mut archive = Archive::open(Cursor::new(archive_bytes), ArchiveOptions::default()).unwrap();
    let mut entry = archive.next_entry().unwrap().unwrap();
    assert_eq!(entry.name.as_str(), long_name);
    let mut data = Vec::new();
    entry.data_mut().unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data, b"data");
    assert!(archive.next_entry().unwrap().is_none());
}

#[test]
fn global_pax_attributes_persist_across_entries() {
    let global_record: &[u8] = b"20 uname=globaluser\n";
    let mut archive_bytes = Vec::new();

    let mut global_header = header_block(
        "PaxHeaders/global",
        b'g',
        global_record.len() as u64,
        USTAR_MAGIC_VERSION,
    );
    let checksum = checksum_of(&{
        let mut zeroed = global_header.clone();
        zeroed[148..156].copy_from_slice(b"        ");
        zeroed
    });
    global_header[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());
    archive_bytes.extend(global_header);
    archive_bytes.extend(global_record);
    pad_to_block(&mut archive_bytes);

    for name in ["first.txt", "second.txt"] {
        let mut header = header_block(name, b'0', 1, USTAR_MAGIC_VERSION);
        let checksum = checksum_of(&{
            let mut zeroed = header.clone();
            zeroed[148..156].copy_from_slice(b"        ");
            zeroed
        });
        header[148..156].copy_from_slice(format!("{checksum:06o}\0 ").as_bytes());
        archive_bytes.extend(header);
        archive_bytes.extend(b"x");
        pad_to_block(&mut archive_bytes);
    }
    archive_bytes.extend(std::iter::repeat(0u8).take(1024));

    let mut archive = Archive::open(Cursor::new(archive_bytes), ArchiveOptions::default()).unwrap();
    let first = archive.next_entry().unwrap().unwrap();
    assert_eq!(first.uname, "globaluser");
    let second = archive.next_entry().unwrap().unwrap();
    assert_eq!(second.uname, "globaluser");
    assert!(archive.next_entry().unwrap().is_none());
}

#[test]
fn gnu_sparse_type_flag_is_rejected() {
    let block = header_block("sparse.bin", b'S', 0, ZERO_MAGIC);
    let mut archive = Archive::open(Cursor::new(block), ArchiveOptions::default()).unwrap();
    let err = archive.next_entry().unwrap_err();
    assert!(matches!(err, TarError::Unsupported(_)));
}

#[test]
fn checksum_mismatch_is_reported() {
    let mut block = header_block("bad.txt", b'0', 0, ZERO_MAGIC);
    block[148] = b'9';
    let mut archive = Archive::open(Cursor::new(block), ArchiveOptions::default()).unwrap();
    let err = archive.next_entry().unwrap_err();
    assert!(matches!(err, TarError::ChecksumMismatch { .. }));
}

#[test]
fn dispose_makes_further_reads_fail() {
    let block = vec![0u8; 1024];
    let mut archive = Archive::open(Cursor::new(block), ArchiveOptions::default()).unwrap();
    assert!(archive.next_entry().unwrap().is_none());
    assert!(matches!(
        archive.next_entry(),
        Err(TarError::UseAfterFree)
    ));
    archive.dispose();
    assert!(matches!(
        archive.next_entry(),
        Err(TarError::UseAfterFree)
    ));
}
