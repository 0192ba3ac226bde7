//! Stream builders shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

/// EBML element with an eight-byte size field.
pub fn ebml(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(0x0100_0000_0000_0000u64 | body.len() as u64).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// ISO-BMFF box with a 32-bit size.
pub fn mp4_box(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    out
}

/// EBML header declaring DocType "webm".
pub fn webm_header() -> Vec<u8> {
    ebml(
        &[0x1A, 0x45, 0xDF, 0xA3],
        &[ebml(&[0x42, 0x86], &[1]), ebml(&[0x42, 0x82], b"webm")].concat(),
    )
}

pub fn webm_cluster(timecode: u8) -> Vec<u8> {
    ebml(
        &[0x1F, 0x43, 0xB6, 0x75],
        &[ebml(&[0xE7], &[timecode]), ebml(&[0xA3], &[0x81, 0, 0, 0x80, 0xAA])].concat(),
    )
}

/// A 210-byte VP8 WebM stream: 2 seconds long, init segment of 138 bytes,
/// then two 36-byte clusters at timecodes 0 and 100.
pub fn webm_stream() -> Vec<u8> {
    let info = ebml(
        &[0x15, 0x49, 0xA9, 0x66],
        &[
            ebml(&[0x2A, 0xD7, 0xB1], &[0x0F, 0x42, 0x40]),
            ebml(&[0x44, 0x89], &2000.0f64.to_be_bytes()),
        ]
        .concat(),
    );
    let track = ebml(
        &[0xAE],
        &[ebml(&[0xD7], &[1]), ebml(&[0x86], b"V_VP8")].concat(),
    );
    let tracks = ebml(&[0x16, 0x54, 0xAE, 0x6B], &track);
    let segment = ebml(
        &[0x18, 0x53, 0x80, 0x67],
        &[info, tracks, webm_cluster(0), webm_cluster(100)].concat(),
    );
    [webm_header(), segment].concat()
}

/// A fragmented MP4 stream with one `moof`/`mdat` pair.
pub fn fmp4_stream() -> Vec<u8> {
    let ftyp = mp4_box(b"ftyp", b"iso5\0\0\0\x01iso5");
    let stbl = mp4_box(b"stbl", &mp4_box(b"stsd", &[0; 8]));
    let minf = mp4_box(b"minf", &stbl);
    let mdia = mp4_box(b"mdia", &minf);
    let trak = mp4_box(b"trak", &mdia);
    let moov = mp4_box(b"moov", &[mp4_box(b"mvhd", &[0; 100]), trak].concat());

    let mut tfhd = 0x18u32.to_be_bytes().to_vec();
    for field in [1u32, 1000, 500] {
        tfhd.extend_from_slice(&field.to_be_bytes());
    }
    let mut trun = 0x0000_0201u32.to_be_bytes().to_vec();
    for field in [2u32, 0x50, 300, 700] {
        trun.extend_from_slice(&field.to_be_bytes());
    }
    let traf = mp4_box(b"traf", &[mp4_box(b"tfhd", &tfhd), mp4_box(b"trun", &trun)].concat());
    let moof = mp4_box(b"moof", &[mp4_box(b"mfhd", &[0, 0, 0, 0, 0, 0, 0, 1]), traf].concat());
    let mdat = mp4_box(b"mdat", &[0; 1000]);

    [ftyp, moov, moof, mdat].concat()
}

/// Write `data` to `name` inside a fresh temporary directory.
pub fn write_fixture(name: &str, data: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, data).unwrap();
    (dir, path)
}
