//! Integration tests for msetools-validator

use msetools_validator::{
    new_validator, ByteStreamValidator, IsoBmffValidator, TypeInfo, WebmValidator,
    PREVIOUS_PARSER_ERROR,
};

/// EBML element with an eight-byte size field.
fn ebml(id: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(0x0100_0000_0000_0000u64 | body.len() as u64).to_be_bytes());
    out.extend_from_slice(body);
    out
}

fn mp4_box(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(tag);
    out.extend_from_slice(body);
    out
}

fn webm_stream() -> Vec<u8> {
    let header = ebml(
        &[0x1A, 0x45, 0xDF, 0xA3],
        &[ebml(&[0x42, 0x86], &[1]), ebml(&[0x42, 0x82], b"webm")].concat(),
    );
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
    let cluster = |timecode: u8| {
        ebml(
            &[0x1F, 0x43, 0xB6, 0x75],
            &[ebml(&[0xE7], &[timecode]), ebml(&[0xA3], &[0x81, 0, 0, 0x80, 0xAA])].concat(),
        )
    };
    let segment = ebml(
        &[0x18, 0x53, 0x80, 0x67],
        &[info, tracks, cluster(0), cluster(100)].concat(),
    );
    [header, segment].concat()
}

fn fmp4_stream() -> Vec<u8> {
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

fn parse_in_chunks(validator: &mut dyn ByteStreamValidator, data: &[u8], chunk: usize) -> Vec<String> {
    let mut errors = Vec::new();
    for piece in data.chunks(chunk) {
        errors.extend(validator.parse(piece));
    }
    errors.extend(validator.end_of_stream());
    errors
}

#[test]
fn test_webm_stream_is_valid_at_any_chunk_size() {
    let data = webm_stream();
    for chunk in [1, 2, 3, 7, 64, data.len()] {
        let mut validator = WebmValidator::new();
        let errors = parse_in_chunks(&mut validator, &data, chunk);
        assert!(errors.is_empty(), "chunk {}: {:?}", chunk, errors);
    }
}

#[test]
fn test_fmp4_stream_is_valid_at_any_chunk_size() {
    let data = fmp4_stream();
    for chunk in [1, 5, 8, 100, data.len()] {
        let mut validator = IsoBmffValidator::new();
        let errors = parse_in_chunks(&mut validator, &data, chunk);
        assert!(errors.is_empty(), "chunk {}: {:?}", chunk, errors);

        let run = validator.client().last_trun().unwrap();
        let sizes: Vec<_> = run.samples().map(|s| (s.duration, s.size)).collect();
        assert_eq!(sizes, vec![(Some(1000), Some(300)), (Some(1000), Some(700))]);
    }
}

#[test]
fn test_truncated_stream_reported_at_end() {
    let data = webm_stream();
    let mut validator = WebmValidator::new();
    assert!(validator.parse(&data[..data.len() - 2]).is_empty());

    let errors = validator.end_of_stream();
    // Cluster and Segment are still open, and the SimpleBlock is incomplete.
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors[0].contains("Cluster"));
    assert!(errors[1].contains("Segment"));
}

#[test]
fn test_error_poisons_until_reset() {
    let mut validator = new_validator(&TypeInfo::new("video", "mp4")).unwrap();

    let errors = validator.parse(&[0, 0, 0, 0, b'f', b't', b'y', b'p']);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Box size of 0"));

    assert_eq!(validator.parse(&fmp4_stream()), vec![PREVIOUS_PARSER_ERROR]);
    assert_eq!(validator.end_of_stream(), vec![PREVIOUS_PARSER_ERROR]);

    validator.reset();
    assert!(validator.parse(&fmp4_stream()).is_empty());
}

#[test]
fn test_wrong_format_is_rejected() {
    let mut validator = new_validator(&TypeInfo::new("video", "webm")).unwrap();
    let errors = validator.parse(&fmp4_stream());
    assert_eq!(errors.len(), 1, "{:?}", errors);
}

#[test]
fn test_child_overrunning_segment_is_rejected() {
    // Segment declares three body bytes; its Info child is larger.
    let mut data = vec![0x18, 0x53, 0x80, 0x67, 0x83];
    data.extend(ebml(&[0x15, 0x49, 0xA9, 0x66], &[]));

    let mut validator = WebmValidator::new();
    let errors = validator.parse(&data);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Segment"), "{}", errors[0]);
}
