//! Full-cycle tests: header writing, identification, header parsing, and
//! sample transfer composed the way a caller would.

use audiofile_core::{
    format_by_id, formats, identify, make_decoder, make_encoder, read_header, AudioFileSpec,
    Endian, Error, SampleFormat,
};
use std::io::Cursor;

fn ramp(frames: usize, phase: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| ((i as f32 / frames as f32) * 2.0 - 1.0) * 0.9 + phase)
        .collect()
}

#[test]
fn aiff_int16_write_read_cycle() {
    let frames = 200usize;
    let left = ramp(frames, 0.0);
    let right = ramp(frames, 0.05);

    let mut spec = AudioFileSpec::new(SampleFormat::Int16, 2, 44100.0, frames as u64);
    spec.container = Some("aiff".to_string());

    let format = format_by_id("aiff").unwrap();
    let mut file = Vec::new();
    let endian = format.write_header(&mut file, &spec).unwrap();
    let mut encoder = make_encoder(&spec, endian, &mut file).unwrap();
    encoder
        .write_frames(&[&left, &right], 0, frames)
        .unwrap();

    let mut cursor = Cursor::new(file);
    let detected = identify(&mut cursor).unwrap().unwrap();
    assert_eq!(detected.id(), "aiff");

    let (_, parsed, endian) = read_header(&mut cursor).unwrap();
    assert_eq!(parsed, spec);
    assert_eq!(endian, Endian::Big);

    let mut decoder = make_decoder(&parsed, endian, cursor).unwrap();
    let mut l = vec![0f32; frames];
    let mut r = vec![0f32; frames];
    decoder
        .read_frames(&mut [Some(l.as_mut_slice()), Some(r.as_mut_slice())], 0, frames)
        .unwrap();

    let step = 1.0 / 32767.0;
    for i in 0..frames {
        assert!((l[i] - left[i]).abs() <= step, "frame {i} left");
        assert!((r[i] - right[i]).abs() <= step, "frame {i} right");
    }
}

#[test]
fn aifc_float32_write_read_cycle_is_lossless() {
    let frames = 64usize;
    let samples = ramp(frames, 0.0);

    let mut spec = AudioFileSpec::new(SampleFormat::Float32, 1, 96000.0, frames as u64);
    spec.container = Some("aiff".to_string());

    let format = format_by_id("aiff").unwrap();
    let mut file = Vec::new();
    let endian = format.write_header(&mut file, &spec).unwrap();
    let mut encoder = make_encoder(&spec, endian, &mut file).unwrap();
    encoder.write_frames(&[&samples], 0, frames).unwrap();

    let mut cursor = Cursor::new(file);
    let (_, parsed, endian) = read_header(&mut cursor).unwrap();
    assert_eq!(parsed, spec);

    let mut decoder = make_decoder(&parsed, endian, cursor).unwrap();
    let mut out = vec![0f32; frames];
    decoder.read_frames(&mut [Some(out.as_mut_slice())], 0, frames).unwrap();
    assert_eq!(out, samples);
}

#[test]
fn wave_synthetic_file_decodes() {
    // Hand-built RIFF file: 8 stereo 16-bit frames with known values, all
    // exact fractions of 32767.
    let frames: [[i16; 2]; 8] = [
        [0, 0],
        [16384, -16384],
        [32767, -32767],
        [1, -1],
        [8192, -8192],
        [4096, -4096],
        [2048, -2048],
        [1024, -1024],
    ];
    let mut file = Vec::new();
    file.extend_from_slice(b"RIFF");
    file.extend_from_slice(&68u32.to_le_bytes());
    file.extend_from_slice(b"WAVE");
    file.extend_from_slice(b"fmt ");
    file.extend_from_slice(&16u32.to_le_bytes());
    file.extend_from_slice(&1u16.to_le_bytes()); // PCM
    file.extend_from_slice(&2u16.to_le_bytes());
    file.extend_from_slice(&44100u32.to_le_bytes());
    file.extend_from_slice(&176400u32.to_le_bytes());
    file.extend_from_slice(&4u16.to_le_bytes());
    file.extend_from_slice(&16u16.to_le_bytes());
    file.extend_from_slice(b"data");
    file.extend_from_slice(&32u32.to_le_bytes());
    for [l, r] in frames {
        file.extend_from_slice(&l.to_le_bytes());
        file.extend_from_slice(&r.to_le_bytes());
    }

    let mut cursor = Cursor::new(file);
    let (format, spec, endian) = read_header(&mut cursor).unwrap();
    assert_eq!(format.id(), "wave");
    assert_eq!(spec.sample_format, SampleFormat::Int16);
    assert_eq!(spec.num_channels, 2);
    assert_eq!(spec.sample_rate, 44100.0);
    assert_eq!(spec.num_frames, 8);
    assert_eq!(endian, Endian::Little);

    let mut decoder = make_decoder(&spec, endian, cursor).unwrap();
    let mut l = [0f32; 8];
    let mut r = [0f32; 8];
    decoder
        .read_frames(&mut [Some(l.as_mut_slice()), Some(r.as_mut_slice())], 0, 8)
        .unwrap();
    for (i, [el, er]) in frames.iter().enumerate() {
        assert_eq!(l[i], *el as f32 / 32767.0, "frame {i} left");
        assert_eq!(r[i], *er as f32 / 32767.0, "frame {i} right");
    }
}

#[test]
fn unknown_prefix_is_not_identified() {
    let mut cursor = Cursor::new(b"OggS\x00\x02\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00".to_vec());
    assert!(identify(&mut cursor).unwrap().is_none());
    assert!(matches!(
        read_header(&mut cursor).unwrap_err(),
        Error::UnknownFormat
    ));
}

#[test]
fn probes_are_mutually_exclusive() {
    // Adversarial prefixes that begin like one format must match only it.
    let cases: &[(&str, Vec<u8>)] = &[
        ("aiff", {
            let mut p = b"FORM\x00\x00\x00\x04AIFF".to_vec();
            p.resize(16, 0);
            p
        }),
        ("wave", {
            let mut p = b"RIFF\x00\x00\x00\x04WAVE".to_vec();
            p.resize(16, 0);
            p
        }),
        ("next", {
            let mut p = b".snd".to_vec();
            p.resize(16, 0);
            p
        }),
        ("ircam", {
            let mut p = vec![0x64, 0xA3, 0x02, 0x00];
            p.resize(16, 0);
            p
        }),
        (
            "wave64",
            vec![
                0x72, 0x69, 0x66, 0x66, 0x2E, 0x91, 0xCF, 0x11, 0xA5, 0xD6, 0x28, 0xDB, 0x04,
                0xC1, 0x00, 0x00,
            ],
        ),
    ];
    for (expected, prefix) in cases {
        let matching: Vec<String> = formats()
            .iter()
            .filter(|f| f.probe(prefix))
            .map(|f| f.id().to_string())
            .collect();
        assert_eq!(matching, [expected.to_string()], "prefix for {expected}");
    }
}

#[test]
fn next_and_ircam_parse_through_public_api() {
    // NeXT: 2 frames of mono float64 at 8000 Hz.
    let mut snd = b".snd".to_vec();
    snd.extend_from_slice(&24u32.to_be_bytes());
    snd.extend_from_slice(&16u32.to_be_bytes());
    snd.extend_from_slice(&7u32.to_be_bytes());
    snd.extend_from_slice(&8000u32.to_be_bytes());
    snd.extend_from_slice(&1u32.to_be_bytes());
    snd.extend_from_slice(&[0u8; 16]);
    let (format, spec, endian) = read_header(&mut Cursor::new(snd)).unwrap();
    assert_eq!(format.id(), "next");
    assert_eq!(spec.sample_format, SampleFormat::Float64);
    assert_eq!(spec.num_frames, 2);
    assert_eq!(endian, Endian::Big);

    // IRCAM: 3 frames of mono 16-bit at 22050 Hz, big-endian variant.
    let mut sf = vec![0x64, 0xA3, 0x02, 0x00];
    sf.extend_from_slice(&22050.0f32.to_bits().to_be_bytes());
    sf.extend_from_slice(&1u32.to_be_bytes());
    sf.extend_from_slice(&2u32.to_be_bytes());
    sf.extend_from_slice(&0u32.to_be_bytes()); // end record tag
    sf.extend_from_slice(&0u32.to_be_bytes()); // end record size
    sf.extend_from_slice(&[0u8; 6]);
    let (format, spec, endian) = read_header(&mut Cursor::new(sf)).unwrap();
    assert_eq!(format.id(), "ircam");
    assert_eq!(spec.sample_format, SampleFormat::Int16);
    assert_eq!(spec.num_frames, 3);
    assert_eq!(endian, Endian::Big);
}
