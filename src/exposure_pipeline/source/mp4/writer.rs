//! Writer for minimal MP4 files carrying only a GPMF track.
//!
//! Used to produce fixtures; each payload gets its own chunk in a single
//! `mdat` placed before `moov`.

use crate::exposure_pipeline::source::mp4::atoms::{FORMAT_GPMD, HANDLER_META};

fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&((body.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn full_box_table(kind: &[u8; 4], entries: &[&[u32]]) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        for value in *entry {
            body.extend_from_slice(&value.to_be_bytes());
        }
    }
    atom(kind, &body)
}

/// Builds an MP4 whose `meta`/`gpmd` track holds `payloads`, each lasting
/// `payload_duration` units of `timescale`.
pub fn build_metadata_mp4(payloads: &[Vec<u8>], timescale: u32, payload_duration: u32) -> Vec<u8> {
    let ftyp = atom(b"ftyp", b"mp41\0\0\0\0mp41");

    let mdat_body: Vec<u8> = payloads.concat();
    let mdat = atom(b"mdat", &mdat_body);

    let mut offsets = Vec::with_capacity(payloads.len());
    let mut offset = (ftyp.len() + 8) as u32;
    for payload in payloads {
        offsets.push(offset);
        offset += payload.len() as u32;
    }

    let count = payloads.len() as u32;
    let duration = count * payload_duration;

    let mut mdhd = vec![0u8; 12];
    mdhd.extend_from_slice(&timescale.to_be_bytes());
    mdhd.extend_from_slice(&duration.to_be_bytes());
    mdhd.extend_from_slice(&[0u8; 4]);

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(&HANDLER_META);
    hdlr.extend_from_slice(&[0u8; 13]);

    let mut stsd = vec![0u8; 4];
    stsd.extend_from_slice(&1u32.to_be_bytes());
    stsd.extend_from_slice(&16u32.to_be_bytes());
    stsd.extend_from_slice(&FORMAT_GPMD);
    stsd.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);

    let mut stsz = vec![0u8; 8];
    stsz.extend_from_slice(&count.to_be_bytes());
    for payload in payloads {
        stsz.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    }

    let offset_entries: Vec<[u32; 1]> = offsets.iter().map(|o| [*o]).collect();
    let offset_refs: Vec<&[u32]> = offset_entries.iter().map(|e| e.as_slice()).collect();

    let stbl = [
        atom(b"stsd", &stsd),
        full_box_table(b"stts", &[&[count, payload_duration]]),
        full_box_table(b"stsc", &[&[1, 1, 1]]),
        atom(b"stsz", &stsz),
        full_box_table(b"stco", &offset_refs),
    ]
    .concat();

    let minf = atom(b"minf", &atom(b"stbl", &stbl));
    let mdia = atom(
        b"mdia",
        &[atom(b"mdhd", &mdhd), atom(b"hdlr", &hdlr), minf].concat(),
    );
    let moov = atom(b"moov", &atom(b"trak", &mdia));

    [ftyp, mdat, moov].concat()
}
