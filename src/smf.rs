//! Standard MIDI File reader and writer

use crate::error::{PolyError, Result};
use crate::midi::{
    short_data_len, DivisionType, MidiEvent, MidiMessage, Sequence, Track, META_END_OF_TRACK,
    SYSEX_END, SYSEX_START,
};
use std::path::Path;

const MTHD: u32 = 0x4D54_6864;
const MTRK: u32 = 0x4D54_726B;

/// Big-endian cursor over raw SMF bytes
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn eof(&self) -> PolyError {
        PolyError::InvalidMidiData("unexpected end of data".to_string())
    }

    fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(self.eof());
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    fn peek_u8(&self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(self.eof());
        }
        Ok(self.data[self.pos])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let hi = self.read_u8()? as u16;
        let lo = self.read_u8()? as u16;
        Ok((hi << 8) | lo)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let hi = self.read_u16()? as u32;
        let lo = self.read_u16()? as u32;
        Ok((hi << 16) | lo)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.pos + len > self.data.len() {
            return Err(self.eof());
        }
        let bytes = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        if self.pos + len > self.data.len() {
            return Err(self.eof());
        }
        self.pos += len;
        Ok(())
    }
}

/// Decode a variable-length quantity: 7-bit groups, most significant first,
/// high bit set on all but the last byte.
fn read_vlq(reader: &mut ByteReader) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..4 {
        let byte = reader.read_u8()?;
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(PolyError::InvalidMidiData(
        "variable-length quantity longer than four bytes".to_string(),
    ))
}

/// Encode a variable-length quantity
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 4];
    let mut index = 3;
    bytes[index] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        index -= 1;
        bytes[index] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[index..]);
}

/// Parse a Standard MIDI File from raw bytes
pub fn read_sequence(data: &[u8]) -> Result<Sequence> {
    let mut reader = ByteReader::new(data);

    if reader.read_u32()? != MTHD {
        return Err(PolyError::InvalidMidiData(
            "missing MThd header chunk".to_string(),
        ));
    }
    let header_len = reader.read_u32()?;
    if header_len < 6 {
        return Err(PolyError::InvalidMidiData(format!(
            "header chunk too short: {} bytes",
            header_len
        )));
    }
    let file_type = reader.read_u16()?;
    if file_type > 2 {
        return Err(PolyError::InvalidMidiData(format!(
            "unknown file type {}",
            file_type
        )));
    }
    let ntracks = reader.read_u16()?;
    if ntracks == 0 {
        return Err(PolyError::InvalidMidiData(
            "file declares zero tracks".to_string(),
        ));
    }
    let division = reader.read_u16()?;
    reader.skip((header_len - 6) as usize)?;

    let (division_type, resolution) = decode_division(division)?;

    let mut sequence = Sequence::new(division_type, resolution, file_type);
    for _ in 0..ntracks {
        sequence.tracks.push(read_track(&mut reader)?);
    }
    Ok(sequence)
}

/// Read a Standard MIDI File from disk
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Sequence> {
    let data = std::fs::read(path)?;
    read_sequence(&data)
}

fn decode_division(word: u16) -> Result<(DivisionType, u16)> {
    if word & 0x8000 == 0 {
        return Ok((DivisionType::Ppq, word & 0x7FFF));
    }
    // SMPTE: high byte is the negated frame rate, low byte ticks per frame
    let frames_per_second = -((word >> 8) as u8 as i8) as i32;
    let division_type = match frames_per_second {
        24 => DivisionType::Smpte24,
        25 => DivisionType::Smpte25,
        29 => DivisionType::Smpte30Drop,
        30 => DivisionType::Smpte30,
        other => {
            return Err(PolyError::InvalidMidiData(format!(
                "unsupported SMPTE frame rate {}",
                other
            )))
        }
    };
    Ok((division_type, word & 0xFF))
}

fn read_track(reader: &mut ByteReader) -> Result<Track> {
    // Skip alien chunks until the next MTrk
    let track_len = loop {
        let magic = reader.read_u32()?;
        let len = reader.read_u32()? as usize;
        if magic == MTRK {
            break len;
        }
        reader.skip(len)?;
    };
    let end = reader.pos + track_len;
    if end > reader.data.len() {
        return Err(PolyError::InvalidMidiData(
            "track chunk length exceeds data".to_string(),
        ));
    }

    let mut track = Track::new();
    let mut tick = 0u64;
    let mut running_status: Option<u8> = None;
    let mut terminated = false;

    while reader.pos < end {
        let delta = read_vlq(reader)?;
        tick += delta as u64;

        // Running status: a data byte here reuses the last channel status
        let status = if reader.peek_u8()? >= 0x80 {
            reader.read_u8()?
        } else {
            running_status.ok_or_else(|| {
                PolyError::InvalidMidiData("data byte without running status".to_string())
            })?
        };

        match status {
            0xFF => {
                running_status = None;
                let kind = reader.read_u8()?;
                let len = read_vlq(reader)? as usize;
                let data = reader.read_bytes(len)?;
                track.add(MidiEvent::new(tick, MidiMessage::meta(kind, data)));
                if kind == META_END_OF_TRACK {
                    terminated = true;
                    break;
                }
            }
            SYSEX_START | SYSEX_END => {
                running_status = None;
                let len = read_vlq(reader)? as usize;
                let data = reader.read_bytes(len)?;
                track.add(MidiEvent::new(tick, MidiMessage::sysex(status, data)));
            }
            status if (0x80..0xF0).contains(&status) => {
                running_status = Some(status);
                let data1 = reader.read_u8()?;
                let data2 = if short_data_len(status) == 2 {
                    reader.read_u8()?
                } else {
                    0
                };
                track.add(MidiEvent::new(tick, MidiMessage::short(status, data1, data2)));
            }
            status => {
                // System common and real-time messages
                running_status = None;
                let mut data = [0u8; 2];
                for slot in data.iter_mut().take(short_data_len(status)) {
                    *slot = reader.read_u8()?;
                }
                track.add(MidiEvent::new(
                    tick,
                    MidiMessage::short(status, data[0], data[1]),
                ));
            }
        }
    }

    // Resynchronize to the chunk boundary and enforce the terminal meta
    if reader.pos < end {
        reader.pos = end;
    }
    if !terminated {
        track.add(MidiEvent::new(tick, MidiMessage::end_of_track()));
    }
    Ok(track)
}

/// Serialize a sequence as a Standard MIDI File
pub fn write_sequence(sequence: &Sequence) -> Result<Vec<u8>> {
    if sequence.tracks.is_empty() {
        return Err(PolyError::InvalidMidiData(
            "sequence has no tracks".to_string(),
        ));
    }
    if sequence.tracks.len() > u16::MAX as usize {
        return Err(PolyError::InvalidMidiData(format!(
            "too many tracks: {}",
            sequence.tracks.len()
        )));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&MTHD.to_be_bytes());
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&sequence.file_type.to_be_bytes());
    out.extend_from_slice(&(sequence.tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&encode_division(sequence).to_be_bytes());

    for track in &sequence.tracks {
        let chunk = write_track(track);
        out.extend_from_slice(&MTRK.to_be_bytes());
        out.extend_from_slice(&(chunk.len() as u32).to_be_bytes());
        out.extend_from_slice(&chunk);
    }
    Ok(out)
}

/// Write a sequence to disk as a Standard MIDI File
pub fn write_file<P: AsRef<Path>>(sequence: &Sequence, path: P) -> Result<()> {
    let bytes = write_sequence(sequence)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn encode_division(sequence: &Sequence) -> u16 {
    match sequence.division_type {
        DivisionType::Ppq => sequence.resolution & 0x7FFF,
        DivisionType::Smpte24 => smpte_word(24, sequence.resolution),
        DivisionType::Smpte25 => smpte_word(25, sequence.resolution),
        DivisionType::Smpte30Drop => smpte_word(29, sequence.resolution),
        DivisionType::Smpte30 => smpte_word(30, sequence.resolution),
    }
}

fn smpte_word(frames_per_second: i8, resolution: u16) -> u16 {
    (((-frames_per_second) as u8 as u16) << 8) | (resolution & 0xFF)
}

fn write_track(track: &Track) -> Vec<u8> {
    let mut chunk = Vec::new();
    let mut last_tick = 0u64;
    let mut running_status: Option<u8> = None;
    let mut terminated = false;

    for event in track.events() {
        let delta = event.tick.saturating_sub(last_tick);
        last_tick = event.tick.max(last_tick);
        write_vlq(&mut chunk, delta as u32);

        match &event.message {
            MidiMessage::Short {
                status,
                data1,
                data2,
            } if (0x80..0xF0).contains(status) => {
                // Running status: elide a repeated channel status byte
                if running_status != Some(*status) {
                    chunk.push(*status);
                    running_status = Some(*status);
                }
                chunk.push(*data1);
                if short_data_len(*status) == 2 {
                    chunk.push(*data2);
                }
            }
            MidiMessage::Short {
                status,
                data1,
                data2,
            } => {
                running_status = None;
                chunk.push(*status);
                let data = [*data1, *data2];
                chunk.extend_from_slice(&data[..short_data_len(*status)]);
            }
            MidiMessage::Meta { kind, data } => {
                running_status = None;
                chunk.push(0xFF);
                chunk.push(*kind);
                write_vlq(&mut chunk, data.len() as u32);
                chunk.extend_from_slice(data);
                if *kind == META_END_OF_TRACK {
                    terminated = true;
                    break;
                }
            }
            MidiMessage::Sysex { status, data } => {
                running_status = None;
                chunk.push(*status);
                write_vlq(&mut chunk, data.len() as u32);
                chunk.extend_from_slice(data);
            }
        }
    }

    // Synthesize the terminal meta when the caller did not add one
    if !terminated {
        write_vlq(&mut chunk, track.ticks().saturating_sub(last_tick) as u32);
        chunk.push(0xFF);
        chunk.push(META_END_OF_TRACK);
        chunk.push(0x00);
    }
    chunk
}
