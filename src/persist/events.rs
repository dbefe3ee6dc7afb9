//! Binary event journal.
//!
//! Layout (big-endian): `b"MAZELOG"`, width `u32`, height `u32`, then a flat
//! run of records `tag u8, x u16, y u16`, carve records carrying one more
//! byte: the wall bit of the carved direction. An unmark record clears every
//! solver mark (scan, aux and path bits) on its cell.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, warn};

use crate::error::{MazeError, Result};
use crate::grid::{Direction, Pos};

pub const LOG_MAGIC: &[u8; 7] = b"MAZELOG";

/// Largest side length whose coordinates fit the 16-bit record fields.
pub const MAX_LOG_SIDE: u32 = 1 << 16;

pub const TAG_VISIT: u8 = 0x02;
pub const TAG_CARVE: u8 = 0x03;
pub const TAG_PATH_ADD: u8 = 0x04;
pub const TAG_PATH_REMOVE: u8 = 0x05;
pub const TAG_SCAN: u8 = 0x06;
pub const TAG_SCAN_AUX: u8 = 0x07;
pub const TAG_UNMARK: u8 = 0x08;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Generator visited (carved into) a cell.
    Visit(Pos),
    /// Wall between a cell and its neighbour in the given direction removed.
    Carve(Pos, Direction),
    PathAdd(Pos),
    PathRemove(Pos),
    /// Solver scanned a cell.
    Scan(Pos),
    /// Solver's auxiliary mark (second visit, backward frontier, filled).
    ScanAux(Pos),
    /// Solver marks cleared before a new run.
    Unmark(Pos),
}

impl Event {
    pub fn tag(&self) -> u8 {
        match self {
            Event::Visit(_) => TAG_VISIT,
            Event::Carve(..) => TAG_CARVE,
            Event::PathAdd(_) => TAG_PATH_ADD,
            Event::PathRemove(_) => TAG_PATH_REMOVE,
            Event::Scan(_) => TAG_SCAN,
            Event::ScanAux(_) => TAG_SCAN_AUX,
            Event::Unmark(_) => TAG_UNMARK,
        }
    }

    pub fn pos(&self) -> Pos {
        match *self {
            Event::Visit(p)
            | Event::Carve(p, _)
            | Event::PathAdd(p)
            | Event::PathRemove(p)
            | Event::Scan(p)
            | Event::ScanAux(p)
            | Event::Unmark(p) => p,
        }
    }

    fn encode(&self, buf: &mut [u8; 6]) -> usize {
        let pos = self.pos();
        buf[0] = self.tag();
        buf[1..3].copy_from_slice(&(pos.x as u16).to_be_bytes());
        buf[3..5].copy_from_slice(&(pos.y as u16).to_be_bytes());
        match self {
            Event::Carve(_, dir) => {
                buf[5] = dir.wall_bit();
                6
            }
            _ => 5,
        }
    }
}

fn check_side(width: u32, height: u32) -> Result<()> {
    if width > MAX_LOG_SIDE || height > MAX_LOG_SIDE {
        return Err(MazeError::CoordinateOverflow { width, height });
    }
    Ok(())
}

/// Buffered journal sink.
///
/// `record` is infallible so grid mutators stay infallible; the first I/O
/// error is kept, further records are dropped, and `finish` reports it.
pub struct EventWriter {
    out: BufWriter<Box<dyn Write + Send>>,
    width: u32,
    height: u32,
    written: u64,
    error: Option<io::Error>,
}

impl EventWriter {
    pub fn new(out: Box<dyn Write + Send>, width: u32, height: u32) -> Result<Self> {
        check_side(width, height)?;
        let mut out = BufWriter::new(out);
        out.write_all(LOG_MAGIC)?;
        out.write_all(&width.to_be_bytes())?;
        out.write_all(&height.to_be_bytes())?;
        Ok(Self {
            out,
            width,
            height,
            written: 0,
            error: None,
        })
    }

    pub fn create(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Self> {
        check_side(width, height)?;
        let file = File::create(path.as_ref())?;
        debug!("event log: writing {}", path.as_ref().display());
        Self::new(Box::new(file), width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Events successfully handed to the buffer so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn record(&mut self, event: Event) {
        if self.error.is_some() {
            return;
        }
        let mut buf = [0u8; 6];
        let len = event.encode(&mut buf);
        match self.out.write_all(&buf[..len]) {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!("event log: write failed after {} events: {e}", self.written);
                self.error = Some(e);
            }
        }
    }

    /// Flush and close, returning the number of events written.
    pub fn finish(mut self) -> Result<u64> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.out.flush()?;
        debug!("event log: {} events", self.written);
        Ok(self.written)
    }
}

/// Streaming journal reader.
pub struct EventReader<R> {
    input: R,
    width: u32,
    height: u32,
    consumed: u64,
}

impl EventReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }
}

impl<R: Read> EventReader<R> {
    pub fn new(mut input: R) -> Result<Self> {
        let mut header = [0u8; 15];
        input.read_exact(&mut header).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => MazeError::BadMagic {
                expected: LOG_MAGIC,
            },
            _ => e.into(),
        })?;
        if &header[..7] != LOG_MAGIC {
            return Err(MazeError::BadMagic {
                expected: LOG_MAGIC,
            });
        }
        let width = u32::from_be_bytes([header[7], header[8], header[9], header[10]]);
        let height = u32::from_be_bytes([header[11], header[12], header[13], header[14]]);
        Ok(Self {
            input,
            width,
            height,
            consumed: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Complete events read so far.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Read one event. `Ok(None)` at a clean end of log; `TruncatedLog` when
    /// the log stops inside a record.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let mut tag = [0u8; 1];
        loop {
            match self.input.read(&mut tag) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let tag = tag[0];
        if !matches!(tag, TAG_VISIT..=TAG_UNMARK) {
            return Err(MazeError::UnknownEvent(tag));
        }

        let mut body = [0u8; 4];
        self.read_body(&mut body)?;
        let pos = Pos::new(
            u32::from(u16::from_be_bytes([body[0], body[1]])),
            u32::from(u16::from_be_bytes([body[2], body[3]])),
        );
        let event = match tag {
            TAG_VISIT => Event::Visit(pos),
            TAG_CARVE => {
                let mut dir = [0u8; 1];
                self.read_body(&mut dir)?;
                let dir = Direction::from_wall_bit(dir[0])
                    .ok_or(MazeError::InvalidDirection(dir[0]))?;
                Event::Carve(pos, dir)
            }
            TAG_PATH_ADD => Event::PathAdd(pos),
            TAG_PATH_REMOVE => Event::PathRemove(pos),
            TAG_SCAN => Event::Scan(pos),
            TAG_SCAN_AUX => Event::ScanAux(pos),
            TAG_UNMARK => Event::Unmark(pos),
            other => return Err(MazeError::UnknownEvent(other)),
        };
        self.consumed += 1;
        Ok(Some(event))
    }

    fn read_body(&mut self, buf: &mut [u8]) -> Result<()> {
        self.input.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => MazeError::TruncatedLog {
                consumed: self.consumed,
            },
            _ => e.into(),
        })
    }
}

impl<R: Read> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};

    use super::{Event, EventReader, EventWriter, LOG_MAGIC};
    use crate::error::MazeError;
    use crate::grid::{Direction, Pos};

    /// Write sink that keeps its bytes reachable after the writer is gone.
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn encode(events: &[Event]) -> Vec<u8> {
        let sink = Shared::default();
        let mut writer = EventWriter::new(Box::new(sink.clone()), 300, 2).unwrap();
        for &e in events {
            writer.record(e);
        }
        assert_eq!(writer.finish().unwrap(), events.len() as u64);
        let bytes = sink.0.lock().unwrap().clone();
        bytes
    }

    #[test]
    fn header_and_record_layout() {
        let bytes = encode(&[
            Event::Visit(Pos::new(258, 1)),
            Event::Carve(Pos::new(1, 0), Direction::South),
        ]);
        assert_eq!(&bytes[..7], LOG_MAGIC);
        assert_eq!(&bytes[7..15], &[0, 0, 1, 44, 0, 0, 0, 2]);
        assert_eq!(&bytes[15..20], &[0x02, 1, 2, 0, 1]);
        assert_eq!(&bytes[20..26], &[0x03, 0, 1, 0, 0, 0x04]);
        assert_eq!(bytes.len(), 26);
    }

    #[test]
    fn reader_decodes_what_writer_wrote() {
        let events = [
            Event::Visit(Pos::new(0, 0)),
            Event::Carve(Pos::new(0, 0), Direction::East),
            Event::Scan(Pos::new(1, 0)),
            Event::ScanAux(Pos::new(1, 1)),
            Event::PathAdd(Pos::new(1, 0)),
            Event::PathRemove(Pos::new(1, 0)),
            Event::Unmark(Pos::new(0, 1)),
        ];
        let reader = EventReader::new(Cursor::new(encode(&events))).unwrap();
        assert_eq!((reader.width(), reader.height()), (300, 2));
        let decoded: Vec<Event> = reader.map(Result::unwrap).collect();
        assert_eq!(decoded, events);
    }

    #[test]
    fn partial_record_reports_truncation() {
        let mut bytes = encode(&[Event::Visit(Pos::new(0, 0)), Event::Visit(Pos::new(1, 0))]);
        bytes.truncate(bytes.len() - 2);
        let mut reader = EventReader::new(Cursor::new(bytes)).unwrap();
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(
            reader.next_event(),
            Err(MazeError::TruncatedLog { consumed: 1 })
        ));
    }

    #[test]
    fn bad_magic_and_bad_tags_are_rejected() {
        assert!(matches!(
            EventReader::new(Cursor::new(b"MAZEFILE_AND_MORE".to_vec())),
            Err(MazeError::BadMagic { .. })
        ));

        let mut bytes = encode(&[]);
        bytes.extend_from_slice(&[0x09, 0, 0, 0, 0]);
        let mut reader = EventReader::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(reader.next_event(), Err(MazeError::UnknownEvent(0x09))));
    }

    #[test]
    fn unknown_tag_at_end_of_log_is_not_truncation() {
        let mut bytes = encode(&[Event::Visit(Pos::new(0, 0))]);
        bytes.push(0x7F);
        let mut reader = EventReader::new(Cursor::new(bytes)).unwrap();
        assert!(reader.next_event().unwrap().is_some());
        assert!(matches!(reader.next_event(), Err(MazeError::UnknownEvent(0x7F))));
        assert_eq!(reader.consumed(), 1);
    }

    #[test]
    fn oversize_grids_cannot_be_journaled() {
        let sink = Shared::default();
        assert!(matches!(
            EventWriter::new(Box::new(sink), 70_000, 4),
            Err(MazeError::CoordinateOverflow { .. })
        ));
    }
}
