//! Maze file format.
//!
//! Little-endian:
//!
//! | field      | size        |
//! |------------|-------------|
//! | magic      | 4 (`MAZE`)  |
//! | version    | 1           |
//! | flags      | 1           |
//! | width      | 4           |
//! | height     | 4           |
//! | meta len   | 2           |
//! | meta JSON  | meta len    |
//! | data len   | 4           |
//! | data       | data len    |
//!
//! Data is the raw cell bytes, zlib-compressed when `FLAG_COMPRESSED` is
//! set. A seed-only file stores no data and is rebuilt from its metadata.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};
use crate::generate::{GeneratorConfig, GeneratorKind, generate};
use crate::grid::CellGrid;
use crate::post::braid;

pub const MAGIC: &[u8; 4] = b"MAZE";
pub const VERSION: u8 = 1;
pub const FLAG_COMPRESSED: u8 = 0x01;
pub const FLAG_SEED_ONLY: u8 = 0x02;

/// Free-form JSON metadata. The named keys drive seed-only regeneration;
/// anything else round-trips untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MazeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub braid: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MazeMetadata {
    /// Metadata describing a generator run.
    pub fn generated(kind: GeneratorKind, seed: u64) -> Self {
        Self {
            algo: Some(kind.as_str().to_owned()),
            seed: Some(seed),
            ..Default::default()
        }
    }

    pub fn with_braid(mut self, factor: f64) -> Self {
        self.braid = Some(factor);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }

    fn extra_f64(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(serde_json::Value::as_f64)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub compress: bool,
    pub seed_only: bool,
}

impl SaveOptions {
    fn flags(self) -> u8 {
        let mut flags = 0;
        if self.compress {
            flags |= FLAG_COMPRESSED;
        }
        if self.seed_only {
            flags |= FLAG_SEED_ONLY;
        }
        flags
    }
}

pub fn write_maze<W: Write>(
    out: &mut W,
    grid: &CellGrid,
    metadata: &MazeMetadata,
    options: SaveOptions,
) -> Result<()> {
    let meta = serde_json::to_vec(metadata)?;
    let meta_len = u16::try_from(meta.len()).map_err(|_| MazeError::MetadataTooLarge(meta.len()))?;

    out.write_all(MAGIC)?;
    out.write_all(&[VERSION, options.flags()])?;
    out.write_all(&grid.width().to_le_bytes())?;
    out.write_all(&grid.height().to_le_bytes())?;
    out.write_all(&meta_len.to_le_bytes())?;
    out.write_all(&meta)?;

    if options.seed_only {
        out.write_all(&0u32.to_le_bytes())?;
        return Ok(());
    }

    let compressed;
    let data: &[u8] = if options.compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(grid.cells())?;
        compressed = encoder.finish()?;
        &compressed
    } else {
        grid.cells()
    };
    let data_len = u32::try_from(data.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "payload exceeds 4 GiB")
    })?;
    out.write_all(&data_len.to_le_bytes())?;
    out.write_all(data)?;
    Ok(())
}

/// A maze read back from disk.
#[derive(Debug)]
pub struct LoadedMaze {
    pub width: u32,
    pub height: u32,
    pub metadata: MazeMetadata,
    /// The stored cells; `None` for a seed-only file, which carries no
    /// payload and is rebuilt on demand.
    pub grid: Option<CellGrid>,
}

impl LoadedMaze {
    pub fn is_seed_only(&self) -> bool {
        self.grid.is_none()
    }

    /// Rebuild the maze from `algo`, `seed` and `braid` metadata.
    ///
    /// `block_size`, `stitch_density` and `walkers` extra keys are honoured
    /// when present so parallel carvers regenerate identically.
    pub fn regenerate(&self) -> Result<CellGrid> {
        let algo = self
            .metadata
            .algo
            .as_deref()
            .ok_or(MazeError::MissingMetadata("algo"))?;
        let kind: GeneratorKind = algo.parse()?;
        let seed = self.metadata.seed.ok_or(MazeError::MissingMetadata("seed"))?;

        let mut config = GeneratorConfig::default().seed(seed);
        if let Some(size) = self.metadata.extra_u64("block_size") {
            config = config.block_size(u32::try_from(size).unwrap_or(u32::MAX));
        }
        if let Some(density) = self.metadata.extra_f64("stitch_density") {
            config = config.stitch_density(density);
        }
        if let Some(walkers) = self.metadata.extra_u64("walkers") {
            config = config.walkers(usize::try_from(walkers).unwrap_or(usize::MAX));
        }

        let (mut grid, _) = generate(kind, self.width, self.height, &config)?;
        if let Some(factor) = self.metadata.braid {
            braid(&mut grid, factor, seed)?;
        }
        Ok(grid)
    }

    /// The stored grid, or the regenerated one for a seed-only file.
    pub fn into_grid(self) -> Result<CellGrid> {
        match self.grid {
            Some(grid) => Ok(grid),
            None => self.regenerate(),
        }
    }
}

fn read_array<R: Read, const N: usize>(input: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn read_maze<R: Read>(input: &mut R) -> Result<LoadedMaze> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => MazeError::BadMagic { expected: MAGIC },
        _ => e.into(),
    })?;
    if &magic != MAGIC {
        return Err(MazeError::BadMagic { expected: MAGIC });
    }
    let [version, flags] = read_array::<_, 2>(input)?;
    if version != VERSION {
        return Err(MazeError::UnsupportedVersion(version));
    }
    let width = u32::from_le_bytes(read_array(input)?);
    let height = u32::from_le_bytes(read_array(input)?);
    let meta_len = u16::from_le_bytes(read_array(input)?) as usize;
    let mut meta = vec![0u8; meta_len];
    input.read_exact(&mut meta)?;
    let metadata: MazeMetadata = serde_json::from_slice(&meta)?;
    let data_len = u32::from_le_bytes(read_array(input)?) as u64;

    if width == 0 || height == 0 {
        return Err(MazeError::InvalidDimensions { width, height });
    }
    if flags & FLAG_SEED_ONLY != 0 {
        return Ok(LoadedMaze {
            width,
            height,
            metadata,
            grid: None,
        });
    }

    let expected = width as usize * height as usize;
    let compressed = flags & FLAG_COMPRESSED != 0;
    if !compressed && data_len != expected as u64 {
        return Err(MazeError::PayloadSize {
            expected,
            actual: data_len as usize,
        });
    }
    // Buffers grow with the bytes actually present, never from the header's
    // claimed size.
    let mut data = Vec::new();
    input.by_ref().take(data_len).read_to_end(&mut data)?;
    if (data.len() as u64) < data_len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    let cells = if compressed {
        let mut cells = Vec::new();
        // One byte of slack so an oversized payload is detected, not truncated.
        ZlibDecoder::new(&data[..])
            .take(expected as u64 + 1)
            .read_to_end(&mut cells)?;
        cells
    } else {
        data
    };
    if cells.len() != expected {
        return Err(MazeError::PayloadSize {
            expected,
            actual: cells.len(),
        });
    }

    Ok(LoadedMaze {
        width,
        height,
        metadata,
        grid: Some(CellGrid::from_cells(width, height, cells)?),
    })
}

pub fn save(
    path: impl AsRef<Path>,
    grid: &CellGrid,
    metadata: &MazeMetadata,
    options: SaveOptions,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    write_maze(&mut out, grid, metadata, options)?;
    out.flush()?;
    info!(
        "saved {}x{} maze to {} ({:?})",
        grid.width(),
        grid.height(),
        path.display(),
        options
    );
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> Result<LoadedMaze> {
    let path = path.as_ref();
    let mut input = BufReader::new(File::open(path)?);
    let maze = read_maze(&mut input)?;
    debug!(
        "loaded {}x{} maze from {}{}",
        maze.width,
        maze.height,
        path.display(),
        if maze.is_seed_only() { " (seed only)" } else { "" }
    );
    Ok(maze)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::{
        FLAG_COMPRESSED, FLAG_SEED_ONLY, MazeMetadata, SaveOptions, read_maze, write_maze,
    };
    use crate::error::MazeError;
    use crate::grid::{CellGrid, Direction, Pos};

    fn sample() -> CellGrid {
        let mut grid = CellGrid::new(4, 3).unwrap();
        grid.carve(Pos::new(0, 0), Direction::East).unwrap();
        grid.carve(Pos::new(3, 2), Direction::North).unwrap();
        grid
    }

    fn bytes(grid: &CellGrid, meta: &MazeMetadata, options: SaveOptions) -> Vec<u8> {
        let mut out = Vec::new();
        write_maze(&mut out, grid, meta, options).unwrap();
        out
    }

    #[test]
    fn header_layout_is_little_endian() {
        let out = bytes(&sample(), &MazeMetadata::default(), SaveOptions::default());
        assert_eq!(&out[..4], b"MAZE");
        assert_eq!(out[4], 1);
        assert_eq!(out[5], 0);
        assert_eq!(&out[6..10], &4u32.to_le_bytes());
        assert_eq!(&out[10..14], &3u32.to_le_bytes());
        assert_eq!(&out[14..16], &2u16.to_le_bytes());
        assert_eq!(&out[16..18], b"{}");
        assert_eq!(&out[18..22], &12u32.to_le_bytes());
        assert_eq!(out.len(), 22 + 12);
    }

    #[test]
    fn extra_metadata_round_trips() {
        let meta = MazeMetadata::default()
            .with_braid(0.5)
            .with_extra("note", "hello");
        let out = bytes(&sample(), &meta, SaveOptions::default());
        let loaded = read_maze(&mut Cursor::new(out)).unwrap();
        assert_eq!(loaded.metadata, meta);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut out = bytes(&sample(), &MazeMetadata::default(), SaveOptions::default());
        out[4] = 9;
        assert!(matches!(
            read_maze(&mut Cursor::new(out)),
            Err(MazeError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn short_payload_is_rejected() {
        let mut out = bytes(&sample(), &MazeMetadata::default(), SaveOptions::default());
        // Claim 11 cells instead of 12 and drop the last byte.
        out[18..22].copy_from_slice(&11u32.to_le_bytes());
        out.pop();
        assert!(matches!(
            read_maze(&mut Cursor::new(out)),
            Err(MazeError::PayloadSize {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn seed_only_file_has_no_payload() {
        let meta = MazeMetadata::default();
        let options = SaveOptions {
            compress: false,
            seed_only: true,
        };
        let out = bytes(&sample(), &meta, options);
        assert_eq!(out.len(), 22);
        let loaded = read_maze(&mut Cursor::new(out)).unwrap();
        assert!(loaded.is_seed_only());
        assert_eq!((loaded.width, loaded.height), (4, 3));
        assert!(matches!(
            loaded.regenerate(),
            Err(MazeError::MissingMetadata("algo"))
        ));
    }

    /// Header for a `side x side` grid with the given flags and payload.
    fn forged(side: u32, flags: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = b"MAZE".to_vec();
        out.extend_from_slice(&[1, flags]);
        out.extend_from_slice(&side.to_le_bytes());
        out.extend_from_slice(&side.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(b"{}");
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn huge_seed_only_header_allocates_nothing() {
        let loaded = read_maze(&mut Cursor::new(forged(65_535, FLAG_SEED_ONLY, &[]))).unwrap();
        assert!(loaded.grid.is_none());
        assert_eq!(loaded.width, 65_535);
    }

    #[test]
    fn huge_header_with_small_payload_is_rejected() {
        let raw = forged(65_535, 0, &[0x0F; 12]);
        assert!(matches!(
            read_maze(&mut Cursor::new(raw)),
            Err(MazeError::PayloadSize { actual: 12, .. })
        ));

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0x0F; 12]).unwrap();
        let packed = forged(65_535, FLAG_COMPRESSED, &encoder.finish().unwrap());
        assert!(matches!(
            read_maze(&mut Cursor::new(packed)),
            Err(MazeError::PayloadSize { actual: 12, .. })
        ));
    }
}
