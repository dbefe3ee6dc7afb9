//! Event journaling, replay and maze files.

pub mod events;
pub mod maze_file;
pub mod replay;

pub use events::{Event, EventReader, EventWriter};
pub use maze_file::{LoadedMaze, MazeMetadata, SaveOptions, load, read_maze, save, write_maze};
pub use replay::{ReplayStatus, Replayer, apply};
