//! # simdcsv
//!
//! A SIMD delimiter scanner for comma-separated text.
//!
//! The buffer is scanned 32 bytes at a time (AVX2 on x86_64, NEON on ARM,
//! a byte loop elsewhere) for commas, newlines and quotes. The resulting
//! position index backs a zero-copy row/field view over the original bytes.
//!
//! ```
//! let table = simdcsv::parse(b"name,age\nJohn,25\n").unwrap();
//! let row = table.row(1).unwrap();
//! assert_eq!(row.field(0), b"John");
//! assert_eq!(row.size(), 2);
//! ```
//!
//! Quotes are indexed but do not change how fields are split.

pub mod error;
pub mod index;
pub mod io;
pub mod memory;
pub mod portability;
pub mod scanner;
pub mod table;

pub use error::{Error, LoadError};
pub use index::{DelimiterPosition, PositionIndex, Positions, MAX_BUFFER_LEN};
pub use scanner::{Backend, ChunkMasks, Delimiter, CHUNK_WIDTH};
pub use table::{row_boundaries, Fields, Row, Rows, Table};

/// Index `buf` and return a row/field view over it
pub fn parse(buf: &[u8]) -> Result<Table<'_>, Error> {
    Table::parse(buf)
}
