//! Zero-copy row and field views over an indexed buffer
//!
//! Rows are delimited by the newline sequence of a [`PositionIndex`]; fields
//! within a row by the commas whose offsets fall inside the row. Nothing is
//! copied: every field is a sub-slice of the original buffer, and the borrow
//! of that buffer is carried by the `'a` lifetime of [`Table`].

use std::cell::OnceCell;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use crate::error::Error;
use crate::index::PositionIndex;
use crate::scanner::Backend;

/// Row start offsets followed by the buffer length as a closing sentinel
///
/// Consecutive pairs delimit one row each. An empty buffer yields `[0]`,
/// i.e. zero rows.
pub fn row_boundaries(index: &PositionIndex, buffer_len: usize) -> Vec<usize> {
    let mut boundaries = Vec::with_capacity(index.newlines().len() + 2);
    boundaries.push(0);
    boundaries.extend(index.newlines().iter().map(|&nl| nl as usize + 1));
    if boundaries.last().is_some_and(|&last| last < buffer_len) {
        boundaries.push(buffer_len);
    }
    boundaries
}

/// A buffer together with its position index
pub struct Table<'a> {
    buf: &'a [u8],
    index: PositionIndex,
}

impl<'a> Table<'a> {
    /// Index `buf` with the detected backend
    pub fn parse(buf: &'a [u8]) -> Result<Self, Error> {
        Self::parse_with(buf, Backend::detect())
    }

    pub fn parse_with(buf: &'a [u8], backend: Backend) -> Result<Self, Error> {
        let index = PositionIndex::build_with(buf, backend)?;
        Ok(Self { buf, index })
    }

    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    /// Number of rows; a final row without a trailing newline still counts
    pub fn row_count(&self) -> usize {
        match self.buf.last() {
            None => 0,
            Some(b'\n') => self.index.newlines().len(),
            Some(_) => self.index.newlines().len() + 1,
        }
    }

    /// Byte range of row `n`, including its newline if it has one
    fn row_range(&self, n: usize) -> Option<Range<usize>> {
        if n >= self.row_count() {
            return None;
        }
        let newlines = self.index.newlines();
        let start = match n {
            0 => 0,
            _ => newlines[n - 1] as usize + 1,
        };
        let end = newlines
            .get(n)
            .map_or(self.buf.len(), |&nl| nl as usize + 1);
        Some(start..end)
    }

    pub fn row(&self, n: usize) -> Option<Row<'_, 'a>> {
        self.row_range(n).map(|range| Row::new(self, n, range))
    }

    pub fn rows(&self) -> Rows<'_, 'a> {
        Rows {
            table: self,
            next: 0,
            end: self.row_count(),
        }
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("len", &self.buf.len())
            .field("rows", &self.row_count())
            .finish_non_exhaustive()
    }
}

impl<'t, 'a> IntoIterator for &'t Table<'a> {
    type Item = Row<'t, 'a>;
    type IntoIter = Rows<'t, 'a>;

    fn into_iter(self) -> Rows<'t, 'a> {
        self.rows()
    }
}

/// One row of a [`Table`]
///
/// The commas belonging to the row are looked up on first field access and
/// kept for the lifetime of this value.
pub struct Row<'t, 'a> {
    table: &'t Table<'a>,
    number: usize,
    start: usize,
    end: usize,
    commas: OnceCell<&'t [u32]>,
}

impl<'t, 'a> Row<'t, 'a> {
    fn new(table: &'t Table<'a>, number: usize, range: Range<usize>) -> Self {
        Self {
            table,
            number,
            start: range.start,
            end: range.end,
            commas: OnceCell::new(),
        }
    }

    fn commas(&self) -> &'t [u32] {
        let table = self.table;
        let range = self.start..self.end;
        *self.commas.get_or_init(|| table.index.commas_in(range))
    }

    /// End of the row's content, excluding a terminating newline
    fn content_end(&self) -> usize {
        if self.end > self.start && self.table.buf[self.end - 1] == b'\n' {
            self.end - 1
        } else {
            self.end
        }
    }

    /// 0-based position of this row in the table
    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }

    /// Byte range of the row in the buffer, newline included
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Raw bytes of the row, newline included
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        let buf: &'a [u8] = self.table.buf;
        &buf[self.start..self.end]
    }

    /// Number of fields; always at least one
    pub fn size(&self) -> usize {
        self.commas().len() + 1
    }

    /// Field `i`, or an empty slice when `i >= self.size()`
    pub fn field(&self, i: usize) -> &'a [u8] {
        let commas = self.commas();
        if i > commas.len() {
            return &[];
        }
        let start = match i {
            0 => self.start,
            _ => commas[i - 1] as usize + 1,
        };
        let end = match commas.get(i) {
            Some(&comma) => comma as usize,
            None => self.content_end(),
        };
        if start >= end {
            return &[];
        }
        let buf: &'a [u8] = self.table.buf;
        &buf[start..end]
    }

    /// Field `i` as text, `None` if it is not valid UTF-8
    pub fn field_str(&self, i: usize) -> Option<&'a str> {
        std::str::from_utf8(self.field(i)).ok()
    }

    pub fn fields(&self) -> Fields<'_, 't, 'a> {
        Fields {
            row: self,
            next: 0,
            end: self.size(),
        }
    }
}

impl fmt::Debug for Row<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {} ", self.number)?;
        f.debug_list()
            .entries(self.fields().map(String::from_utf8_lossy))
            .finish()
    }
}

impl<'r, 't, 'a> IntoIterator for &'r Row<'t, 'a> {
    type Item = &'a [u8];
    type IntoIter = Fields<'r, 't, 'a>;

    fn into_iter(self) -> Fields<'r, 't, 'a> {
        self.fields()
    }
}

/// Lazy walk over the rows of a [`Table`]
#[derive(Clone)]
pub struct Rows<'t, 'a> {
    table: &'t Table<'a>,
    next: usize,
    end: usize,
}

impl<'t, 'a> Iterator for Rows<'t, 'a> {
    type Item = Row<'t, 'a>;

    fn next(&mut self) -> Option<Row<'t, 'a>> {
        if self.next >= self.end {
            return None;
        }
        let row = self.table.row(self.next);
        self.next += 1;
        row
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Rows<'_, '_> {}
impl FusedIterator for Rows<'_, '_> {}

/// Lazy walk over the fields of a [`Row`]
#[derive(Clone)]
pub struct Fields<'r, 't, 'a> {
    row: &'r Row<'t, 'a>,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Fields<'_, '_, 'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.next >= self.end {
            return None;
        }
        let field = self.row.field(self.next);
        self.next += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Fields<'_, '_, '_> {}
impl FusedIterator for Fields<'_, '_, '_> {}
