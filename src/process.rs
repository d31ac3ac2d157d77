//! Header location and row-to-statement transformation.

use std::io::{self, BufRead, BufReader, Read, Write};

use anyhow::Result;
use csv::{ByteRecord, Position};

use crate::types::{ColumnIndex, Record, UpdateError, HEADER_MARKER, REQUIRED, TABLE};

/// Rows
///
/// Iterator over the input one line at a time. Each line is stripped of surrounding whitespace
/// and then split on every `,` into a `ByteRecord`. There is no quoting, blank lines come back as
/// a single empty field, and bytes are never decoded.
struct Rows<B> {
	rdr: B,
	line: u64,
	buf: Vec<u8>,
}

impl<B: BufRead> Rows<B> {
	fn new(rdr: B) -> Self {
		Self {
			rdr,
			line: 0,
			buf: Vec::new(),
		}
	}
}

impl<B: BufRead> Iterator for Rows<B> {
	type Item = io::Result<ByteRecord>;

	fn next(&mut self) -> Option<Self::Item> {
		self.buf.clear();
		match self.rdr.read_until(b'\n', &mut self.buf) {
			Ok(0) => None,
			Ok(_) => {
				self.line += 1;
				Some(Ok(split_line(&self.buf, self.line)))
			}
			Err(e) => Some(Err(e)),
		}
	}
}

/// Run
///
/// Read metadata rows from `input` (trait bound `std::io::Read`) and write one `UPDATE`
/// statement per data row to `output` (trait bound `std::io::Write`). Each statement is written
/// as soon as it is rendered, so output from earlier rows survives a later fatal row.
pub fn run<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<()> {
	let mut rows = Rows::new(BufReader::new(input));

	let header = match locate_header(&mut rows)? {
		Some(header) => header,
		None => {
			log::warn!("No header containing 'lolimit' found, nothing to do");
			return Ok(());
		}
	};
	let index = ColumnIndex::from_header(&header);

	let mut written = 0;
	for result in rows {
		let row = result?;
		let record = transform_row(&index, &row)?;
		log::debug!("{}", String::from_utf8_lossy(record.path));
		write_statement(output, &record)?;
		written += 1;
	}
	log::info!("Wrote {} statements", written);

	Ok(())
}

/// Locate Header
///
/// Consume rows until one contains the header marker column, returning it. Returns `None` if the
/// input is exhausted first.
fn locate_header<B: BufRead>(rows: &mut Rows<B>) -> Result<Option<ByteRecord>> {
	for result in rows {
		let candidate = result?;
		if candidate.iter().any(|name| name == HEADER_MARKER) {
			log::info!("Header found on line {}", line_of(&candidate));
			return Ok(Some(candidate));
		}
	}
	Ok(None)
}

/// Transform Row
///
/// Pull the required fields out of `row` by name. Fails on a name the header never declared,
/// or on a row too short to hold one of the required positions.
fn transform_row<'a>(index: &ColumnIndex, row: &'a ByteRecord) -> Result<Record<'a>, UpdateError> {
	let field = move |name: &str| -> Result<&'a [u8], UpdateError> {
		let i = index.position(name)?;
		row.get(i).ok_or(UpdateError::ShortRow {
			line: line_of(row),
			needed: i + 1,
			found: row.len(),
		})
	};
	let [lolimit, center, hilimit, path, res] = REQUIRED;
	Ok(Record {
		table: TABLE,
		lolimit: field(lolimit)?,
		center: field(center)?,
		hilimit: field(hilimit)?,
		path: field(path)?,
		res: field(res)?,
	})
}

/// Write Statement
///
/// Write a rendered record followed by a newline.
fn write_statement<W: Write>(wtr: &mut W, record: &Record) -> Result<()> {
	record.write_to(wtr)?;
	writeln!(wtr)?;
	wtr.flush()?;
	Ok(())
}

/// Split Line
///
/// Strip whitespace from both ends of the raw line, then split what is left on `,`.
fn split_line(raw: &[u8], line: u64) -> ByteRecord {
	let mut row: ByteRecord = strip(raw).split(|&b| b == b',').collect();
	let mut pos = Position::new();
	pos.set_line(line);
	row.set_position(Some(pos));
	row
}

/// Space, tab, line feed, carriage return, vertical tab and form feed.
fn is_space(b: &u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

fn strip(raw: &[u8]) -> &[u8] {
	let start = raw.iter().position(|b| !is_space(b)).unwrap_or(raw.len());
	let end = raw.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
	&raw[start..end]
}

fn line_of(record: &ByteRecord) -> u64 {
	record.position().map_or(0, |pos| pos.line())
}
