//! Global type definitions.

use std::collections::HashMap;
use std::io::{self, Write};

use csv::ByteRecord;
use thiserror::Error;

/// Target table for every generated statement.
pub static TABLE: &str = "siav2model";

/// Column that marks the header line.
pub static HEADER_MARKER: &[u8] = b"lolimit";

/// Columns read from every data row.
pub static REQUIRED: [&str; 5] = ["lolimit", "center", "hilimit", "path", "res"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UpdateError {
	#[error("required column '{name}' is missing from the header")]
	MissingColumn { name: String },
	#[error("line {line}: expected at least {needed} fields, found {found}")]
	ShortRow {
		line: u64,
		needed: usize,
		found: usize,
	},
}

/// Column Index
///
/// Maps header column names to their 0-based position. Built once from the header line and
/// never modified afterwards. Names are kept as raw bytes, the input has no declared encoding.
#[derive(Debug)]
pub struct ColumnIndex {
	positions: HashMap<Vec<u8>, usize>,
}

impl ColumnIndex {
	/// Duplicate names resolve to the last position they appear at.
	pub fn from_header(header: &ByteRecord) -> Self {
		let mut positions = HashMap::new();
		for (i, name) in header.iter().enumerate() {
			positions.insert(name.to_vec(), i);
		}
		Self { positions }
	}

	pub fn position(&self, name: &str) -> Result<usize, UpdateError> {
		self.positions
			.get(name.as_bytes())
			.copied()
			.ok_or_else(|| UpdateError::MissingColumn {
				name: name.to_string(),
			})
	}
}

/// One statement's worth of values, borrowed from the row it came from.
#[derive(Debug, PartialEq, Eq)]
pub struct Record<'a> {
	pub table: &'static str,
	pub lolimit: &'a [u8],
	pub center: &'a [u8],
	pub hilimit: &'a [u8],
	pub res: &'a [u8],
	pub path: &'a [u8],
}

impl Record<'_> {
	/// Write To
	///
	/// Render the statement into `wtr`. Values are copied verbatim: spectral bounds go in
	/// unquoted, `path` inside single quotes, and nothing is escaped or re-encoded since input
	/// is a trusted internal export.
	pub fn write_to<W: Write>(&self, wtr: &mut W) -> io::Result<()> {
		write!(wtr, "UPDATE {} SET \n       spectralstart=", self.table)?;
		wtr.write_all(self.lolimit)?;
		wtr.write_all(b",\n       spectrallocation=")?;
		wtr.write_all(self.center)?;
		wtr.write_all(b",\n       spectralstop=")?;
		wtr.write_all(self.hilimit)?;
		wtr.write_all(b",\n       spectralresolution=")?;
		wtr.write_all(self.res)?;
		wtr.write_all(b"\n       WHERE archiveid='")?;
		wtr.write_all(self.path)?;
		wtr.write_all(b"';")
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use rstest::*;

	#[fixture]
	fn header() -> ByteRecord {
		ByteRecord::from(vec!["path", "lolimit", "center", "hilimit", "res"])
	}

	fn render(record: &Record) -> Vec<u8> {
		let mut out = Vec::new();
		record.write_to(&mut out).unwrap();
		out
	}

	#[rstest]
	fn index_maps_names_to_positions(header: ByteRecord) {
		let index = ColumnIndex::from_header(&header);
		assert_eq!(index.position("path"), Ok(0));
		assert_eq!(index.position("hilimit"), Ok(3));
		assert_eq!(index.position("res"), Ok(4));
	}

	#[rstest]
	fn duplicate_names_take_last_position() {
		let header = ByteRecord::from(vec!["res", "lolimit", "res"]);
		let index = ColumnIndex::from_header(&header);
		assert_eq!(index.position("res"), Ok(2));
		assert_eq!(index.position("lolimit"), Ok(1));
	}

	#[rstest]
	fn absent_name_is_missing_column(header: ByteRecord) {
		let index = ColumnIndex::from_header(&header);
		assert_eq!(
			index.position("freq"),
			Err(UpdateError::MissingColumn {
				name: "freq".to_string()
			})
		);
	}

	#[rstest]
	fn render_matches_template() {
		let record = Record {
			table: TABLE,
			lolimit: b"100",
			center: b"150",
			hilimit: b"200",
			res: b"5",
			path: b"obs001",
		};
		let expected = "UPDATE siav2model SET \n       spectralstart=100,\n       spectrallocation=150,\n       spectralstop=200,\n       spectralresolution=5\n       WHERE archiveid='obs001';";
		assert_eq!(render(&record), expected.as_bytes());
	}

	#[rstest]
	fn render_does_not_escape_quotes() {
		let record = Record {
			table: TABLE,
			lolimit: b"1e-7",
			center: b"",
			hilimit: b"x",
			res: b"NULL",
			path: b"o'brien",
		};
		let out = String::from_utf8(render(&record)).unwrap();
		assert!(out.ends_with("WHERE archiveid='o'brien';"));
		assert!(out.contains("spectrallocation=,\n"));
	}

	#[rstest]
	fn render_passes_non_utf8_bytes_through() {
		let record = Record {
			table: TABLE,
			lolimit: b"1",
			center: b"2",
			hilimit: b"3",
			res: b"4",
			path: b"Jos\xe9.fits",
		};
		assert!(render(&record).ends_with(b"WHERE archiveid='Jos\xe9.fits';"));
	}
}
