//! Encoding of the user table as CSV: header `name,email,phone,password,gender`,
//! `\n`-terminated rows, standard quoting for commas, quotes and line breaks.

use std::io::Read;

use csv::{ReaderBuilder, Terminator, Trim, Writer, WriterBuilder};
use signbook_core::{
    records::{UserRecord, FIELD_NAMES},
    store::StoreError,
};

/// Parse a whole table. An empty input (no header yet) is an empty table.
pub fn decode_table<R: Read>(input: R) -> Result<Vec<UserRecord>, StoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = reader.headers().map_err(read_err)?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !headers.iter().eq(FIELD_NAMES) {
        return Err(StoreError::Read {
            reason: format!(
                "unexpected header `{}`, expected `{}`",
                headers.iter().collect::<Vec<_>>().join(","),
                FIELD_NAMES.join(",")
            ),
        });
    }

    reader
        .deserialize::<UserRecord>()
        .map(|row| row.map_err(read_err))
        .collect()
}

/// Header line followed by one row per record.
pub fn encode_table(records: &[UserRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = row_writer();
    writer.write_record(FIELD_NAMES).map_err(write_err)?;
    for record in records {
        writer.serialize(record).map_err(write_err)?;
    }
    finish(writer)
}

/// A single `\n`-terminated row, no header.
pub fn encode_row(record: &UserRecord) -> Result<Vec<u8>, StoreError> {
    let mut writer = row_writer();
    writer.serialize(record).map_err(write_err)?;
    finish(writer)
}

fn row_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, StoreError> {
    writer
        .into_inner()
        .map_err(|err| write_err(err.into_error()))
}

pub(crate) fn read_err<E: ToString>(err: E) -> StoreError {
    StoreError::Read {
        reason: err.to_string(),
    }
}

pub(crate) fn write_err<E: ToString>(err: E) -> StoreError {
    StoreError::Write {
        reason: err.to_string(),
    }
}
