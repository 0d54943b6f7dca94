//! Concrete record store backed by a delimited-text (CSV) file.
//! The file is the database: every operation is a full pass over it.

pub mod codec;
pub mod csv_file_store;
