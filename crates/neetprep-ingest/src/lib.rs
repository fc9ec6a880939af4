//! NeetPrep Ingest — loads study material into the retrieval tables.

pub mod chunking;
pub mod ingest;

pub use chunking::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use ingest::{IngestReport, Ingester};
