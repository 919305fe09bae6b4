use std::io::{Cursor, Write};

use arrow_buffer::Buffer;
use arrow_ipc::reader::{StreamDecoder, StreamReader};
use arrow_ipc::writer::StreamWriter;
use tracing::debug;

use crate::engine::codec::sink::{CountingSink, FixedSizeWriter};
use crate::engine::core::Table;
use crate::engine::errors::TableError;
use crate::engine::schema::Schema;

/// Encodes `table` as an IPC stream (schema, batches, end-of-stream marker) into `sink`.
fn write_stream<W: Write>(table: &Table, sink: W) -> Result<W, TableError> {
    let batches = table.record_batches();
    let mut writer = StreamWriter::try_new(sink, batches.arrow_schema())?;
    for batch in batches {
        writer.write(&batch?)?;
    }
    writer.finish()?;
    Ok(writer.into_inner()?)
}

/// Exact number of bytes [`write_into`] will produce for `table`.
pub fn serialized_size(table: &Table) -> Result<usize, TableError> {
    let sink = write_stream(table, CountingSink::new())?;
    Ok(sink.written())
}

/// Encodes `table` into `buf`, which must be at least [`serialized_size`] bytes long.
pub fn write_into(table: &Table, buf: &mut [u8]) -> Result<usize, TableError> {
    let writer = write_stream(table, FixedSizeWriter::new(buf))?;
    Ok(writer.position())
}

pub fn serialize(table: &Table) -> Result<Vec<u8>, TableError> {
    write_stream(table, Vec::new())
}

/// Decodes an IPC stream into a table whose chunks point into `buffer`.
///
/// Each record batch becomes one chunk per column. Batches that are not suitably aligned
/// are copied by the decoder; everything else shares the buffer's memory.
pub fn deserialize(buffer: Buffer) -> Result<Table, TableError> {
    let arrow_schema = StreamReader::try_new(Cursor::new(buffer.as_slice()), None)?.schema();
    let schema = Schema::from_arrow(&arrow_schema)?;

    let mut decoder = StreamDecoder::new();
    let mut remaining = buffer;
    let mut batches = Vec::new();
    while !remaining.is_empty() {
        let before = remaining.len();
        match decoder.decode(&mut remaining)? {
            Some(batch) => batches.push(batch),
            None if remaining.len() == before => {
                return Err(TableError::Codec(format!(
                    "{} trailing bytes after end of stream",
                    before
                )));
            }
            None => {}
        }
    }
    decoder.finish()?;

    debug!(
        target: "shm_tables::codec",
        batches = batches.len(),
        fields = schema.len(),
        "Decoded table stream"
    );
    Table::from_record_batches(schema, &batches)
}
