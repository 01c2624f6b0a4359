use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use common::Result;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Encodes a batch as a self-describing Parquet payload (schema embedded).
///
/// Pure function of the batch: lossless for the reader's column types, and
/// any unsupported type surfaces as an error rather than being coerced.
pub fn encode_batch(batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();

    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    Ok(buffer)
}

/// Reconstructs the original batches from an encoded payload.
pub fn decode_batches(data: &[u8]) -> Result<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}
