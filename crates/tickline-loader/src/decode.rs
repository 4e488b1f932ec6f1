//! Arrow IPC payload to [`Tick`] rows.
//!
//! Day files carry one table with the columns `timestamp`, `lastPrice`,
//! `bidPrice`, `askPrice` and `volume`. Both the IPC stream format and the
//! IPC file format are accepted. Columns are cast to their canonical types
//! first, so dictionary-encoded or `LargeUtf8` timestamps and wider numeric
//! types decode the same way.

use std::io::Cursor;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int32Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int32Type, SchemaRef};
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::record_batch::RecordBatch;

use tickline_core::{Tick, TickTimestamp};

use crate::LoaderError;

/// Leading magic of the Arrow IPC file format. Stream payloads lack it.
pub const ARROW_FILE_MAGIC: &[u8] = b"ARROW1";

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const LAST_PRICE_COLUMN: &str = "lastPrice";
pub const BID_PRICE_COLUMN: &str = "bidPrice";
pub const ASK_PRICE_COLUMN: &str = "askPrice";
pub const VOLUME_COLUMN: &str = "volume";

/// Rows recovered from one day file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedDay {
    pub ticks: Vec<Tick>,
    /// Rows dropped for nulls, non-finite prices or a malformed timestamp.
    pub skipped_rows: usize,
}

/// Decode every record batch of an IPC payload.
pub fn read_ipc(bytes: &[u8]) -> Result<(SchemaRef, Vec<RecordBatch>), LoaderError> {
    let cursor = Cursor::new(bytes);
    if bytes.starts_with(ARROW_FILE_MAGIC) {
        let reader = FileReader::try_new(cursor, None)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        Ok((schema, batches))
    } else {
        let reader = StreamReader::try_new(cursor, None)?;
        let schema = reader.schema();
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        Ok((schema, batches))
    }
}

/// Extract ticks from an IPC payload, yielding to the runtime every
/// `batch_rows` rows so large days do not monopolise a worker.
///
/// Bad rows are skipped and counted. A missing or uncastable column fails
/// the whole payload.
pub async fn decode_ticks(bytes: &[u8], batch_rows: usize) -> Result<DecodedDay, LoaderError> {
    let (_, batches) = read_ipc(bytes)?;
    let batch_rows = batch_rows.max(1);
    let mut decoded = DecodedDay::default();

    for batch in &batches {
        let columns = CastColumns::from_batch(batch)?;
        let rows = columns.rows()?;
        let mut start = 0;
        while start < batch.num_rows() {
            let end = (start + batch_rows).min(batch.num_rows());
            for index in start..end {
                match rows.tick(index) {
                    Some(tick) => decoded.ticks.push(tick),
                    None => decoded.skipped_rows += 1,
                }
            }
            start = end;
            tokio::task::yield_now().await;
        }
    }

    Ok(decoded)
}

/// First valid tick of a payload, without yielding. Used for file stats.
pub(crate) fn first_tick(batches: &[RecordBatch]) -> Result<Option<Tick>, LoaderError> {
    for batch in batches {
        let columns = CastColumns::from_batch(batch)?;
        let rows = columns.rows()?;
        if let Some(tick) = (0..batch.num_rows()).find_map(|index| rows.tick(index)) {
            return Ok(Some(tick));
        }
    }
    Ok(None)
}

/// Tick columns cast to their canonical Arrow types.
struct CastColumns {
    timestamp: ArrayRef,
    last_price: ArrayRef,
    bid_price: ArrayRef,
    ask_price: ArrayRef,
    volume: ArrayRef,
}

impl CastColumns {
    fn from_batch(batch: &RecordBatch) -> Result<Self, LoaderError> {
        Ok(Self {
            timestamp: cast_column(batch, TIMESTAMP_COLUMN, &DataType::Utf8)?,
            last_price: cast_column(batch, LAST_PRICE_COLUMN, &DataType::Float64)?,
            bid_price: cast_column(batch, BID_PRICE_COLUMN, &DataType::Float64)?,
            ask_price: cast_column(batch, ASK_PRICE_COLUMN, &DataType::Float64)?,
            volume: cast_column(batch, VOLUME_COLUMN, &DataType::Int32)?,
        })
    }

    fn rows(&self) -> Result<TickRows<'_>, LoaderError> {
        Ok(TickRows {
            timestamp: self
                .timestamp
                .as_string_opt::<i32>()
                .ok_or_else(|| unexpected_type(TIMESTAMP_COLUMN))?,
            last_price: float_column(&self.last_price, LAST_PRICE_COLUMN)?,
            bid_price: float_column(&self.bid_price, BID_PRICE_COLUMN)?,
            ask_price: float_column(&self.ask_price, ASK_PRICE_COLUMN)?,
            volume: self
                .volume
                .as_primitive_opt::<Int32Type>()
                .ok_or_else(|| unexpected_type(VOLUME_COLUMN))?,
        })
    }
}

struct TickRows<'a> {
    timestamp: &'a StringArray,
    last_price: &'a Float64Array,
    bid_price: &'a Float64Array,
    ask_price: &'a Float64Array,
    volume: &'a Int32Array,
}

impl TickRows<'_> {
    fn tick(&self, index: usize) -> Option<Tick> {
        if self.timestamp.is_null(index)
            || self.last_price.is_null(index)
            || self.bid_price.is_null(index)
            || self.ask_price.is_null(index)
            || self.volume.is_null(index)
        {
            return None;
        }

        let timestamp = self.timestamp.value(index);
        TickTimestamp::parse(timestamp).ok()?;
        Tick::new(
            timestamp,
            self.last_price.value(index),
            self.bid_price.value(index),
            self.ask_price.value(index),
            self.volume.value(index),
        )
        .ok()
    }
}

fn cast_column(batch: &RecordBatch, name: &str, to: &DataType) -> Result<ArrayRef, LoaderError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| LoaderError::MissingColumn {
            column: name.to_owned(),
        })?;
    Ok(cast(column.as_ref(), to)?)
}

fn float_column<'a>(array: &'a ArrayRef, name: &str) -> Result<&'a Float64Array, LoaderError> {
    array
        .as_primitive_opt::<Float64Type>()
        .ok_or_else(|| unexpected_type(name))
}

fn unexpected_type(name: &str) -> LoaderError {
    LoaderError::UnexpectedColumnType {
        column: name.to_owned(),
    }
}
