// In: src/ffi/python.rs

use arrow::datatypes::Schema;
use arrow::pyarrow::PyArrowType;
use arrow::record_batch::RecordBatch;
use log::LevelFilter;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};
use std::fs::OpenOptions;
use std::sync::{Arc, Once};

use crate::bridge::{self, EncodedRows};
use crate::config::CodecConfig;
use crate::memory::SystemPool;

//==================================================================================
// I. Stateless Batch API
//==================================================================================

/// Encodes a pyarrow `RecordBatch` into `(framed_bytes, row_offsets)`.
#[pyfunction]
#[pyo3(name = "encode_batch", signature = (batch, verify_row_sizes = true, max_row_bytes = None))]
pub fn encode_batch_py<'py>(
    py: Python<'py>,
    batch: PyArrowType<RecordBatch>,
    verify_row_sizes: bool,
    max_row_bytes: Option<usize>,
) -> PyResult<(Bound<'py, PyBytes>, Vec<usize>)> {
    let defaults = CodecConfig::default();
    let config = CodecConfig {
        verify_row_sizes,
        max_row_bytes: max_row_bytes
            .map_or(defaults.max_row_bytes, |limit| limit.min(defaults.max_row_bytes)),
    };
    let batch = batch.0;
    let encoded = py.allow_threads(move || bridge::encode_batch_with_config(&batch, &config))?;
    Ok((PyBytes::new_bound(py, &encoded.buffer), encoded.row_offsets))
}

/// Decodes framed rows back into a pyarrow `RecordBatch` of `schema`.
#[pyfunction]
#[pyo3(name = "decode_batch")]
pub fn decode_batch_py(
    py: Python,
    buffer: &[u8],
    schema: PyArrowType<Schema>,
) -> PyResult<PyArrowType<RecordBatch>> {
    let schema = Arc::new(schema.0);
    let encoded = EncodedRows {
        buffer: buffer.to_vec(),
        row_offsets: Vec::new(),
    };
    let batch = py.allow_threads(move || bridge::decode_batch(&encoded, schema, &SystemPool))?;
    Ok(PyArrowType(batch))
}

/// Reports how a pyarrow `RecordBatch` would encode, as a dict.
#[pyfunction]
#[pyo3(name = "analyze_batch")]
pub fn analyze_batch_py(py: Python, batch: PyArrowType<RecordBatch>) -> PyResult<PyObject> {
    let batch = batch.0;
    let stats = py.allow_threads(move || bridge::analyze_batch(&batch))?;

    let result_dict = PyDict::new_bound(py);
    result_dict.set_item("num_rows", stats.num_rows)?;
    result_dict.set_item("fixed_size", stats.fixed_size)?;
    result_dict.set_item("fixed_row_size", stats.fixed_row_size)?;
    result_dict.set_item("total_row_bytes", stats.total_row_bytes)?;
    result_dict.set_item("framed_bytes", stats.framed_bytes)?;
    result_dict.set_item("min_row_size", stats.min_row_size)?;
    result_dict.set_item("max_row_size", stats.max_row_size)?;
    result_dict.set_item(
        "field_kinds",
        stats
            .field_kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
    )?;

    Ok(result_dict.into())
}

//==================================================================================
// II. Logging
//==================================================================================

static INIT_LOGGER: Once = Once::new();

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    let file = log_file
        .map(|filename| OpenOptions::new().append(true).create(true).open(filename))
        .transpose()?;

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
