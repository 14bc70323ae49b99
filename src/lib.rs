//! This file is the root of the `flatrow` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`layout`, `codec`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types most callers need.
//! 3.  Defining the `#[pymodule]` which acts as the main entry point when the
//!     compiled library is imported into Python (only with the `python` feature).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

#[doc(hidden)]
pub use log as __log;

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod memory;
pub mod null_handling;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use codec::{deserialize, deserialize_framed, framed_rows, RowSerializer};
pub use config::CodecConfig;
pub use error::{FlatRowError, Result};
pub use layout::{LayoutNode, RowLayout};
pub use memory::{MemoryPool, SystemPool, TrackingPool};
pub use types::{DecimalWidth, RowKind};

//==================================================================================
// 3. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `flatrow` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn flatrow(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::python::encode_batch_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::decode_batch_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::analyze_batch_py, m)?)?;

    // --- Expose the custom error type ---
    m.add(
        "FlatRowError",
        m.py().get_type_bound::<pyo3::exceptions::PyValueError>(),
    )?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    m.add_function(wrap_pyfunction!(ffi::python::enable_verbose_logging_py, m)?)?;

    Ok(())
}
