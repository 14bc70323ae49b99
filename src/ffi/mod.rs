//! Foreign function interfaces. Only compiled with the `python` feature.

pub mod python;
