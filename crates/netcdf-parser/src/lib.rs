//! NetCDF catalog access for schema-less gridded files.
//!
//! This crate exposes a self-describing array file as a [`SourceFile`]: an
//! ordered catalog of variables (shape, dimension names, attributes), the
//! file-level dimensions and global attributes, and whole-variable numeric
//! reads. Nothing here assumes a naming convention; deciding which variable is
//! latitude, longitude or the measurement happens downstream.
//!
//! # Implementations
//!
//! - [`NetCdfSource`]: native reads through the `netcdf` crate (libnetcdf +
//!   HDF5). System requirements: libhdf5-dev libnetcdf-dev.
//! - [`MemorySource`]: an in-memory catalog for tests and pre-decoded data.

pub mod catalog;
pub mod error;
pub mod memory;
pub mod native;

pub use catalog::{AttrValue, Attribute, Dimension, SourceFile, VariableInfo};
pub use error::{NetCdfError, NetCdfResult};
pub use memory::MemorySource;
pub use native::{silence_hdf5_errors, NetCdfSource};
