//! Instrument data layer: provider trait, CSV store, in-memory provider.

pub mod csv_store;
pub mod memory;
pub mod provider;

pub use csv_store::CsvStore;
pub use memory::{synthetic_series, MemoryProvider};
pub use provider::{DataError, InstrumentBar, InstrumentDataProvider, InstrumentSeries};
