pub mod buffers;
pub mod tick_stream;

// Re-export for convenient access (e.g. `use crate::market_data::TickBuffers`).
pub use buffers::TickBuffers;
pub use tick_stream::run_tick_stream;
