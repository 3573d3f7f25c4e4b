pub mod client;

pub use client::ExchangeClient;
