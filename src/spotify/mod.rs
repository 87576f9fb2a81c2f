pub mod client;
mod models;

pub use client::SpotifyClient;
