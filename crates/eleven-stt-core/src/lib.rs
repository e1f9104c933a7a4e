//! Client for the ElevenLabs speech-to-text API.
//!
//! A call flows through [`request`] normalization, job [`job::submit`],
//! [`job::poll`], optional [`job::retention`] and finally [`response`]
//! shaping. All network traffic goes through the retrying [`transport`].

pub mod config;
pub mod errors;
pub mod fields;
pub mod job;
pub mod output;
pub mod provider;
pub mod request;
pub mod response;
pub mod transport;

pub use errors::{Result, SttError};
pub use provider::elevenlabs::ElevenLabsProvider;
pub use provider::TranscriptionProvider;
