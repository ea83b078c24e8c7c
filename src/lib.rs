//! dmiscale - batch upscaler for DMI sprite sheets.
//!
//! A DMI file is a PNG whose `Description` text chunk carries a small
//! line-oriented directive block describing the states, directions,
//! frames, and timings packed into the pixel canvas. This library
//! provides:
//! - parsing the directive block into a sprite model and serializing
//!   it back ([`parser`], [`serializer`], [`models`])
//! - cutting the packed canvas into per-direction tiles and packing
//!   tiles back into a fresh canvas ([`tiler`])
//! - tile upscaling ([`scale`]) and the PNG text-chunk glue
//!   ([`metadata`])
//! - a two-phase batch pipeline with an on-disk tile workspace for
//!   out-of-process editing between phases ([`pipeline`], [`store`])

pub mod cli;
pub mod error;
pub mod metadata;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod scale;
pub mod serializer;
pub mod store;
pub mod tiler;
