pub mod client;
pub mod config;
pub mod error;
pub mod geometry;
pub mod identify;
pub mod output;
pub mod points;
pub mod raster;
pub mod record;
pub mod requests;
pub mod sampler;
pub mod service;
pub mod types;

pub use client::ImageServerClient;
pub use config::SamplerConfig;
pub use error::ImageServerError;
pub use geometry::{Coordinates, Point};
pub use identify::{IdentifyParams, IdentifyResult, LengthMismatch};
pub use output::{write_results, RecordWriter};
pub use points::read_points;
pub use raster::Raster;
pub use record::FlatRecord;
pub use sampler::{RunSummary, Sampler};
pub use service::ServiceInfo;
