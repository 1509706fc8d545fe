//! AWS SDK object-store backend for e2e-artifacts.
//!
//! This crate provides an [`e2e_artifacts::ObjectStore`] implementation
//! using the AWS SDK for Rust. Credentials come from the default AWS
//! credential chain unless static credentials are supplied.
//!
//! # Example
//!
//! ```ignore
//! use e2e_artifacts::{StoreLocation, UploadOrchestrator};
//! use e2e_artifacts_s3::{S3ObjectStore, StoreSettings};
//!
//! let store = S3ObjectStore::new(StoreSettings::default()).await;
//! let location = StoreLocation::new("qa-artifacts", "my-business")?;
//! let orchestrator = UploadOrchestrator::new(&store, location);
//! ```

mod client;
mod settings;

pub use client::S3ObjectStore;
pub use settings::{StaticCredentials, StoreSettings};
