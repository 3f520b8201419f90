pub mod config;
pub mod deployer;
pub mod error;
pub mod s3;
pub mod storage;
pub mod utils;
pub mod website;

pub use config::Config;
pub use deployer::Deployer;
pub use error::{Error, Result};
pub use s3::{S3Client, S3Settings};
pub use storage::{BucketRef, StorageClient};
pub use website::{CorsRule, WebsiteConfig};
