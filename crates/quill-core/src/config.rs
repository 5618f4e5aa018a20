//! Configuration module
//!
//! This module provides the configuration for the upload subsystem: which
//! storage backend to use, how to reach it, and upload defaults.

use std::env;

use crate::storage_types::StorageBackend;

const DEFAULT_LOCAL_STORAGE_PATH: &str = "./storage";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:4000/storage";
const DEFAULT_CACHE_CONTROL: &str = "3600";

/// Storage backend settings
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub environment: String,
    pub storage: StorageSettings,
    pub cache_control: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn inner(&self) -> &UploadServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage.backend
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().storage.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().storage.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().storage.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.inner().storage.local_storage_path
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().storage.public_base_url
    }

    pub fn cache_control(&self) -> &str {
        &self.inner().cache_control
    }
}

impl UploadServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::Local,
        };

        let storage = StorageSettings {
            backend,
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()),
        };

        let config = UploadServiceConfig {
            environment,
            storage,
            cache_control: env::var("UPLOAD_CACHE_CONTROL")
                .unwrap_or_else(|_| DEFAULT_CACHE_CONTROL.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage.backend == StorageBackend::S3
            && self.storage.s3_region.is_none()
            && self.storage.aws_region.is_none()
        {
            return Err(anyhow::anyhow!(
                "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
            ));
        }

        if self.cache_control.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_CACHE_CONTROL cannot be empty"));
        }

        let env = self.environment.to_lowercase();
        if (env == "production" || env == "prod") && self.storage.backend == StorageBackend::Memory
        {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=memory is not allowed in production"
            ));
        }

        Ok(())
    }
}
