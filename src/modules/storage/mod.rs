//! Storage module for file management
//!
//! Provides the S3-backed object store and the storage adapter that validates
//! uploads and builds public file descriptors on top of it.

mod object_store;
mod s3_store;
mod storage_service;

pub use object_store::ObjectStore;
pub use s3_store::S3ObjectStore;
pub use storage_service::{RawUpload, StorageService, UploadOptions, UploadSource, UploadedFileDescriptor};

#[cfg(test)]
pub use object_store::memory::MemoryObjectStore;
