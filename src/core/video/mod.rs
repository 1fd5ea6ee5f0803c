//! Remote task await: polling client for the video generation service.

mod client;

pub use client::{
    RemoteTaskClient, RemoteTaskConfig, RemoteTaskError, RemoteTaskSnapshot, STATUS_DONE,
    STATUS_FAILED, STATUS_PENDING,
};
