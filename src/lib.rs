//! nvprobe - NVML-based GPU discovery library
//!
//! This library enumerates NVIDIA GPUs through NVIDIA's NVML library,
//! samples their live status and classifies the peer-to-peer interconnect
//! between every pair of devices.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models and unit conversions
//! - [`error`]: Error types
//! - [`nvml`]: NVML abstraction layer
//! - [`services`]: Discovery and status monitoring

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod nvml;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
