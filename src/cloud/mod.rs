//! Cloud fallback path.
//!
//! Drives a cloud-registered television through capability commands when
//! the local control surface is unreachable, and cross-checks power state.

mod client;
mod types;

pub use client::{CloudClient, DEFAULT_CLOUD_TIMEOUT};
pub use types::{
    CapabilityCommand, CapabilityRef, CloudDevice, Component, DeviceList, Health,
    INPUT_SOURCE_CAPABILITY, TV_CHANNEL_CAPABILITY,
};
