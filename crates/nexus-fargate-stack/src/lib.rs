//! Constructs for the Nexus repository on Fargate
//!
//! Each construct expands its slice of [`StackConfig`] into provider
//! resources on a shared [`SynthContext`]. [`Stack`] wires them together and
//! [`App`] synthesizes a set of stacks into a [`CloudAssembly`].
//!
//! [`StackConfig`]: nexus_fargate_common::StackConfig

#![deny(missing_docs)]

pub mod app;
pub mod compute;
pub mod context;
pub mod load_balancer;
pub mod network;
pub mod resources;
pub mod security;
pub mod service;
pub mod stack;
pub mod storage;

pub use app::{App, CloudAssembly};
pub use context::SynthContext;
pub use stack::Stack;
