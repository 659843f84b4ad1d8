// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Kantoro integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock chat provider with scripted assistant messages
//!   and request capture
//! - [`MockPlugin`] - Mock capability plugin with scripted outcomes and
//!   call capture

pub mod mock_plugin;
pub mod mock_provider;

pub use mock_plugin::{function_spec, MockCall, MockOutcome, MockPlugin};
pub use mock_provider::MockProvider;
