// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability plugins and the scope-keyed function registry.
//!
//! A plugin owns one scope (e.g. `Joan`) and contributes functions whose
//! qualified names are prefixed with that scope (`Joan-postDeskReservation`).
//! The [`registry::PluginRegistry`] validates the catalog at build time and
//! routes qualified calls to the owning plugin.

pub mod plugins;
pub mod registry;
pub mod search;

pub use plugins::cvs::CvsPlugin;
pub use plugins::handbook::HandbookPlugin;
pub use plugins::joan::JoanPlugin;
pub use registry::{CapabilityPlugin, PluginRegistry, PluginRegistryBuilder};
pub use search::SearchIndexClient;
