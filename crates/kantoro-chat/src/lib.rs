// SPDX-FileCopyrightText: 2026 Kantoro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat orchestration for Kantoro.
//!
//! This crate owns the single-hop function-calling cycle: one initial
//! completion that may pick a function, one execution, one follow-up
//! completion that phrases the answer. [`ChatEngine`] runs the cycle
//! against durable threads with streaming output; [`BufferedChatEngine`]
//! runs it against the expiring per-user buffer. Transports plug in
//! through the [`sink`] implementations.

pub mod buffered;
pub mod engine;
pub mod prompt;
pub mod sink;

pub use buffered::{BufferedChatEngine, HISTORY_CLEARED_REPLY};
pub use engine::{ChatEngine, ChatTurn};
pub use prompt::{load_policy, system_message, DEFAULT_POLICY};
pub use sink::{ChannelSink, CollectSink, SinkEvent, StdoutSink};
