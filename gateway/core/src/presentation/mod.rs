// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`polytenant-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Axum router, shared state and handlers |
//! | [`dto`] | Request and response bodies |
//! | [`error`] | Mapping of service errors to HTTP status and JSON body |

pub mod api;
pub mod dto;
pub mod error;

pub use api::{app, AppState};
pub use error::ApiError;
