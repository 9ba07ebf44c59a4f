// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod booking;
pub mod calendar;
pub mod finance;
pub mod generative;
pub mod messaging;
pub mod password;
pub mod pos;

pub use generative::{GenerativeClient, GenerativeService};
