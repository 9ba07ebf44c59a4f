// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod challenge;
pub mod class;
pub mod finance;
pub mod message;
pub mod operations;
pub mod product;
pub mod user;

pub use challenge::{Challenge, Participant, Standing};
pub use class::{ClassSchedule, GymClass};
pub use finance::{Budget, Expense, Payment, PaymentKind, PaymentMethod};
pub use message::{conversation_id, Announcement, Audience, Message};
pub use operations::{EquipmentItem, EquipmentStatus, StaffTask, TaskStatus};
pub use product::{Product, Sale, SaleLine};
pub use user::{CheckIn, Membership, MembershipPlan, MembershipStatus, Role, User, UserProfile};
