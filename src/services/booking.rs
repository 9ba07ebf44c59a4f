// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Class booking rules.
//!
//! The client checks run before the class is read; the roster changes run
//! against the class as read inside the booking transaction.

use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{ClassSchedule, GymClass, Role, User};

/// Only clients with a membership active today may book.
pub fn check_client_can_book(client: &User, today: NaiveDate) -> Result<(), AppError> {
    if client.role != Role::Client {
        return Err(AppError::BadRequest("Only clients can book classes".to_string()));
    }
    if !client.has_active_membership(today) {
        return Err(AppError::BadRequest(format!(
            "{} has no active membership",
            client.name
        )));
    }
    Ok(())
}

/// Add `client_id` to the roster.
pub fn book(class: &mut GymClass, client_id: &str, today: NaiveDate) -> Result<(), AppError> {
    if let ClassSchedule::Once { date } = class.schedule {
        if date < today {
            return Err(AppError::BadRequest(
                "This class has already taken place".to_string(),
            ));
        }
    }
    if class.is_booked_by(client_id) {
        return Err(AppError::Conflict("Already booked for this class".to_string()));
    }
    if class.is_full() {
        return Err(AppError::Conflict(format!("{} is full", class.name)));
    }

    class.booked_client_ids.push(client_id.to_string());
    Ok(())
}

/// Remove `client_id` from the roster.
pub fn cancel(class: &mut GymClass, client_id: &str) -> Result<(), AppError> {
    if !class.is_booked_by(client_id) {
        return Err(AppError::BadRequest("No booking to cancel".to_string()));
    }
    class.booked_client_ids.retain(|c| c != client_id);
    Ok(())
}
