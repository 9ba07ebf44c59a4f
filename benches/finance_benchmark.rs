// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{NaiveDate, NaiveTime, Utc, Weekday};
use criterion::{criterion_group, criterion_main, Criterion};
use gym_desk::models::{
    Budget, ClassSchedule, Expense, GymClass, Payment, PaymentKind, PaymentMethod,
};
use gym_desk::services::calendar::build_month;
use gym_desk::services::finance::{build_ledger, project_budgets};
use gym_desk::time_utils::YearMonth;
use std::hint::black_box;

const CATEGORIES: [&str; 6] = ["rent", "utilities", "cleaning", "equipment", "payroll", "marketing"];

fn busy_month() -> (YearMonth, Vec<Payment>, Vec<Expense>) {
    let month = YearMonth::parse("2025-03").expect("valid month");
    let first = month.first_day();

    // Roughly a mid-sized gym: 40 payments and 8 expenses a day
    let payments = (0..1240)
        .map(|i| Payment {
            id: format!("p{}", i),
            user_id: Some(format!("client{}", i % 400)),
            amount_cents: 1500 + (i as i64 % 7) * 500,
            method: PaymentMethod::Card,
            kind: if i % 3 == 0 {
                PaymentKind::Membership
            } else {
                PaymentKind::Retail
            },
            description: String::new(),
            date: first + chrono::Days::new((i % 31) as u64),
            recorded_by: "desk".to_string(),
        })
        .collect();

    let expenses = (0..248)
        .map(|i| Expense {
            id: format!("e{}", i),
            category: CATEGORIES[i % CATEGORIES.len()].to_string(),
            amount_cents: 2000 + (i as i64 % 11) * 1000,
            description: String::new(),
            date: first + chrono::Days::new((i % 31) as u64),
            recorded_by: "admin".to_string(),
        })
        .collect();

    (month, payments, expenses)
}

fn weekly_classes() -> Vec<GymClass> {
    let weekdays = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    (0..60)
        .map(|i| GymClass {
            id: format!("c{}", i),
            name: format!("Class {}", i),
            description: String::new(),
            schedule: ClassSchedule::Weekly {
                weekday: weekdays[i % weekdays.len()],
            },
            start_time: NaiveTime::from_hms_opt(6 + (i % 14) as u32, 0, 0).unwrap_or_default(),
            duration_minutes: 45,
            capacity: 20,
            trainer_ids: vec![format!("t{}", i % 8)],
            booked_client_ids: (0..i % 20).map(|c| format!("client{}", c)).collect(),
            created_at: Utc::now(),
        })
        .collect()
}

fn benchmark_finance(c: &mut Criterion) {
    let (month, payments, expenses) = busy_month();
    let budgets: Vec<Budget> = CATEGORIES
        .iter()
        .map(|category| Budget {
            category: category.to_string(),
            monthly_limit_cents: 250_000,
        })
        .collect();
    let today = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap_or_default();

    let mut group = c.benchmark_group("finance");

    group.bench_function("build_ledger", |b| {
        b.iter(|| build_ledger(black_box(&payments), black_box(&expenses)))
    });

    group.bench_function("project_budgets", |b| {
        b.iter(|| project_budgets(month, today, black_box(&budgets), black_box(&expenses)))
    });

    group.finish();
}

fn benchmark_calendar(c: &mut Criterion) {
    let month = YearMonth::parse("2025-03").expect("valid month");
    let classes = weekly_classes();

    c.bench_function("build_month_60_weekly_classes", |b| {
        b.iter(|| build_month(month, black_box(&classes)))
    });
}

criterion_group!(benches, benchmark_finance, benchmark_calendar);
criterion_main!(benches);
