//! Plain-text rendering for the console. JSON output bypasses this module.

use client_core::{Notice, NoticeLevel, PageState, StatsSnapshot};
use shared::domain::{Admin, Booking, KycDocument, Ticket, Transaction, User, Vehicle};

pub fn notice(notice: &Notice) -> String {
    let marker = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{marker}] {}: {}", notice.title, notice.description)
}

/// `Page 2 of 6 (57 items)  1 [2] 3 4 5`
pub fn page_line(page: &PageState, window_size: u32) -> String {
    let window = page
        .window(window_size)
        .into_iter()
        .map(|n| {
            if n == page.current_page {
                format!("[{n}]")
            } else {
                n.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "Page {} of {} ({} items)  {window}",
        page.current_page, page.total_pages, page.total_items
    )
}

pub fn user_row(user: &User) -> String {
    let mut row = format!(
        "#{:<6} {:<24} {:<28} {:<14} verified={} balance={:.2}",
        user.id,
        user.name,
        user.email,
        user.phone,
        if user.is_verified() { "yes" } else { "no" },
        user.account_balance,
    );
    if let Some(status) = user.account_status() {
        row.push_str(&format!(" status={status}"));
    }
    row
}

pub fn booking_row(booking: &Booking) -> String {
    format!(
        "#{:<6} {:<12} {:<10} {} -> {}",
        booking.id, booking.booking_code, booking.status, booking.place, booking.destination_place
    )
}

pub fn transaction_row(tx: &Transaction) -> String {
    format!(
        "#{:<6} {:<10} {:>10} {:<10} {}",
        tx.id, tx.transaction_type, tx.amount, tx.intent, tx.transaction_date
    )
}

pub fn kyc_row(doc: &KycDocument) -> String {
    let files = if doc.files.is_invalid() {
        "invalid file data".to_string()
    } else {
        format!("{} document(s)", doc.files.documents().len())
    };
    format!(
        "#{:<6} driver={:<6} {:<24} {:<28} {files}",
        doc.id, doc.driver_id, doc.name, doc.email
    )
}

pub fn vehicle(vehicle: &Vehicle) -> String {
    let mut row = format!(
        "#{} {} {} ({}, {}) seats={}",
        vehicle.id,
        vehicle.car_name,
        vehicle.car_model,
        vehicle.car_number,
        vehicle.car_color,
        vehicle.seats
    );
    if let Some(driver) = &vehicle.driver {
        row.push_str(&format!(" driver={}", driver.name));
    }
    row
}

/// Only the first line of the message; the rest is in `--json`.
pub fn ticket_row(ticket: &Ticket) -> String {
    let message = ticket.message.lines().next().unwrap_or_default();
    format!(
        "#{:<6} {:<24} {:<28} {message}",
        ticket.id, ticket.name, ticket.email
    )
}

pub fn admin_row(admin: &Admin, is_current: bool) -> String {
    let marker = if is_current { "*" } else { " " };
    format!(
        "{marker} #{:<6} {:<24} {:<28} {:<14} {}",
        admin.id, admin.name, admin.email, admin.phone, admin.role
    )
}

pub fn stats(snapshot: &StatsSnapshot) -> Vec<String> {
    let stats = &snapshot.stats;
    vec![
        format!("Fetched at        {}", snapshot.fetched_at.to_rfc3339()),
        format!("Riders            {}", stats.users),
        format!("Drivers           {}", stats.drivers),
        format!("Uploaded cars     {}", stats.uploaded_cars),
        format!("Rides in progress {}", stats.ride_share_in_progress),
        format!("Active bookings   {}", stats.active_bookings.len()),
        format!("Pending KYC       {}", stats.pending_kyc()),
        format!("Open tickets      {}", stats.reports.len()),
        format!(
            "Cash flow         in {:.2} / out {:.2} / net {:.2}",
            stats.total_inflow,
            stats.total_outflow,
            stats.net_flow()
        ),
    ]
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
