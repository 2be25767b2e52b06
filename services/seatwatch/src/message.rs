//! Telegram message texts (HTML parse mode)

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::config::Target;
use crate::snapshot::Snapshot;

pub const SHUTDOWN_MESSAGE: &str = "🛑 <b>Seat Monitor Stopped</b>";

/// Escape the three characters Telegram's HTML mode treats as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Seats became available on `target`; `classes` are the newly available ones
pub fn availability(
    search_name: &str,
    target: &Target,
    snapshot: &Snapshot,
    classes: &[String],
) -> String {
    let mut msg = String::from("🚂 <b>TICKETS AVAILABLE!</b>\n\n");
    let _ = writeln!(msg, "<b>{}</b>", escape_html(search_name));
    let _ = writeln!(msg, "Train: <b>{}</b>", escape_html(&target.name));
    let _ = writeln!(
        msg,
        "New: {}\n",
        classes
            .iter()
            .map(|c| escape_html(c))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut any_coach = false;
    for coach in snapshot.available_coaches() {
        any_coach = true;
        let _ = writeln!(
            msg,
            "🎫 {} (Coach #{})",
            escape_html(&coach.seat_class),
            escape_html(&coach.coach_no)
        );
        let _ = writeln!(msg, "   Available: <b>{}</b> seats\n", coach.available);
    }

    // Snapshots built from counts alone carry no coach detail
    if !any_coach {
        for (class, count) in snapshot.counts.iter().filter(|(_, n)| **n > 0) {
            let _ = writeln!(msg, "🎫 {}", escape_html(class));
            let _ = writeln!(msg, "   Available: <b>{}</b> seats\n", count);
        }
    }

    msg
}

/// Seats that were available on `target` are gone
pub fn sold_out(search_name: &str, target: &Target, classes: &[String]) -> String {
    let mut msg = String::from("⚠️ <b>Seats gone</b>\n\n");
    let _ = writeln!(msg, "<b>{}</b>", escape_html(search_name));
    let _ = writeln!(msg, "Train: <b>{}</b>\n", escape_html(&target.name));
    for class in classes {
        let _ = writeln!(msg, "❌ {}", escape_html(class));
    }
    msg
}

/// Sent once when the poll loop starts
pub fn startup(
    search_name: &str,
    targets: &[Target],
    interval: Duration,
    started_at: DateTime<Local>,
) -> String {
    let mut msg = String::from("🤖 <b>Seat Monitor Started</b>\n\n");
    let _ = writeln!(msg, "<b>{}</b>\n", escape_html(search_name));
    let _ = writeln!(msg, "Monitoring {} trips:", targets.len());
    for target in targets {
        let _ = writeln!(msg, "  • {}", escape_html(&target.name));
    }
    let _ = writeln!(msg, "\nCheck interval: {}", interval_text(interval));
    let _ = write!(msg, "Started: {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    msg
}

fn interval_text(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs > 0 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        humantime::format_duration(interval).to_string()
    }
}
