//! Two weeks in the life of a learner's browser, compressed to a second.
//!
//! Run with `RUST_LOG=debug cargo run -p page-load` to see every store call.

use std::time::Duration;

use seshat::bridge::SESSION_COOKIE;
use seshat::prelude::*;
use seshat::session::ManualClock;

const DAY: Duration = Duration::from_secs(86_400);

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Everyone's contract is active except the codes listed here.
struct Roster {
    expired: Vec<&'static str>,
}

impl RosterGate for Roster {
    async fn admit(&self, owner: &OwnerId) -> Result<Admission, GateError> {
        if self.expired.iter().any(|code| *code == owner.as_str()) {
            Ok(Admission::Denied("contract expired".into()))
        } else {
            Ok(Admission::Admitted)
        }
    }
}

type App = Seshat<MemoryStore, Roster, ManualClock>;

fn app(clock: &ManualClock) -> Result<App, SeshatError> {
    let settings = Settings::from_env()?;
    let service = SessionService::with_clock(MemoryStore::new(), settings.session, clock.clone());
    Ok(Seshat::from_parts(
        service,
        Roster {
            expired: vec!["stu99"],
        },
        settings.cookies,
        settings.readiness,
    ))
}

fn describe(day: u64, outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::Restored { owner, rotated, .. } => {
            let note = if *rotated { " (token rotated)" } else { "" };
            format!("day {day:>2}: welcome back, {owner}{note}")
        }
        other => format!("day {day:>2}: {}", other.user_message().unwrap_or_default()),
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), SeshatError> {
    seshat::init_tracing();

    let clock = ManualClock::new(1_700_000_000);
    let app = app(&clock)?;
    let laptop = MemoryCookieJar::new();

    // Day 0: the login form checked the password.
    app.client(laptop.clone()).sign_in("stu42", Some("laptop-ua")).await?;
    println!("day  0: signed in");

    // Weekly visits, each a hard refresh: new flow, same cookies.
    let mut day: u64 = 0;
    for gap in [3u32, 5, 6, 7] {
        clock.advance(DAY * gap);
        day += u64::from(gap);
        let outcome = app.client(laptop.clone()).restore(Some("laptop-ua")).await;
        println!("{}", describe(day, &outcome));
    }

    // A copied cookie replayed from a different browser.
    let thief = MemoryCookieJar::new();
    if let Some(token) = laptop.get(SESSION_COOKIE) {
        thief.preload(SESSION_COOKIE, &token);
    }
    let outcome = app.client(thief).restore(Some("other-ua")).await;
    println!("{} [replayed elsewhere]", describe(day, &outcome));

    // Logout on the laptop.
    app.client(laptop.clone()).sign_out().await;
    let outcome = app.client(laptop.clone()).restore(Some("laptop-ua")).await;
    println!("{} [after logout]", describe(day, &outcome));

    // A learner whose contract ran out still holds a valid token.
    let desk = MemoryCookieJar::new();
    app.client(desk.clone()).sign_in("stu99", None).await?;
    let outcome = app.client(desk).restore(None).await;
    println!("{} [stu99, contract expired]", describe(day, &outcome));

    let sessions = app.service().store().len().await;
    tracing::info!(sessions, "demo finished");
    Ok(())
}
