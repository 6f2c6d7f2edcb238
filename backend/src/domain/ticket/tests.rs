//! Tests for the ticket aggregate and its transition table.

use super::*;
use crate::domain::SlaPolicy;
use chrono::{Duration, TimeZone};
use rstest::{fixture, rstest};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[fixture]
fn ticket() -> Ticket {
    let created = at(8);
    let deadlines = SlaPolicy::default()
        .deadlines(Some(created))
        .expect("deadlines");
    Ticket::open(
        TicketId::random(),
        NewTicket {
            customer: UserId::random(),
            title: TicketTitle::new("Printer broken").expect("valid title"),
            description: String::new(),
            priority: TicketPriority::High,
        },
        created,
        deadlines,
    )
}

fn note(text: &str, created_at: DateTime<Utc>) -> Result<Note, TicketValidationError> {
    Note::new(Uuid::new_v4(), UserId::random(), text, None, created_at)
}

#[rstest]
fn open_sets_initial_state(ticket: Ticket) {
    assert_eq!(ticket.status(), TicketStatus::Open);
    assert_eq!(ticket.priority(), TicketPriority::High);
    assert_eq!(ticket.updated_at(), ticket.created_at());
    assert_eq!(ticket.due_date(), ticket.created_at() + Duration::days(7));
    assert_eq!(
        ticket.sla_breach_date(),
        ticket.created_at() + Duration::days(3)
    );
    assert!(ticket.notes().is_empty());
    assert!(ticket.assigned_agent().is_none());
}

#[rstest]
#[case("")]
#[case("   ")]
fn title_rejects_blank(#[case] raw: &str) {
    assert_eq!(
        TicketTitle::new(raw).expect_err("blank"),
        TicketValidationError::EmptyTitle
    );
}

#[rstest]
fn title_rejects_overlong() {
    let raw = "x".repeat(TITLE_MAX + 1);
    assert_eq!(
        TicketTitle::new(raw).expect_err("too long"),
        TicketValidationError::TitleTooLong { max: TITLE_MAX }
    );
}

#[rstest]
#[case(TicketStatus::Open, TicketStatus::InProgress, true)]
#[case(TicketStatus::Open, TicketStatus::OnHold, true)]
#[case(TicketStatus::Open, TicketStatus::Closed, true)]
#[case(TicketStatus::InProgress, TicketStatus::Open, true)]
#[case(TicketStatus::InProgress, TicketStatus::Closed, true)]
#[case(TicketStatus::OnHold, TicketStatus::InProgress, true)]
#[case(TicketStatus::Closed, TicketStatus::Open, true)]
#[case(TicketStatus::Closed, TicketStatus::OnHold, false)]
#[case(TicketStatus::Closed, TicketStatus::InProgress, false)]
#[case(TicketStatus::Closed, TicketStatus::Closed, true)]
fn transition_table(
    #[case] from: TicketStatus,
    #[case] to: TicketStatus,
    #[case] allowed: bool,
) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[rstest]
fn transition_bumps_updated_at_but_not_deadlines(mut ticket: Ticket) {
    let breach = ticket.sla_breach_date();
    ticket
        .transition_to(TicketStatus::InProgress, at(10))
        .expect("allowed");
    assert_eq!(ticket.status(), TicketStatus::InProgress);
    assert_eq!(ticket.updated_at(), at(10));
    assert_eq!(ticket.sla_breach_date(), breach);
}

#[rstest]
fn rejected_transition_leaves_ticket_untouched(mut ticket: Ticket) {
    ticket
        .transition_to(TicketStatus::Closed, at(9))
        .expect("close");
    let before = ticket.clone();
    let err = ticket
        .transition_to(TicketStatus::OnHold, at(11))
        .expect_err("closed tickets only reopen");
    assert_eq!(
        err,
        TicketValidationError::InvalidTransition {
            from: TicketStatus::Closed,
            to: TicketStatus::OnHold,
        }
    );
    assert_eq!(ticket, before);
}

#[rstest]
fn append_note_advances_updated_at(mut ticket: Ticket) {
    let appended = note("Tried turning it off and on", at(12)).expect("valid note");
    ticket.append_note(appended).expect("open tickets accept notes");
    assert_eq!(ticket.notes().len(), 1);
    assert_eq!(ticket.updated_at(), at(12));
}

#[rstest]
fn closed_ticket_rejects_notes(mut ticket: Ticket) {
    ticket
        .transition_to(TicketStatus::Closed, at(9))
        .expect("close");
    let err = ticket
        .append_note(note("too late", at(10)).expect("valid note"))
        .expect_err("closed");
    assert_eq!(err, TicketValidationError::TicketClosed);
    assert!(ticket.notes().is_empty());
}

#[rstest]
fn blank_note_is_rejected() {
    assert_eq!(
        note("  ", at(9)).expect_err("blank"),
        TicketValidationError::EmptyNoteText
    );
}

#[rstest]
fn missed_sla_ignores_closed_tickets(mut ticket: Ticket) {
    let later = ticket.sla_breach_date() + Duration::hours(1);
    assert!(ticket.has_missed_sla(later));
    ticket
        .transition_to(TicketStatus::Closed, at(9))
        .expect("close");
    assert!(!ticket.has_missed_sla(later));
}

#[rstest]
#[case("open", TicketStatus::Open)]
#[case("in-progress", TicketStatus::InProgress)]
#[case("on-hold", TicketStatus::OnHold)]
#[case("closed", TicketStatus::Closed)]
fn status_parses_wire_labels(#[case] raw: &str, #[case] expected: TicketStatus) {
    assert_eq!(raw.parse::<TicketStatus>().expect("known"), expected);
    assert_eq!(
        serde_json::to_value(expected).expect("serialises"),
        serde_json::Value::String(raw.to_owned())
    );
}

#[rstest]
fn unknown_status_is_rejected() {
    assert_eq!(
        "resolved".parse::<TicketStatus>().expect_err("unknown"),
        TicketValidationError::UnknownStatus
    );
}

#[rstest]
fn validation_errors_map_to_invalid_request() {
    let err = Error::from(TicketValidationError::EmptyTitle);
    assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], "title");
    assert_eq!(details["code"], "empty_title");
}

#[rstest]
fn priority_defaults_to_medium() {
    assert_eq!(TicketPriority::default(), TicketPriority::Medium);
}
