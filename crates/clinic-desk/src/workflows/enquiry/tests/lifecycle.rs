use super::common::*;
use chrono::Duration;

use crate::workflows::enquiry::{
    apply, EnquiryCommand, EnquiryStatus, IntakeError, LifecycleEffect, LifecycleError,
    NewEnquiry, ReminderDuration,
};

fn run(
    record: &crate::workflows::enquiry::Enquiry,
    command: EnquiryCommand,
    minutes_later: i64,
) -> Result<crate::workflows::enquiry::Transition, LifecycleError> {
    apply(
        record,
        command,
        &staff(),
        opened_at() + Duration::minutes(minutes_later),
    )
}

#[test]
fn intake_validates_mobile_and_creator() {
    assert_eq!(submission().validate(), Ok(()));

    let mut missing_prefix = submission();
    missing_prefix.enquirer_mobile = "9845012345".to_string();
    assert_eq!(missing_prefix.validate(), Err(IntakeError::InvalidMobile));

    let mut short = submission();
    short.enquirer_mobile = "+91 98450".to_string();
    assert_eq!(short.validate(), Err(IntakeError::InvalidMobile));

    let mut bad_creator = submission();
    bad_creator.created_by = "front desk".to_string();
    assert_eq!(bad_creator.validate(), Err(IntakeError::InvalidCreatedBy));

    let nobody = NewEnquiry {
        created_by: "NONE".to_string(),
        ..submission()
    };
    assert_eq!(nobody.validate(), Ok(()));

    let anonymous = NewEnquiry {
        enquirer_name: "  ".to_string(),
        ..submission()
    };
    assert_eq!(anonymous.validate(), Err(IntakeError::MissingEnquirerName));
}

#[test]
fn intake_stamps_pending_since_and_normalizes_creator() {
    let record = NewEnquiry {
        created_by: "none".to_string(),
        ..submission()
    }
    .into_enquiry(
        crate::workflows::enquiry::EnquiryId("e".to_string()),
        &staff(),
        opened_at(),
    );

    assert_eq!(record.created_by_email, "None");
    assert_eq!(record.created_by, "uid-priya");
    assert_eq!(record.notification.pending_since, Some(opened_at()));
    assert_eq!(record.audit.updated_at, opened_at());
    assert!(record.reminder.is_none());
}

#[test]
fn assign_staff_moves_pending_to_in_progress() {
    let record = pending_enquiry();
    let transition = run(
        &record,
        EnquiryCommand::AssignStaff {
            staff_name: "Asha".to_string(),
        },
        5,
    )
    .expect("assignment accepted");

    assert_eq!(transition.record.status, EnquiryStatus::InProgress);
    assert_eq!(transition.record.assigned_staff.as_deref(), Some("Asha"));
    assert_eq!(transition.effects, vec![LifecycleEffect::Persist]);
    assert_eq!(
        transition.record.audit.updated_at,
        opened_at() + Duration::minutes(5)
    );
    assert_eq!(record.status, EnquiryStatus::Pending, "input is untouched");
}

#[test]
fn closing_actions_require_an_open_status() {
    for status in [EnquiryStatus::Completed, EnquiryStatus::Cancelled] {
        let record = enquiry_in(status);
        for command in [
            EnquiryCommand::MarkCompleted,
            EnquiryCommand::Cancel,
            EnquiryCommand::AssignStaff {
                staff_name: "Asha".to_string(),
            },
            EnquiryCommand::AssignDoctor {
                doctor_name: "Rao".to_string(),
            },
        ] {
            let action = command.action();
            assert_eq!(
                run(&record, command, 1),
                Err(LifecycleError::InvalidTransition { action, status })
            );
        }
    }
}

#[test]
fn completing_a_cancelled_enquiry_is_rejected() {
    let record = enquiry_in(EnquiryStatus::Cancelled);
    let error = run(&record, EnquiryCommand::MarkCompleted, 1).expect_err("rejected");
    assert_eq!(
        error.to_string(),
        "cannot complete an enquiry that is cancelled"
    );
}

#[test]
fn complete_and_cancel_from_open_statuses() {
    let in_progress = enquiry_in(EnquiryStatus::InProgress);
    let completed = run(&in_progress, EnquiryCommand::MarkCompleted, 1).expect("complete");
    assert_eq!(completed.record.status, EnquiryStatus::Completed);

    let cancelled = run(&pending_enquiry(), EnquiryCommand::Cancel, 1).expect("cancel");
    assert_eq!(cancelled.record.status, EnquiryStatus::Cancelled);
}

#[test]
fn doctor_assignment_stores_titled_name() {
    let transition = run(
        &pending_enquiry(),
        EnquiryCommand::AssignDoctor {
            doctor_name: "Kulkarni".to_string(),
        },
        2,
    )
    .expect("doctor assigned");

    assert_eq!(
        transition.record.assigned_doctor.as_deref(),
        Some("Dr. Kulkarni")
    );
    assert_eq!(
        transition.record.assigned_doctor_at,
        Some(opened_at() + Duration::minutes(2))
    );
    assert_eq!(transition.record.status, EnquiryStatus::Pending);
}

#[test]
fn blank_names_are_rejected() {
    assert_eq!(
        run(
            &pending_enquiry(),
            EnquiryCommand::AssignStaff {
                staff_name: "   ".to_string()
            },
            1
        ),
        Err(LifecycleError::BlankValue {
            field: "staff name"
        })
    );
}

#[test]
fn editing_details_twice_appends_two_entries() {
    let command = || EnquiryCommand::EditDetails {
        text: "Wants MRI slot".to_string(),
    };
    let first = run(&pending_enquiry(), command(), 1).expect("edit");
    let second = run(&first.record, command(), 2).expect("edit");

    assert_eq!(second.record.details.as_deref(), Some("Wants MRI slot"));
    assert_eq!(second.record.details_history.len(), 2);
    assert_eq!(second.record.details_history[1].by_name, "Priya S");
    assert_eq!(second.record.details_history[1].by_email, "priya.s@clinic.in");
}

#[test]
fn details_and_remarks_are_allowed_on_closed_enquiries() {
    let closed = enquiry_in(EnquiryStatus::Completed);
    let edited = run(
        &closed,
        EnquiryCommand::SaveDoctorRemarks {
            remarks: "Follow up in 2 weeks".to_string(),
        },
        3,
    )
    .expect("remarks saved");
    assert_eq!(edited.record.status, EnquiryStatus::Completed);
    assert_eq!(
        edited.record.doctor_remarks_at,
        Some(opened_at() + Duration::minutes(3))
    );
}

#[test]
fn set_then_cancel_reminder_round_trips() {
    let record = enquiry_in(EnquiryStatus::InProgress);
    let scheduled = run(
        &record,
        EnquiryCommand::SetReminder {
            duration: ReminderDuration::ThreeDays,
        },
        1,
    )
    .expect("reminder set");

    let schedule = scheduled.record.reminder.clone().expect("reminder present");
    assert_eq!(schedule.original_status, EnquiryStatus::InProgress);
    assert_eq!(schedule.scheduled_at, opened_at() + Duration::minutes(1));
    assert_eq!(schedule.expires_at(), schedule.scheduled_at + Duration::hours(72));

    let cancelled = run(&scheduled.record, EnquiryCommand::CancelReminder, 2).expect("cancel");
    assert!(cancelled.record.reminder.is_none());
    assert_eq!(cancelled.record.status, EnquiryStatus::InProgress);
}

#[test]
fn second_reminder_is_rejected_while_one_is_active() {
    let scheduled = run(
        &enquiry_in(EnquiryStatus::Cancelled),
        EnquiryCommand::SetReminder {
            duration: ReminderDuration::OneDay,
        },
        1,
    )
    .expect("reminder set");

    assert_eq!(
        run(
            &scheduled.record,
            EnquiryCommand::SetReminder {
                duration: ReminderDuration::FiveDays
            },
            2
        ),
        Err(LifecycleError::ReminderAlreadyActive)
    );
}

#[test]
fn pending_enquiries_cannot_be_deferred() {
    assert_eq!(
        run(
            &pending_enquiry(),
            EnquiryCommand::SetReminder {
                duration: ReminderDuration::OneDay
            },
            1
        ),
        Err(LifecycleError::InvalidTransition {
            action: "set a reminder on",
            status: EnquiryStatus::Pending,
        })
    );

    for status in [
        EnquiryStatus::InProgress,
        EnquiryStatus::Completed,
        EnquiryStatus::Cancelled,
    ] {
        let scheduled = run(
            &enquiry_in(status),
            EnquiryCommand::SetReminder {
                duration: ReminderDuration::OneDay,
            },
            1,
        )
        .expect("handled enquiries accept a reminder");
        assert_eq!(
            scheduled.record.reminder.map(|schedule| schedule.original_status),
            Some(status)
        );
    }
}

#[test]
fn cancel_reminder_without_one_needs_no_write() {
    let transition = run(&pending_enquiry(), EnquiryCommand::CancelReminder, 1).expect("noop");
    assert!(!transition.requires_write());
    assert_eq!(transition.record, pending_enquiry());
}

#[test]
fn expiry_is_exact_to_the_second_and_idempotent() {
    let scheduled = apply(
        &enquiry_in(EnquiryStatus::Completed),
        EnquiryCommand::SetReminder {
            duration: ReminderDuration::OneDay,
        },
        &staff(),
        opened_at(),
    )
    .expect("reminder set")
    .record;

    let early = apply(
        &scheduled,
        EnquiryCommand::ExpireReminder,
        &staff(),
        opened_at() + Duration::hours(24) - Duration::seconds(1),
    )
    .expect("check runs");
    assert!(early.effects.is_empty());
    assert_eq!(early.record.status, EnquiryStatus::Completed);

    let due = opened_at() + Duration::hours(24) + Duration::seconds(1);
    let expired = apply(&scheduled, EnquiryCommand::ExpireReminder, &staff(), due)
        .expect("check runs");
    assert!(expired.expired());
    assert_eq!(
        expired.effects,
        vec![
            LifecycleEffect::Persist,
            LifecycleEffect::ReminderExpired {
                original_status: EnquiryStatus::Completed
            }
        ]
    );
    assert_eq!(expired.record.status, EnquiryStatus::Pending);
    assert!(expired.record.reminder.is_none());
    assert_eq!(expired.record.notification.pending_since, Some(due));
    assert_eq!(expired.record.notification.reminder_expired_at, Some(due));
    assert_eq!(expired.record.notification.last_notification_shown, None);

    let again = apply(&expired.record, EnquiryCommand::ExpireReminder, &staff(), due)
        .expect("check runs");
    assert!(again.effects.is_empty());
    assert_eq!(again.record, expired.record);
}

#[test]
fn expiry_check_at_exact_deadline_fires() {
    let scheduled = run(
        &enquiry_in(EnquiryStatus::InProgress),
        EnquiryCommand::SetReminder {
            duration: ReminderDuration::FiveDays,
        },
        0,
    )
    .expect("reminder set")
    .record;

    let transition = apply(
        &scheduled,
        EnquiryCommand::ExpireReminder,
        &staff(),
        opened_at() + Duration::hours(120),
    )
    .expect("check runs");
    assert!(transition.expired());
}

#[test]
fn reopening_to_pending_restamps_pending_since() {
    let in_progress = run(
        &pending_enquiry(),
        EnquiryCommand::AssignStaff {
            staff_name: "Asha".to_string(),
        },
        1,
    )
    .expect("assigned")
    .record;
    let scheduled = run(
        &in_progress,
        EnquiryCommand::SetReminder {
            duration: ReminderDuration::OneDay,
        },
        2,
    )
    .expect("reminder")
    .record;

    let later = opened_at() + Duration::days(2);
    let expired = apply(&scheduled, EnquiryCommand::ExpireReminder, &staff(), later)
        .expect("expired")
        .record;
    assert_eq!(expired.notification.pending_since, Some(later));
    assert_eq!(expired.assigned_staff.as_deref(), Some("Asha"));
}

#[test]
fn notification_shown_is_recorded_on_the_record() {
    let shown = run(&pending_enquiry(), EnquiryCommand::RecordNotificationShown, 9)
        .expect("stamped");
    assert_eq!(
        shown.record.notification.last_notification_shown,
        Some(opened_at() + Duration::minutes(9))
    );
}
