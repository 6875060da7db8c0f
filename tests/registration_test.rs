mod common;

use common::*;
use session_checkin::domain::model::{SessionAttendanceRecord, SheetKind};
use session_checkin::{CheckinError, DenialReason, ProcessLock, RegistrationOutcome};
use std::sync::Arc;

async fn preregister(store: &session_checkin::MemoryStore, dni: &str, session_id: &str) {
    let record = SessionAttendanceRecord {
        attendee_id: dni.to_string(),
        session_id: session_id.to_string(),
        timestamp: "2025-11-20T09:00:00".to_string(),
    };
    store
        .insert_row(SheetKind::SessionAttendance, record.to_row())
        .await;
}

#[tokio::test]
async fn test_end_to_end_registration() {
    let store = seeded_store().await;
    let registrar = registrar(store.clone());

    let outcome = registrar
        .register(DNI, "S1", "2025-11-20T09:30:00")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RegistrationOutcome::Registered {
            dni: DNI.to_string(),
            session_id: "S1".to_string(),
            session_name: "Keynote".to_string(),
            timestamp: "2025-11-20T09:30:00".to_string(),
        }
    );

    let rows = store.rows(SheetKind::SessionAttendance).await;
    assert_eq!(rows.len(), 1);
    let record = SessionAttendanceRecord::from_row(&rows[0]);
    assert_eq!(record.attendee_id, DNI);
    assert_eq!(record.session_id, "S1");
    assert_eq!(record.timestamp, "2025-11-20T09:30:00");
}

#[tokio::test]
async fn test_second_registration_is_duplicate() {
    let store = seeded_store().await;
    let registrar = registrar(store.clone());

    assert!(registrar
        .register(DNI, "S1", "2025-11-20T09:30:00")
        .await
        .unwrap()
        .is_registered());

    let outcome = registrar
        .register(DNI, "S1", "2025-11-20T09:31:00")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RegistrationOutcome::AlreadyRegistered {
            dni: DNI.to_string(),
            session_id: "S1".to_string(),
            session_name: "Keynote".to_string(),
        }
    );
    assert_eq!(store.rows(SheetKind::SessionAttendance).await.len(), 1);
}

#[tokio::test]
async fn test_full_session_has_no_capacity() {
    let store = seeded_store().await;
    preregister(&store, "11111111", "S1").await;
    preregister(&store, "22222222", "S1").await;

    let outcome = registrar(store.clone())
        .register(DNI, "S1", "2025-11-20T09:30:00")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RegistrationOutcome::NoCapacity {
            session_id: "S1".to_string(),
            session_name: "Keynote".to_string(),
            total_capacity: 2,
            registered: 2,
        }
    );
    assert_eq!(store.rows(SheetKind::SessionAttendance).await.len(), 2);
}

#[tokio::test]
async fn test_capacity_is_checked_before_duplicate() {
    let store = seeded_store().await;
    preregister(&store, DNI, "S1").await;
    preregister(&store, "22222222", "S1").await;

    let outcome = registrar(store).register(DNI, "S1", "t").await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::NoCapacity { .. }));
}

#[tokio::test]
async fn test_zero_capacity_session_is_always_full() {
    let store = seeded_store().await;
    add_session(&store, session("S0", "Closed", "10:00", "11:00", 0)).await;

    let outcome = registrar(store).register(DNI, "S0", "t").await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::NoCapacity { registered: 0, .. }));
}

#[tokio::test]
async fn test_overlapping_session_is_a_conflict() {
    let store = seeded_store().await;
    add_session(&store, session("S2", "Workshop", "09:30", "10:30", 10)).await;
    preregister(&store, DNI, "S2").await;

    let outcome = registrar(store).register(DNI, "S1", "t").await.unwrap();
    assert_eq!(
        outcome,
        RegistrationOutcome::ScheduleConflict {
            session_id: "S1".to_string(),
            conflict_session_id: "S2".to_string(),
            conflict_name: "Workshop".to_string(),
        }
    );
}

#[tokio::test]
async fn test_back_to_back_sessions_do_not_conflict() {
    let store = seeded_store().await;
    add_session(&store, session("S0", "Opening", "09:00", "10:00", 10)).await;
    add_session(&store, session("S3", "Panel", "11:00", "12:00", 10)).await;
    preregister(&store, DNI, "S0").await;
    preregister(&store, DNI, "S3").await;

    let outcome = registrar(store).register(DNI, "S1", "t").await.unwrap();
    assert!(outcome.is_registered());
}

#[tokio::test]
async fn test_other_attendees_sessions_are_not_conflicts() {
    let store = seeded_store().await;
    add_session(&store, session("S2", "Workshop", "09:30", "10:30", 10)).await;
    preregister(&store, OTHER_DNI, "S2").await;

    let outcome = registrar(store).register(DNI, "S1", "t").await.unwrap();
    assert!(outcome.is_registered());
}

#[tokio::test]
async fn test_record_for_unknown_session_is_ignored_in_overlap_check() {
    let store = seeded_store().await;
    preregister(&store, DNI, "GONE").await;

    let outcome = registrar(store).register(DNI, "S1", "t").await.unwrap();
    assert!(outcome.is_registered());
}

#[tokio::test]
async fn test_malformed_registered_session_is_skipped_in_overlap_check() {
    let store = seeded_store().await;
    add_session(&store, session("SX", "Broken", "soon", "later", 5)).await;
    preregister(&store, DNI, "SX").await;

    let outcome = registrar(store.clone()).register(DNI, "S1", "t").await.unwrap();
    assert!(outcome.is_registered());
    assert_eq!(store.rows(SheetKind::SessionAttendance).await.len(), 2);
}

#[tokio::test]
async fn test_session_id_is_matched_exactly() {
    let store = seeded_store().await;
    let registrar = registrar(store.clone());

    assert_eq!(
        registrar.register(DNI, " S1", "t").await.unwrap(),
        RegistrationOutcome::SessionNotFound {
            session_id: " S1".to_string()
        }
    );
    assert_eq!(
        registrar.register(DNI, "   ", "t").await.unwrap(),
        RegistrationOutcome::MissingSessionId
    );
    assert!(store.rows(SheetKind::SessionAttendance).await.is_empty());
}

#[tokio::test]
async fn test_guard_chain_outcomes() {
    let store = seeded_store().await;
    add_attendee(&store, OTHER_DNI, "Luis Rojas").await;
    let registrar = registrar(store);

    assert_eq!(
        registrar.register("1234567", "S1", "t").await.unwrap(),
        RegistrationOutcome::InvalidDni {
            dni: "1234567".to_string()
        }
    );
    assert_eq!(
        registrar.register(DNI, "", "t").await.unwrap(),
        RegistrationOutcome::MissingSessionId
    );
    assert_eq!(
        registrar.register("99999999", "S1", "t").await.unwrap(),
        RegistrationOutcome::DniNotFound {
            dni: "99999999".to_string()
        }
    );
    assert_eq!(
        registrar.register(DNI, "S9", "t").await.unwrap(),
        RegistrationOutcome::SessionNotFound {
            session_id: "S9".to_string()
        }
    );
    assert_eq!(
        registrar.register(OTHER_DNI, "S1", "t").await.unwrap(),
        RegistrationOutcome::NoGeneralAttendance {
            dni: OTHER_DNI.to_string()
        }
    );
}

#[tokio::test]
async fn test_too_early_carries_remaining_time() {
    let store = seeded_store().await;
    let registrar = registrar_at(store, ProcessLock::new(), at(8, 59));

    match registrar.register(DNI, "S1", "t").await.unwrap() {
        RegistrationOutcome::WindowDenied {
            reason,
            minutes_remaining,
            hours,
            minutes,
            minutes_late,
            session_name,
            ..
        } => {
            assert_eq!(reason, DenialReason::TooEarly);
            assert_eq!(minutes_remaining, Some(61));
            assert_eq!(hours, Some(1));
            assert_eq!(minutes, Some(1));
            assert_eq!(minutes_late, None);
            assert_eq!(session_name, "Keynote");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_window_edges() {
    let store = seeded_store().await;

    let exactly_one_hour = registrar_at(store.clone(), ProcessLock::new(), at(9, 0));
    assert!(exactly_one_hour
        .register(DNI, "S1", "t")
        .await
        .unwrap()
        .is_registered());

    let store = seeded_store().await;
    let fifteen_after = registrar_at(store, ProcessLock::new(), at(10, 15));
    assert!(fifteen_after
        .register(DNI, "S1", "t")
        .await
        .unwrap()
        .is_registered());
}

#[tokio::test]
async fn test_too_late_and_ended() {
    let store = seeded_store().await;

    let late = registrar_at(store.clone(), ProcessLock::new(), at(10, 16));
    match late.register(DNI, "S1", "t").await.unwrap() {
        RegistrationOutcome::WindowDenied {
            reason,
            minutes_late,
            ..
        } => {
            assert_eq!(reason, DenialReason::TooLate);
            assert_eq!(minutes_late, Some(16));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let ended = registrar_at(store.clone(), ProcessLock::new(), at(11, 1));
    match ended.register(DNI, "S1", "t").await.unwrap() {
        RegistrationOutcome::WindowDenied { reason, .. } => {
            assert_eq!(reason, DenialReason::SessionEnded)
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert!(store.rows(SheetKind::SessionAttendance).await.is_empty());
}

#[tokio::test]
async fn test_lock_timeout_is_a_fault() {
    let store = seeded_store().await;
    let registrar = registrar_at(store.clone(), CountingLock::timing_out(), now());

    let err = registrar.register(DNI, "S1", "t").await.unwrap_err();
    assert!(matches!(err, CheckinError::LockTimeout { timeout_ms: 2000 }));
    assert!(store.rows(SheetKind::SessionAttendance).await.is_empty());
}

#[tokio::test]
async fn test_lock_released_when_append_fails() {
    let store = seeded_store().await;
    store.fail_appends(true);
    let lock = CountingLock::default();
    let registrar = registrar_at(store, lock.clone(), now());

    let err = registrar.register(DNI, "S1", "t").await.unwrap_err();
    assert!(matches!(err, CheckinError::StoreError { .. }));
    assert_eq!(lock.acquired(), 1);
    assert_eq!(lock.released(), 1);
}

#[tokio::test]
async fn test_lock_released_on_every_locked_outcome() {
    let store = seeded_store().await;
    let lock = CountingLock::default();
    let registrar = registrar_at(store, lock.clone(), now());

    registrar.register(DNI, "S1", "t").await.unwrap();
    registrar.register(DNI, "S1", "t").await.unwrap();
    assert_eq!(lock.acquired(), 2);
    assert_eq!(lock.released(), 2);

    // 未進入鎖的結果不會取得鎖
    registrar.register("bad", "S1", "t").await.unwrap();
    assert_eq!(lock.acquired(), 2);
}

#[tokio::test]
async fn test_malformed_session_time_is_a_fault() {
    let store = seeded_store().await;
    add_session(&store, session("SX", "Broken", "soon", "later", 5)).await;

    let err = registrar(store).register(DNI, "SX", "t").await.unwrap_err();
    assert!(matches!(err, CheckinError::DataError { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_respect_capacity() {
    let store = seeded_store().await;
    add_session(&store, session("S5", "Lab", "10:00", "11:00", 1)).await;
    let dnis: Vec<String> = (0..8).map(|i| format!("5000000{}", i)).collect();
    for dni in &dnis {
        add_attendee(&store, dni, "Guest").await;
        add_general(&store, dni, "2025-11-20T08:00:00").await;
    }

    let registrar = Arc::new(registrar(store.clone()));
    let handles: Vec<_> = dnis
        .into_iter()
        .map(|dni| {
            let registrar = registrar.clone();
            tokio::spawn(async move { registrar.register(&dni, "S5", "t").await })
        })
        .collect();

    let mut registered = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        match outcome {
            RegistrationOutcome::Registered { .. } => registered += 1,
            RegistrationOutcome::NoCapacity { .. } => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(registered, 1);
    assert_eq!(store.rows(SheetKind::SessionAttendance).await.len(), 1);
}
