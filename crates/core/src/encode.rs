//! One-hot encoding and row emission
//!
//! A record expands into one `info` row followed by one row per canonical
//! state, start mode and status, always in table order.

use crate::enums::{Enumeration, StartMode, State, Status};
use crate::error::CollectResult;
use crate::models::{MetricKind, MetricRow, ServiceRecord};
use crate::sink::MetricSink;

/// Rows emitted for every service
pub const ROWS_PER_SERVICE: usize =
    1 + State::ALL.len() + StartMode::ALL.len() + Status::ALL.len();

/// Pair every canonical label of `E` with `1.0` if it is the current value
/// and `0.0` otherwise. `None` yields all zeros.
pub fn one_hot<E: Enumeration>(current: Option<E>) -> impl Iterator<Item = (&'static str, f64)> {
    E::ALL.iter().map(move |&value| {
        let indicator = if Some(value) == current { 1.0 } else { 0.0 };
        (value.label(), indicator)
    })
}

/// Expand a record into its rows
pub fn service_rows(record: &ServiceRecord) -> Vec<MetricRow> {
    let name = record.label_name();
    let mut rows = Vec::with_capacity(ROWS_PER_SERVICE);

    rows.push(MetricRow::new(
        MetricKind::Info,
        1.0,
        vec![
            name.clone(),
            record.display_name.clone(),
            record.process_id.to_string(),
            record.run_as.clone(),
        ],
    ));

    push_one_hot(&mut rows, MetricKind::State, &name, record.state);
    push_one_hot(&mut rows, MetricKind::StartMode, &name, record.start_mode);
    push_one_hot(&mut rows, MetricKind::Status, &name, record.status);

    rows
}

fn push_one_hot<E: Enumeration>(
    rows: &mut Vec<MetricRow>,
    kind: MetricKind,
    name: &str,
    current: Option<E>,
) {
    rows.extend(one_hot(current).map(|(label, value)| {
        MetricRow::new(kind, value, vec![name.to_string(), label.to_string()])
    }));
}

/// Send a record's rows to `sink`, returning how many were sent
pub fn emit_service(record: &ServiceRecord, sink: &mut dyn MetricSink) -> CollectResult<usize> {
    let rows = service_rows(record);
    let count = rows.len();
    for row in rows {
        sink.send(row)?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        name: &str,
        state: Option<State>,
        start_mode: Option<StartMode>,
        status: Option<Status>,
    ) -> ServiceRecord {
        ServiceRecord {
            name: name.to_string(),
            display_name: format!("{} display", name),
            process_id: 1234,
            run_as: "LocalSystem".to_string(),
            state,
            start_mode,
            status,
        }
    }

    fn rows_of(rows: &[MetricRow], kind: MetricKind) -> Vec<&MetricRow> {
        rows.iter().filter(|r| r.kind == kind).collect()
    }

    fn hot_count(rows: &[&MetricRow]) -> usize {
        rows.iter().filter(|r| r.value == 1.0).count()
    }

    #[test]
    fn test_one_hot_marks_current_value() {
        let pairs: Vec<_> = one_hot(Some(StartMode::Manual)).collect();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[3], ("manual", 1.0));
        assert_eq!(pairs.iter().filter(|(_, v)| *v == 1.0).count(), 1);
    }

    #[test]
    fn test_one_hot_none_is_all_zero() {
        assert!(one_hot::<Status>(None).all(|(_, v)| v == 0.0));
        assert_eq!(one_hot::<Status>(None).count(), 12);
    }

    #[test]
    fn test_row_count_per_service() {
        assert_eq!(ROWS_PER_SERVICE, 26);
        let rows = service_rows(&record(
            "Spooler",
            Some(State::Running),
            Some(StartMode::Auto),
            Some(Status::Ok),
        ));
        assert_eq!(rows.len(), 26);
        let rows = service_rows(&record("Spooler", None, None, None));
        assert_eq!(rows.len(), 26);
    }

    #[test]
    fn test_rows_are_ordered_by_kind() {
        let rows = service_rows(&record(
            "Spooler",
            Some(State::Paused),
            Some(StartMode::Boot),
            Some(Status::Ok),
        ));
        assert_eq!(rows[0].kind, MetricKind::Info);
        assert!(rows[1..9].iter().all(|r| r.kind == MetricKind::State));
        assert!(rows[9..14].iter().all(|r| r.kind == MetricKind::StartMode));
        assert!(rows[14..].iter().all(|r| r.kind == MetricKind::Status));
    }

    #[test]
    fn test_running_state_is_the_only_hot_state() {
        let rows = service_rows(&record("x", State::from_scm(4), Some(StartMode::Auto), None));
        let states = rows_of(&rows, MetricKind::State);
        assert_eq!(states.len(), 8);
        for row in &states {
            let expected = if row.label("state") == Some("running") { 1.0 } else { 0.0 };
            assert_eq!(row.value, expected, "state {:?}", row.label("state"));
        }
    }

    #[test]
    fn test_exactly_one_hot_state_and_start_mode() {
        for &state in State::ALL {
            for &mode in StartMode::ALL {
                let rows = service_rows(&record(
                    "svc",
                    Some(state),
                    Some(mode),
                    Some(Status::Degraded),
                ));
                assert_eq!(hot_count(&rows_of(&rows, MetricKind::State)), 1);
                assert_eq!(hot_count(&rows_of(&rows, MetricKind::StartMode)), 1);
                assert_eq!(hot_count(&rows_of(&rows, MetricKind::Status)), 1);
            }
        }
    }

    #[test]
    fn test_missing_status_and_start_mode_emit_zero_rows() {
        let rows = service_rows(&record("svc", Some(State::Stopped), None, None));
        let modes = rows_of(&rows, MetricKind::StartMode);
        let statuses = rows_of(&rows, MetricKind::Status);
        assert_eq!(modes.len(), 5);
        assert_eq!(statuses.len(), 12);
        assert_eq!(hot_count(&modes), 0);
        assert_eq!(hot_count(&statuses), 0);
    }

    #[test]
    fn test_unrecognized_state_emits_zero_rows() {
        let rows = service_rows(&record("svc", State::from_wmi("Hibernating"), None, None));
        let states = rows_of(&rows, MetricKind::State);
        assert_eq!(states.len(), 8);
        assert_eq!(hot_count(&states), 0);

        let rows = service_rows(&record("svc", State::from_scm(42), None, None));
        assert_eq!(hot_count(&rows_of(&rows, MetricKind::State)), 0);
    }

    #[test]
    fn test_name_is_lowercased_everywhere() {
        let rows = service_rows(&record(
            "WinRM",
            Some(State::Running),
            Some(StartMode::Auto),
            None,
        ));
        assert!(rows.iter().all(|r| r.label("name") == Some("winrm")));
    }

    #[test]
    fn test_info_row_labels() {
        let rows = service_rows(&record(
            "Spooler",
            Some(State::Running),
            Some(StartMode::Auto),
            None,
        ));
        let info = &rows[0];
        assert_eq!(info.value, 1.0);
        assert_eq!(info.label("display_name"), Some("Spooler display"));
        assert_eq!(info.label("process_id"), Some("1234"));
        assert_eq!(info.label("run_as"), Some("LocalSystem"));
    }

    #[test]
    fn test_emit_service_sends_every_row() {
        let mut sink: Vec<MetricRow> = Vec::new();
        let sent = emit_service(&record("a", Some(State::Running), None, None), &mut sink).unwrap();
        assert_eq!(sent, 26);
        assert_eq!(sink.len(), 26);
    }
}
