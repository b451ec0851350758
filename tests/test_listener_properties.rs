//! Property-based tests using proptest
//!
//! These verify the listener's core guarantee — exactly one recording per
//! request — under arbitrary event orders and duplications, and the
//! total robustness of status-code classification.

use proptest::prelude::*;
use request_metrics::constants::metric;
use request_metrics::{
    EventKind, EventOutcome, LifecycleListener, MetricName, MetricRegistry, RequestId, SensorKind,
    StatusClass,
};
use std::collections::BTreeMap;
use std::time::Duration;

fn listener() -> LifecycleListener {
    let registry = MetricRegistry::new(Duration::from_secs(30), 6);
    LifecycleListener::new(registry, BTreeMap::new(), Duration::from_secs(300))
}

fn global_request_count(listener: &LifecycleListener) -> u64 {
    listener
        .registry()
        .sensor(MetricName::new(metric::REQUEST_RATE), SensorKind::Rate)
        .window_count()
}

fn any_event_kind() -> impl Strategy<Value = EventKind> {
    prop::sample::select(EventKind::ALL.to_vec())
}

/// Event kinds that can never finalize a context on their own
/// (Exception is only terminal when the outcome marks an abort)
fn non_terminal_kind() -> impl Strategy<Value = EventKind> {
    prop::sample::select(vec![
        EventKind::Start,
        EventKind::Matched,
        EventKind::Filtered,
        EventKind::MethodStart,
        EventKind::MethodFinished,
        EventKind::Exception,
        EventKind::ResponseFilterStart,
    ])
}

proptest! {
    #[test]
    fn prop_any_order_with_terminal_records_exactly_once(
        kinds in prop::collection::vec(any_event_kind(), 0..16),
        status in 0u16..1000,
    ) {
        let listener = listener();
        let id = RequestId::new(1);
        let outcome = EventOutcome::new().with_status(status);

        for kind in kinds {
            listener.on_event(id, kind, &outcome);
        }
        // Guarantee at least one terminal signal
        listener.on_event(id, EventKind::Finished, &outcome);

        prop_assert_eq!(global_request_count(&listener), 1);
    }

    #[test]
    fn prop_duplicated_terminals_still_record_once(
        kinds in prop::collection::vec(any_event_kind(), 0..8),
        terminals in 1usize..6,
    ) {
        let listener = listener();
        let id = RequestId::new(2);
        let outcome = EventOutcome::new().with_status(500).aborted();

        for kind in kinds {
            listener.on_event(id, kind, &outcome);
        }
        for _ in 0..terminals {
            listener.on_event(id, EventKind::Finished, &outcome);
            listener.on_event(id, EventKind::Exception, &outcome);
        }

        prop_assert_eq!(global_request_count(&listener), 1);
    }

    #[test]
    fn prop_without_terminal_nothing_is_recorded(
        kinds in prop::collection::vec(non_terminal_kind(), 0..16),
    ) {
        let listener = listener();
        let id = RequestId::new(3);
        // A non-aborted outcome keeps Exception recoverable
        let outcome = EventOutcome::new().with_status(200);

        for kind in kinds {
            listener.on_event(id, kind, &outcome);
        }

        prop_assert_eq!(global_request_count(&listener), 0);
    }

    #[test]
    fn prop_distinct_ids_record_independently(ids in prop::collection::hash_set(0u64..1000, 1..20)) {
        let listener = listener();
        let expected = ids.len() as u64;

        for id in ids {
            listener.on_event(
                RequestId::new(id),
                EventKind::Finished,
                &EventOutcome::new().with_status(200),
            );
        }

        prop_assert_eq!(global_request_count(&listener), expected);
    }

    #[test]
    fn prop_status_classification_is_total(code in any::<u16>()) {
        let class = StatusClass::from_code(code);
        prop_assert!(StatusClass::ALL.contains(&class));

        let expected = match code {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirection,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        };
        prop_assert_eq!(class, expected);
    }
}
