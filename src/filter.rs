//! Select the idle events that are active at the current playback time
use crate::dataset::IdleEventMap;
use crate::gps::Location;

/// Positions of the idle events whose window contains `time`, in dataset order.
///
/// `None` stands for a dataset that is still loading or failed to load and
/// yields no markers.
pub fn active_markers(events: Option<&IdleEventMap>, time: f64) -> Vec<Location> {
    match events {
        Some(events) => events
            .values()
            .filter(|e| e.window().contains(time))
            .map(|e| e.location())
            .collect(),
        None => Vec::new(),
    }
}

/// Keys of the idle events whose window contains `time`
pub fn active_event_ids(events: Option<&IdleEventMap>, time: f64) -> Vec<usize> {
    match events {
        Some(events) => events
            .iter()
            .filter(|(_, e)| e.window().contains(time))
            .map(|(&k, _)| k)
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{parse_idle_events, IdleEvent, TimeWindow};

    fn single(start: f64, end: f64) -> IdleEventMap {
        let mut events = IdleEventMap::new();
        events.insert(
            0,
            IdleEvent::new(
                Location::new(126.9, 37.5),
                TimeWindow::new(start, end).unwrap(),
            ),
        );
        events
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let events = single(600.0, 660.0);
        let eps = 1e-6;
        assert_eq!(active_markers(Some(&events), 600.0).len(), 1);
        assert_eq!(active_markers(Some(&events), 660.0).len(), 1);
        assert_eq!(active_markers(Some(&events), 630.0).len(), 1);
        assert!(active_markers(Some(&events), 600.0 - eps).is_empty());
        assert!(active_markers(Some(&events), 660.0 + eps).is_empty());
    }

    #[test]
    fn instant_only_matches_exactly() {
        let events = single(500.0, 500.0);
        assert_eq!(active_markers(Some(&events), 500.0).len(), 1);
        assert!(active_markers(Some(&events), 500.1).is_empty());
        assert!(active_markers(Some(&events), 499.9).is_empty());
    }

    #[test]
    fn missing_dataset_yields_no_markers() {
        assert!(active_markers(None, 600.0).is_empty());
        assert!(active_event_ids(None, 600.0).is_empty());
        assert!(active_markers(Some(&IdleEventMap::new()), 600.0).is_empty());
    }

    #[test]
    fn markers_follow_dataset_order() {
        let data = r#"[
            {"path": [1, 2], "timestamp": [10, 20]},
            {"path": [3, 4], "timestamp": [30]},
            {"path": [5, 6], "timestamp": [0, 100]}
        ]"#;
        let events = parse_idle_events(data).unwrap();

        assert_eq!(active_event_ids(Some(&events), 15.0), vec![0, 2]);
        assert_eq!(active_event_ids(Some(&events), 30.0), vec![1, 2]);
        assert_eq!(
            active_markers(Some(&events), 15.0),
            vec![Location::new(1.0, 2.0), Location::new(5.0, 6.0)]
        );
    }
}
