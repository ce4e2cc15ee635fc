//! Expected light-curve outlines for plotting the selected event.

use serde::{Deserialize, Serialize};

use crate::core::{Event, EventKind, MINUTES_PER_DAY};

/// One outline vertex: Julian Date and relative flux change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub jd: f64,
    pub value: f64,
}

impl CurvePoint {
    fn new(jd: f64, value: f64) -> Self {
        Self { jd, value }
    }
}

/// Piecewise-linear outline of the expected brightness change.
///
/// Transits dip by the depth between ingress and egress, which are placed an
/// eighth of the duration in from each edge. Periodic maxima rise by the
/// amplitude over the O-C uncertainty around mid. All-night events have no
/// outline.
pub fn expected_outline(event: &Event) -> Vec<CurvePoint> {
    let start = event.start().value();
    let mid = event.mid().value();
    let end = event.end().value();

    match *event.kind() {
        EventKind::Transit { depth_ppt, .. } => {
            let edge = (end - start) / 8.0;
            vec![
                CurvePoint::new(start, 0.0),
                CurvePoint::new(start + edge, -depth_ppt),
                CurvePoint::new(mid, -depth_ppt),
                CurvePoint::new(end - edge, -depth_ppt),
                CurvePoint::new(end, 0.0),
            ]
        }
        EventKind::Periodic {
            oc_range_minutes,
            amplitude,
            ..
        } => {
            let drift = oc_range_minutes / MINUTES_PER_DAY / 2.0;
            vec![
                CurvePoint::new(start, 0.0),
                CurvePoint::new(mid - drift, amplitude),
                CurvePoint::new(mid + drift, amplitude),
                CurvePoint::new(end, 0.0),
            ]
        }
        EventKind::AllNight { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Coordinates;
    use crate::time::JulianDate;

    fn event(kind: EventKind) -> Event {
        Event::new(
            "HAT-P-32 b",
            Coordinates::new(2.07, 46.69).unwrap(),
            11.3,
            [
                JulianDate::new(2460000.0),
                JulianDate::new(2460000.05),
                JulianDate::new(2460000.1),
            ],
            kind,
        )
        .unwrap()
    }

    #[test]
    fn test_transit_outline() {
        let points = expected_outline(&event(EventKind::Transit {
            depth_ppt: 21.0,
            percent_transit: 100.0,
            percent_baseline: 100.0,
        }));
        assert_eq!(points.len(), 5);
        assert!((points[1].jd - 2460000.0125).abs() < 1e-7);
        assert!((points[3].jd - 2460000.0875).abs() < 1e-7);
        assert_eq!(points[0].value, 0.0);
        assert_eq!(points[2].value, -21.0);
        assert_eq!(points[4].value, 0.0);
    }

    #[test]
    fn test_periodic_outline() {
        let points = expected_outline(&event(EventKind::Periodic {
            epoch: 2459000.0,
            period: 0.4,
            oc_range_minutes: 14.4,
            amplitude: 0.8,
            phase: 0.0,
        }));
        assert_eq!(points.len(), 4);
        assert!((points[1].jd - 2460000.045).abs() < 1e-7);
        assert!((points[2].jd - 2460000.055).abs() < 1e-7);
        assert_eq!(points[1].value, 0.8);
    }

    #[test]
    fn test_all_night_has_no_outline() {
        assert!(expected_outline(&event(EventKind::AllNight { amplitude: 1.0 })).is_empty());
    }
}
