//! Route ranking.
//!
//! Ranks routes so that the most useful options come first.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::domain::{Route, TargetTime};

/// Rank routes by preference for the query's time constraint.
///
/// Depart-after queries rank by:
/// 1. Arrival time (earlier is better)
/// 2. Number of transfers (fewer is better)
/// 3. Total duration (shorter is better)
///
/// Arrive-before queries rank by latest departure first, then the same
/// tie-breakers.
///
/// The sort is stable: equally ranked routes keep their order.
pub fn rank_routes(mut routes: Vec<Route>, target: TargetTime) -> Vec<Route> {
    match target {
        TargetTime::DepartAfter(_) => routes.sort_by_key(|r| {
            (r.arrival_time(), r.transfer_count(), r.duration())
        }),
        TargetTime::ArriveBefore(_) => routes.sort_by_key(|r| {
            (Reverse(r.departure_time()), r.transfer_count(), r.duration())
        }),
    }

    routes
}

/// Drop routes that are effectively identical to an earlier one.
///
/// Two routes are duplicates if they depart at the same time, arrive at the
/// same time and have the same number of transfers. The first is kept and
/// order is otherwise preserved.
pub fn deduplicate(routes: Vec<Route>) -> Vec<Route> {
    let mut seen = HashSet::with_capacity(routes.len());
    routes
        .into_iter()
        .filter(|r| seen.insert((r.departure_time(), r.arrival_time(), r.transfer_count())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, RouteId, RouteLeg, StationId, TransitTime, TripId};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn time(s: &str) -> TransitTime {
        TransitTime::parse_hhmm(s, NaiveDate::from_ymd_opt(2018, 8, 9).unwrap()).unwrap()
    }

    fn leg(trip: &str, from: &str, to: &str, dep: &str, arr: &str) -> RouteLeg {
        let c = Connection::new(
            ConnectionId::parse(&format!("{trip}-{from}")).unwrap(),
            StationId::parse(from).unwrap(),
            StationId::parse(to).unwrap(),
            time(dep),
            time(arr),
            TripId::parse(trip).unwrap(),
            RouteId::parse("r").unwrap(),
        );
        RouteLeg::new(vec![Arc::new(c)], time("00:00")).unwrap()
    }

    fn route(legs: Vec<RouteLeg>) -> Route {
        Route::new(legs).unwrap()
    }

    #[test]
    fn rank_by_arrival() {
        let early = route(vec![leg("a", "A", "B", "10:00", "10:30")]);
        let late = route(vec![leg("b", "A", "B", "10:15", "10:40")]);

        let ranked = rank_routes(vec![late, early], TargetTime::DepartAfter(time("09:00")));

        assert_eq!(ranked[0].arrival_time(), time("10:30"));
        assert_eq!(ranked[1].arrival_time(), time("10:40"));
    }

    #[test]
    fn rank_by_transfers_when_same_arrival() {
        let direct = route(vec![leg("d", "A", "C", "10:00", "11:30")]);
        let change = route(vec![
            leg("c1", "A", "B", "10:00", "10:30"),
            leg("c2", "B", "C", "10:45", "11:30"),
        ]);

        let ranked = rank_routes(vec![change, direct], TargetTime::DepartAfter(time("09:00")));

        assert_eq!(ranked[0].transfer_count(), 0);
        assert_eq!(ranked[1].transfer_count(), 1);
    }

    #[test]
    fn arrive_before_prefers_latest_departure() {
        let early = route(vec![leg("a", "A", "B", "10:00", "10:30")]);
        let late = route(vec![leg("b", "A", "B", "10:15", "10:50")]);

        let ranked = rank_routes(vec![early, late], TargetTime::ArriveBefore(time("11:00")));

        assert_eq!(ranked[0].departure_time(), time("10:15"));
    }

    #[test]
    fn deduplicate_same_times() {
        let x = route(vec![leg("x", "A", "B", "10:00", "10:30")]);
        let y = route(vec![leg("y", "A", "B", "10:00", "10:30")]);

        let result = deduplicate(vec![x, y]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].legs()[0].vehicle().trip.as_str(), "x");
    }

    #[test]
    fn empty_input() {
        assert!(rank_routes(vec![], TargetTime::DepartAfter(time("09:00"))).is_empty());
        assert!(deduplicate(vec![]).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Connection, ConnectionId, RouteId, RouteLeg, StationId, TransitTime, TripId};
    use chrono::Duration;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn base() -> TransitTime {
        TransitTime::parse_rfc3339("2018-08-09T00:00:00Z").unwrap()
    }

    fn make_leg(trip: String, from: &str, to: &str, dep_mins: u16, duration_mins: u16) -> RouteLeg {
        let dep = base() + Duration::minutes(i64::from(dep_mins));
        let arr = dep + Duration::minutes(i64::from(duration_mins));
        let c = Connection::new(
            ConnectionId::parse(&format!("{trip}-{from}")).unwrap(),
            StationId::parse(from).unwrap(),
            StationId::parse(to).unwrap(),
            dep,
            arr,
            TripId::parse(&trip).unwrap(),
            RouteId::parse("r").unwrap(),
        );
        RouteLeg::new(vec![Arc::new(c)], base()).unwrap()
    }

    /// A direct route A -> C.
    fn make_direct(id: u32, dep_mins: u16, duration_mins: u16) -> Route {
        Route::new(vec![make_leg(format!("T{id}"), "A", "C", dep_mins, duration_mins)]).unwrap()
    }

    /// A -> B (change) B -> C
    fn make_two_leg(id: u32, dep_mins: u16, leg1: u16, wait: u16, leg2: u16) -> Route {
        Route::new(vec![
            make_leg(format!("T{id}a"), "A", "B", dep_mins, leg1),
            make_leg(format!("T{id}b"), "B", "C", dep_mins + leg1 + wait, leg2),
        ])
        .unwrap()
    }

    fn route_strategy() -> impl Strategy<Value = Route> {
        (0u32..1000, 0u16..1380, 10u16..120)
            .prop_map(|(id, dep, duration)| make_direct(id, dep, duration))
    }

    /// Bias controls the probability of a route with a transfer.
    fn route_with_transfers_strategy(transfer_bias: f64) -> impl Strategy<Value = Route> {
        prop::bool::weighted(transfer_bias).prop_flat_map(|has_transfer| {
            if has_transfer {
                (0u32..1000, 0u16..1200, 15u16..60, 5u16..30, 15u16..60)
                    .prop_map(|(id, dep, d1, wait, d2)| make_two_leg(id, dep, d1, wait, d2))
                    .boxed()
            } else {
                route_strategy().boxed()
            }
        })
    }

    fn routes_strategy() -> impl Strategy<Value = Vec<Route>> {
        (0.0f64..1.0).prop_flat_map(|transfer_bias| {
            prop::collection::vec(route_with_transfers_strategy(transfer_bias), 0..15)
        })
    }

    proptest! {
        #[test]
        fn depart_after_ranking_is_sorted(routes in routes_strategy()) {
            let ranked = rank_routes(routes, TargetTime::DepartAfter(base()));

            for window in ranked.windows(2) {
                let a = &window[0];
                let b = &window[1];

                let a_key = (a.arrival_time(), a.transfer_count(), a.duration());
                let b_key = (b.arrival_time(), b.transfer_count(), b.duration());

                prop_assert!(a_key <= b_key, "Not sorted: {:?} should come before {:?}", a_key, b_key);
            }
        }

        #[test]
        fn arrive_before_ranking_is_sorted(routes in routes_strategy()) {
            let ranked = rank_routes(routes, TargetTime::ArriveBefore(base()));

            for window in ranked.windows(2) {
                prop_assert!(window[0].departure_time() >= window[1].departure_time());
            }
        }

        #[test]
        fn ranking_preserves_elements(routes in routes_strategy()) {
            let original_len = routes.len();
            let ranked = rank_routes(routes, TargetTime::DepartAfter(base()));

            prop_assert_eq!(ranked.len(), original_len);
        }

        #[test]
        fn deduplicate_no_duplicate_keys(routes in routes_strategy()) {
            let result = deduplicate(routes);

            for (i, a) in result.iter().enumerate() {
                for (j, b) in result.iter().enumerate() {
                    if i != j {
                        let a_key = (a.departure_time(), a.arrival_time(), a.transfer_count());
                        let b_key = (b.departure_time(), b.arrival_time(), b.transfer_count());
                        prop_assert!(a_key != b_key, "Duplicate key at {} and {}: {:?}", i, j, a_key);
                    }
                }
            }
        }

        #[test]
        fn deduplicate_subset(routes in routes_strategy()) {
            let original_len = routes.len();
            let result = deduplicate(routes);

            prop_assert!(result.len() <= original_len);
        }
    }

    // Instrumented to make sure duplicates are actually generated
    #[test]
    fn deduplicate_distribution() {
        use proptest::test_runner::{Config, TestRunner};
        use std::cell::Cell;

        let mut runner = TestRunner::new(Config::with_cases(500));
        let duplicates_removed_count = Cell::new(0u32);
        let total_tests = Cell::new(0u32);

        // Few departure and duration slots make collisions likely
        let dup_strategy = prop::collection::vec((0u32..5, 0u16..4, 0u16..2), 2..10).prop_map(
            |params| {
                params
                    .into_iter()
                    .map(|(id, dep_slot, dur_slot)| {
                        make_direct(id, dep_slot * 60, dur_slot * 30 + 30)
                    })
                    .collect::<Vec<_>>()
            },
        );

        let _ = runner.run(&dup_strategy, |routes| {
            let original_len = routes.len();
            let result = deduplicate(routes);

            if result.len() < original_len {
                duplicates_removed_count.set(duplicates_removed_count.get() + 1);
            }
            total_tests.set(total_tests.get() + 1);
            Ok(())
        });

        assert!(
            duplicates_removed_count.get() > 0,
            "Never removed duplicates in {} tests (strategy may need tuning)",
            total_tests.get()
        );
    }
}
