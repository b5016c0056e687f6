//! Journey assembly: ranking, alerts and remarks.

use std::collections::HashSet;

use futures::future::join_all;

use crate::alerts::AlertsProvider;
use crate::domain::{Journey, Message, Route, ScanStats, TransferKind};

use super::policy::TransferTimePolicy;
use super::query::Query;
use super::rank::rank_routes;

/// Packages reconstructed routes into a journey.
pub struct JourneyAssembler<'a, A: ?Sized, P: ?Sized> {
    alerts: &'a A,
    policy: &'a P,
}

impl<'a, A, P> JourneyAssembler<'a, A, P>
where
    A: AlertsProvider + ?Sized,
    P: TransferTimePolicy + ?Sized,
{
    /// Create an assembler.
    pub fn new(alerts: &'a A, policy: &'a P) -> Self {
        Self { alerts, policy }
    }

    /// Rank and truncate `routes`, annotate each with alerts and remarks,
    /// and wrap them up with the query and scan counters.
    pub async fn assemble(&self, query: &Query, routes: Vec<Route>, stats: ScanStats) -> Journey {
        let mut ranked = rank_routes(routes, query.target);
        ranked.truncate(query.max_results);

        let mut annotated = Vec::with_capacity(ranked.len());
        for route in ranked {
            annotated.push(self.annotate(route).await);
        }

        Journey::new(
            query.origin.clone(),
            query.destination.clone(),
            query.target,
            annotated,
            stats,
        )
    }

    async fn annotate(&self, route: Route) -> Route {
        let trips = unique(route.legs().iter().map(|l| l.vehicle().trip.as_str()));
        let vehicles = unique(route.legs().iter().map(|l| l.vehicle().route.as_str()));

        let trip_alerts = self.collect(&trips).await;
        let vehicle_alerts = self.collect(&vehicles).await;
        let remarks = self.remarks(&route);

        route
            .with_alerts(trip_alerts, vehicle_alerts)
            .with_remarks(remarks)
    }

    async fn collect(&self, uris: &[&str]) -> Vec<Message> {
        let found = join_all(uris.iter().map(|uri| self.alerts.alerts_for(uri))).await;

        let mut seen = HashSet::new();
        found
            .into_iter()
            .flatten()
            .filter(|m| seen.insert(m.clone()))
            .collect()
    }

    fn remarks(&self, route: &Route) -> Vec<Message> {
        route
            .transfers()
            .iter()
            .filter(|t| t.kind() == TransferKind::Transfer)
            .filter_map(|t| {
                let minimum = self.policy.minimum_transfer_time(t.station());
                let effective = t.effective_transfer_time()?;
                t.is_at_risk(minimum).then(|| {
                    Message::new(
                        "Transfer at risk",
                        format!(
                            "Only {} min to change at {} (at least {} min needed)",
                            effective.num_minutes(),
                            t.station(),
                            minimum.num_minutes()
                        ),
                    )
                })
            })
            .collect()
    }
}

/// Distinct values in first-seen order.
fn unique<'s>(values: impl Iterator<Item = &'s str>) -> Vec<&'s str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
