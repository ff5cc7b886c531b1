//! Movement matcher: location updates against pending movement wait-tasks.
//!
//! Each update re-enumerates the reporter's suspended movement tasks from
//! the host (tasks are never stored here) and checks the coordinate against
//! each destination area in the host's enumeration order. The first
//! containing destination wins and its execution is scheduled for resume;
//! at most one task is resumed per update.

use std::sync::Arc;

use crate::dispatch::{ResumeDispatcher, ResumeRequest};
use crate::error::Result;
use crate::geofence::PlaceRegistry;
use crate::host::{ProcessEngine, WaitTaskFilter, WaitTaskKind};
use crate::types::{GeoPoint, MatchOutcome};

/// Matches location updates against the reporter's movement wait-tasks.
pub struct MovementMatcher {
    host: Arc<dyn ProcessEngine>,
    places: Arc<PlaceRegistry>,
    dispatcher: Arc<ResumeDispatcher>,
}

impl std::fmt::Debug for MovementMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovementMatcher").finish()
    }
}

impl MovementMatcher {
    /// Wires the matcher to the host, the place registry, and the resume
    /// dispatcher.
    pub fn new(
        host: Arc<dyn ProcessEngine>,
        places: Arc<PlaceRegistry>,
        dispatcher: Arc<ResumeDispatcher>,
    ) -> Self {
        Self {
            host,
            places,
            dispatcher,
        }
    }

    /// Checks one location update for the given user.
    ///
    /// Enumerates the user's suspended movement tasks (host authorization
    /// applied), optionally scoped to a business key. Destinations naming
    /// an unknown place never match. Misses are reported as outcomes, not
    /// errors; only a host query failure is an error.
    pub async fn check_update(
        &self,
        user_id: &str,
        point: GeoPoint,
        business_key: Option<&str>,
    ) -> Result<MatchOutcome> {
        let mut filter = WaitTaskFilter::for_user(user_id);
        if let Some(business_key) = business_key {
            filter = filter.with_business_key(business_key);
        }
        let tasks = self.host.query_active_wait_tasks(&filter).await?;

        let mut saw_movement_task = false;
        for task in tasks {
            let WaitTaskKind::Movement {
                destination_place_id,
            } = &task.kind
            else {
                continue;
            };
            saw_movement_task = true;
            if !self
                .places
                .contains_area(point.lat, point.lon, destination_place_id)
            {
                continue;
            }
            tracing::info!(
                user_id,
                place_id = %destination_place_id,
                process_instance_id = %task.process_instance_id,
                task_id = %task.task_id,
                "movement wait-task reached its destination"
            );
            let mut request = ResumeRequest::new(task.execution.clone());
            if let Some(business_key) = business_key {
                request = request.with_business_key(business_key);
            }
            self.dispatcher.resume_async(request);
            return Ok(MatchOutcome::EnteredArea {
                place_id: destination_place_id.clone(),
                process_instance_id: task.process_instance_id,
                task_id: task.task_id,
            });
        }

        Ok(if saw_movement_task {
            MatchOutcome::NotInTargetArea
        } else {
            MatchOutcome::NoActiveTasks
        })
    }
}
