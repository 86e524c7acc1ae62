use crate::bridge::model::{
    LockResponse, OptimizeRequest, OptimizeResponse, RedistributeRequest, SaveScenarioRequest,
    SessionView, SpendRequest,
};
use crate::workflow::session::PlanningSession;
use anyhow::Context;
use budgetcore::model::Allocation;
use budgetcore::prelude::{Objective, PlanError, PlanResult};
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use tokio::signal;
use warp::{filters::BoxedFilter, http::StatusCode, reply::Response, Filter, Reply};

pub type SharedSession = Arc<RwLock<PlanningSession>>;

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

fn read(session: &SharedSession) -> RwLockReadGuard<'_, PlanningSession> {
    session.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(session: &SharedSession) -> RwLockWriteGuard<'_, PlanningSession> {
    session.write().unwrap_or_else(PoisonError::into_inner)
}

fn error_reply(err: &PlanError) -> Response {
    let status = match err {
        PlanError::ScenarioNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    warp::reply::with_status(warp::reply::json(&json!({ "error": err.to_string() })), status)
        .into_response()
}

fn respond<T: Serialize>(result: PlanResult<T>) -> Response {
    match result {
        Ok(value) => warp::reply::json(&value).into_response(),
        Err(err) => error_reply(&err),
    }
}

fn optimize_session(session: &SharedSession, request: OptimizeRequest) -> PlanResult<OptimizeResponse> {
    let objective: Objective = request.objective.parse()?;
    let mut guard = write(session);
    let total_budget = request.total_budget.unwrap_or_else(|| guard.total_budget());
    let result = guard.optimize(objective, total_budget)?;
    if request.apply {
        guard.apply(&result)?;
    }
    Ok(OptimizeResponse {
        objective,
        allocation: result.allocation,
        prediction: result.prediction,
        improvement_percent: result.improvement_percent,
        applied: request.apply,
    })
}

/// HTTP front for a planning session. Every handler works on the shared
/// session and answers with JSON; engine errors become 4xx replies.
pub struct PlannerBridge {
    session: SharedSession,
    optimize_delay: Duration,
}

impl PlannerBridge {
    pub fn new(session: PlanningSession, optimize_delay: Duration) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            optimize_delay,
        }
    }

    pub fn routes(&self) -> BoxedFilter<(Response,)> {
        let session = self.session.clone();
        let with_session = warp::any().map(move || session.clone());
        let delay = self.optimize_delay;

        let view_route = warp::path!("session")
            .and(warp::get())
            .and(with_session.clone())
            .map(|session: SharedSession| respond(SessionView::capture(&read(&session))));

        let evaluate_route = warp::path!("evaluate")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_session.clone())
            .map(|allocation: Allocation, session: SharedSession| {
                respond(read(&session).evaluate(&allocation))
            });

        let allocation_route = warp::path!("allocation")
            .and(warp::put())
            .and(warp::body::json())
            .and(with_session.clone())
            .map(|allocation: Allocation, session: SharedSession| {
                respond(write(&session).replace_allocation(allocation))
            });

        let spend_route = warp::path!("allocation" / String)
            .and(warp::put())
            .and(warp::body::json())
            .and(with_session.clone())
            .map(|id: String, request: SpendRequest, session: SharedSession| {
                respond(write(&session).set_spend(&id, request.spend))
            });

        let optimize_route = warp::path!("optimize")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_session.clone())
            .and_then(move |request: OptimizeRequest, session: SharedSession| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, warp::Rejection>(respond(optimize_session(&session, request)))
            });

        let redistribute_route = warp::path!("redistribute")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_session.clone())
            .map(|request: RedistributeRequest, session: SharedSession| {
                let mut guard = write(&session);
                let total_budget = request.total_budget.unwrap_or_else(|| guard.total_budget());
                respond(guard.redistribute(total_budget))
            });

        let lock_route = warp::path!("locks" / String)
            .and(warp::put())
            .and(with_session.clone())
            .map(|id: String, session: SharedSession| {
                let result = write(&session).lock(&id);
                respond(result.map(|changed| LockResponse {
                    id,
                    locked: true,
                    changed,
                }))
            });

        let unlock_route = warp::path!("locks" / String)
            .and(warp::delete())
            .and(with_session.clone())
            .map(|id: String, session: SharedSession| {
                let result = write(&session).unlock(&id);
                respond(result.map(|changed| LockResponse {
                    id,
                    locked: false,
                    changed,
                }))
            });

        let toggle_route = warp::path!("locks" / String / "toggle")
            .and(warp::post())
            .and(with_session.clone())
            .map(|id: String, session: SharedSession| {
                let result = write(&session).toggle_lock(&id);
                respond(result.map(|locked| LockResponse {
                    id,
                    locked,
                    changed: true,
                }))
            });

        let reset_route = warp::path!("reset")
            .and(warp::post())
            .and(with_session.clone())
            .map(|session: SharedSession| respond(write(&session).reset_to_baseline()));

        let save_scenario_route = warp::path!("scenarios")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_session.clone())
            .map(|request: SaveScenarioRequest, session: SharedSession| {
                respond(write(&session).save_scenario(&request.name))
            });

        let list_scenarios_route = warp::path!("scenarios")
            .and(warp::get())
            .and(with_session.clone())
            .map(|session: SharedSession| {
                respond(Ok::<_, PlanError>(read(&session).list_scenarios()))
            });

        let get_scenario_route = warp::path!("scenarios" / u64)
            .and(warp::get())
            .and(with_session.clone())
            .map(|id: u64, session: SharedSession| respond(read(&session).scenario(id)));

        let delete_scenario_route = warp::path!("scenarios" / u64)
            .and(warp::delete())
            .and(with_session.clone())
            .map(|id: u64, session: SharedSession| respond(write(&session).delete_scenario(id)));

        let load_scenario_route = warp::path!("scenarios" / u64 / "load")
            .and(warp::post())
            .and(with_session.clone())
            .map(|id: u64, session: SharedSession| respond(write(&session).load_scenario(id)));

        let compare_route = warp::path!("scenarios" / u64 / "compare" / u64)
            .and(warp::get())
            .and(with_session)
            .map(|left: u64, right: u64, session: SharedSession| {
                respond(read(&session).compare_scenarios(left, right))
            });

        view_route
            .or(evaluate_route)
            .unify()
            .or(allocation_route)
            .unify()
            .or(spend_route)
            .unify()
            .or(optimize_route)
            .unify()
            .or(redistribute_route)
            .unify()
            .or(lock_route)
            .unify()
            .or(unlock_route)
            .unify()
            .or(toggle_route)
            .unify()
            .or(reset_route)
            .unify()
            .or(save_scenario_route)
            .unify()
            .or(list_scenarios_route)
            .unify()
            .or(get_scenario_route)
            .unify()
            .or(delete_scenario_route)
            .unify()
            .or(load_scenario_route)
            .unify()
            .or(compare_route)
            .unify()
            .boxed()
    }

    /// Serves the routes until Ctrl+C.
    pub async fn serve_until_shutdown(&self, address: SocketAddr) -> anyhow::Result<()> {
        let (bound, server) = warp::serve(self.routes())
            .try_bind_with_graceful_shutdown(address, async {
                if let Err(err) = signal::ctrl_c().await {
                    warn!("awaiting Ctrl+C failed: {}", err);
                }
            })
            .with_context(|| format!("binding planner bridge to {address}"))?;
        self.publish_status(&format!("HTTP bridge listening on {bound} (Ctrl+C to stop)"));
        server.await;
        self.publish_status("HTTP bridge stopped");
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Allocation {
        read(&self.session).working().clone()
    }
}
