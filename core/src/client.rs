//! Endpoint methods for the WakaTime resource API.
//!
//! # Design
//! Each method builds a URL under `<base>/api/v1`, optionally a JSON body,
//! hands the request to the [`Dispatcher`], and decodes the response into an
//! order-preserving `serde_json::Value`. Credentials, retries, and status
//! handling all live in the dispatcher; nothing here inspects status codes.
//!
//! `user` arguments take a username or [`CURRENT_USER`].

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::{Auth, Credential};
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    CommitsQuery, DurationsQuery, ExternalDurationsQuery, InsightsQuery, LeadersQuery, NewDataDump,
    NewExternalDuration, NewHeartbeat, Query, StatsQuery, SummariesQuery,
};

/// Path alias for the authenticated user.
pub const CURRENT_USER: &str = "current";

#[derive(Debug)]
pub struct WakaTimeClient<C = Auth, T = UreqTransport> {
    api_url: String,
    dispatcher: Dispatcher<C, T>,
}

impl WakaTimeClient {
    /// A client using the default ureq transport.
    pub fn new(config: &ClientConfig, auth: impl Into<Auth>) -> Self {
        Self::with_transport(config, auth.into(), UreqTransport::new(config))
    }
}

impl<C: Credential, T: Transport> WakaTimeClient<C, T> {
    pub fn with_transport(config: &ClientConfig, credential: C, transport: T) -> Self {
        Self {
            api_url: config.api_url(),
            dispatcher: Dispatcher::new(credential, transport),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C, T> {
        &self.dispatcher
    }

    pub fn credential(&self) -> &C {
        self.dispatcher.credential()
    }

    /// Send an arbitrary request through the dispatcher.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.dispatcher.execute(request)
    }

    /// Total time logged since account creation, optionally for one project.
    pub fn all_time_since_today(&self, user: &str, project: Option<&str>) -> Result<Value, Error> {
        self.get(
            &["users", user, "all_time_since_today"],
            Query::new().opt("project", project),
        )
    }

    pub fn commit(&self, user: &str, project: &str, hash: &str, branch: Option<&str>) -> Result<Value, Error> {
        self.get(
            &["users", user, "projects", project, "commits", hash],
            Query::new().opt("branch", branch),
        )
    }

    pub fn commits(&self, user: &str, project: &str, query: &CommitsQuery) -> Result<Value, Error> {
        self.get(&["users", user, "projects", project, "commits"], query.into())
    }

    pub fn data_dumps(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "data_dumps"], Query::new())
    }

    /// Start a data export.
    pub fn create_data_dump(&self, user: &str, dump: &NewDataDump) -> Result<Value, Error> {
        self.post(&["users", user, "data_dumps"], dump)
    }

    /// A day of activity as durations. `date` is YYYY-MM-DD.
    pub fn durations(&self, user: &str, date: &str, query: &DurationsQuery) -> Result<Value, Error> {
        self.get(
            &["users", user, "durations"],
            with_leading("date", date, query.into()),
        )
    }

    pub fn editors(&self, unreleased: Option<bool>) -> Result<Value, Error> {
        self.get(&["editors"], Query::new().opt("unreleased", unreleased))
    }

    pub fn external_durations(
        &self,
        user: &str,
        date: &str,
        query: &ExternalDurationsQuery,
    ) -> Result<Value, Error> {
        self.get(
            &["users", user, "external_durations"],
            with_leading("date", date, query.into()),
        )
    }

    pub fn create_external_duration(&self, user: &str, duration: &NewExternalDuration) -> Result<Value, Error> {
        self.post(&["users", user, "external_durations"], duration)
    }

    pub fn create_external_durations_bulk(
        &self,
        user: &str,
        durations: &[NewExternalDuration],
    ) -> Result<Value, Error> {
        self.post(&["users", user, "external_durations.bulk"], durations)
    }

    pub fn goal(&self, user: &str, goal_id: &str) -> Result<Value, Error> {
        self.get(&["users", user, "goals", goal_id], Query::new())
    }

    pub fn goals(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "goals"], Query::new())
    }

    pub fn heartbeats(&self, user: &str, date: &str) -> Result<Value, Error> {
        self.get(&["users", user, "heartbeats"], Query::new().set("date", date))
    }

    pub fn create_heartbeat(&self, user: &str, heartbeat: &NewHeartbeat) -> Result<Value, Error> {
        self.post(&["users", user, "heartbeats"], heartbeat)
    }

    pub fn create_heartbeats_bulk(&self, user: &str, heartbeats: &[NewHeartbeat]) -> Result<Value, Error> {
        self.post(&["users", user, "heartbeats.bulk"], heartbeats)
    }

    /// `insight_type` is e.g. `weekday` or `best_day`; `range` e.g. `last_year`.
    pub fn insights(
        &self,
        user: &str,
        insight_type: &str,
        range: &str,
        query: &InsightsQuery,
    ) -> Result<Value, Error> {
        self.get(&["users", user, "insights", insight_type, range], query.into())
    }

    /// Public leaderboard.
    pub fn leaders(&self, query: &LeadersQuery) -> Result<Value, Error> {
        self.get(&["leaders"], query.into())
    }

    pub fn machine_names(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "machine_names"], Query::new())
    }

    pub fn meta(&self) -> Result<Value, Error> {
        self.get(&["meta"], Query::new())
    }

    pub fn org_dashboard_member_durations(
        &self,
        user: &str,
        org: &str,
        dashboard: &str,
        member: &str,
        date: &str,
        query: &DurationsQuery,
    ) -> Result<Value, Error> {
        self.get(
            &["users", user, "orgs", org, "dashboards", dashboard, "members", member, "durations"],
            with_leading("date", date, query.into()),
        )
    }

    pub fn org_dashboard_member_summaries(
        &self,
        user: &str,
        org: &str,
        dashboard: &str,
        member: &str,
        query: &SummariesQuery,
    ) -> Result<Value, Error> {
        self.get(
            &["users", user, "orgs", org, "dashboards", dashboard, "members", member, "summaries"],
            query.into(),
        )
    }

    pub fn org_dashboard_members(&self, user: &str, org: &str, dashboard: &str) -> Result<Value, Error> {
        self.get(
            &["users", user, "orgs", org, "dashboards", dashboard, "members"],
            Query::new(),
        )
    }

    pub fn org_dashboards(&self, user: &str, org: &str) -> Result<Value, Error> {
        self.get(&["users", user, "orgs", org, "dashboards"], Query::new())
    }

    pub fn orgs(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "orgs"], Query::new())
    }

    pub fn private_leaderboards(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "leaderboards"], Query::new())
    }

    pub fn private_leaderboard_leaders(
        &self,
        user: &str,
        board: &str,
        query: &LeadersQuery,
    ) -> Result<Value, Error> {
        self.get(&["users", user, "leaderboards", board], query.into())
    }

    pub fn program_languages(&self) -> Result<Value, Error> {
        self.get(&["program_languages"], Query::new())
    }

    /// Projects, optionally filtered by a search term.
    pub fn projects(&self, user: &str, search: Option<&str>) -> Result<Value, Error> {
        self.get(&["users", user, "projects"], Query::new().opt("q", search))
    }

    pub fn stats(&self, user: &str, query: &StatsQuery) -> Result<Value, Error> {
        let mut segments = vec!["users", user, "stats"];
        if let Some(range) = query.range.as_deref() {
            segments.push(range);
        }
        self.get(
            &segments,
            Query::new()
                .opt("timeout", query.timeout)
                .opt("writes_only", query.writes_only),
        )
    }

    /// Stats aggregated across all users.
    pub fn stats_aggregated(&self, range: Option<&str>) -> Result<Value, Error> {
        let mut segments = vec!["stats"];
        segments.extend(range);
        self.get(&segments, Query::new())
    }

    pub fn status_bar_today(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "status_bar", "today"], Query::new())
    }

    pub fn summaries(&self, user: &str, query: &SummariesQuery) -> Result<Value, Error> {
        self.get(&["users", user, "summaries"], query.into())
    }

    pub fn user_agents(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user, "user_agents"], Query::new())
    }

    pub fn user(&self, user: &str) -> Result<Value, Error> {
        self.get(&["users", user], Query::new())
    }

    fn get(&self, segments: &[&str], query: Query) -> Result<Value, Error> {
        let url = self.endpoint(segments, query)?;
        decode(self.dispatcher.execute(HttpRequest::get(url))?)
    }

    fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<Value, Error> {
        let url = self.endpoint(segments, Query::new())?;
        let body = serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))?;
        decode(self.dispatcher.execute(HttpRequest::post_json(url, body))?)
    }

    /// `api_url` plus percent-encoded path segments and query pairs.
    fn endpoint(&self, segments: &[&str], query: Query) -> Result<String, Error> {
        let mut url = Url::parse(&self.api_url).map_err(|e| Error::Config(format!("invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL cannot carry a path: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.0.is_empty() {
            url.query_pairs_mut().extend_pairs(query.0.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url.into())
    }
}

fn with_leading(key: &'static str, value: &str, rest: Query) -> Query {
    let mut query = Query::new().set(key, value);
    query.0.extend(rest.0);
    query
}

/// An empty body (e.g. a bare 202) decodes to `null`.
fn decode(response: HttpResponse) -> Result<Value, Error> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| Error::Decode(e.to_string()))
}
