//! OAuth scopes understood by WakaTime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    ReadSummaries,
    ReadSummariesCategories,
    ReadSummariesDependencies,
    ReadSummariesEditors,
    ReadSummariesLanguages,
    ReadSummariesMachines,
    ReadSummariesOperatingSystems,
    ReadSummariesProjects,
    ReadStats,
    ReadStatsBestDay,
    ReadStatsCategories,
    ReadStatsDependencies,
    ReadStatsEditors,
    ReadStatsLanguages,
    ReadStatsMachines,
    ReadStatsOperatingSystems,
    ReadStatsProjects,
    ReadGoals,
    ReadOrgs,
    WriteOrgs,
    ReadPrivateLeaderboards,
    WritePrivateLeaderboards,
    ReadHeartbeats,
    WriteHeartbeats,
    Email,
}

impl Scope {
    pub const ALL: [Scope; 25] = [
        Scope::ReadSummaries,
        Scope::ReadSummariesCategories,
        Scope::ReadSummariesDependencies,
        Scope::ReadSummariesEditors,
        Scope::ReadSummariesLanguages,
        Scope::ReadSummariesMachines,
        Scope::ReadSummariesOperatingSystems,
        Scope::ReadSummariesProjects,
        Scope::ReadStats,
        Scope::ReadStatsBestDay,
        Scope::ReadStatsCategories,
        Scope::ReadStatsDependencies,
        Scope::ReadStatsEditors,
        Scope::ReadStatsLanguages,
        Scope::ReadStatsMachines,
        Scope::ReadStatsOperatingSystems,
        Scope::ReadStatsProjects,
        Scope::ReadGoals,
        Scope::ReadOrgs,
        Scope::WriteOrgs,
        Scope::ReadPrivateLeaderboards,
        Scope::WritePrivateLeaderboards,
        Scope::ReadHeartbeats,
        Scope::WriteHeartbeats,
        Scope::Email,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::ReadSummaries => "read_summaries",
            Scope::ReadSummariesCategories => "read_summaries.categories",
            Scope::ReadSummariesDependencies => "read_summaries.dependencies",
            Scope::ReadSummariesEditors => "read_summaries.editors",
            Scope::ReadSummariesLanguages => "read_summaries.languages",
            Scope::ReadSummariesMachines => "read_summaries.machines",
            Scope::ReadSummariesOperatingSystems => "read_summaries.operating_systems",
            Scope::ReadSummariesProjects => "read_summaries.projects",
            Scope::ReadStats => "read_stats",
            Scope::ReadStatsBestDay => "read_stats.best_day",
            Scope::ReadStatsCategories => "read_stats.categories",
            Scope::ReadStatsDependencies => "read_stats.dependencies",
            Scope::ReadStatsEditors => "read_stats.editors",
            Scope::ReadStatsLanguages => "read_stats.languages",
            Scope::ReadStatsMachines => "read_stats.machines",
            Scope::ReadStatsOperatingSystems => "read_stats.operating_systems",
            Scope::ReadStatsProjects => "read_stats.projects",
            Scope::ReadGoals => "read_goals",
            Scope::ReadOrgs => "read_orgs",
            Scope::WriteOrgs => "write_orgs",
            Scope::ReadPrivateLeaderboards => "read_private_leaderboards",
            Scope::WritePrivateLeaderboards => "write_private_leaderboards",
            Scope::ReadHeartbeats => "read_heartbeats",
            Scope::WriteHeartbeats => "write_heartbeats",
            Scope::Email => "email",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

impl TryFrom<String> for Scope {
    type Error = UnknownScope;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

/// Comma-joined, no spaces, order preserved.
pub fn scopes_to_string(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(|scope| scope.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Inverse of [`scopes_to_string`]. Empty segments are skipped.
pub fn parse_scopes(raw: &str) -> Result<Vec<Scope>, UnknownScope> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}
