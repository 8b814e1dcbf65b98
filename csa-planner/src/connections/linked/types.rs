//! JSON-LD page types as served by Linked Connections servers.
//!
//! Only the fields the planner reads are modelled; everything else in the
//! page (context, delays, routes, search templates) is ignored.

use serde::Deserialize;

/// One page of connections.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedConnectionsPage {
    /// URL of this page.
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    /// Page holding later departures.
    #[serde(rename = "hydra:next", default)]
    pub next: Option<String>,

    /// Page holding earlier departures.
    #[serde(rename = "hydra:previous", default)]
    pub previous: Option<String>,

    #[serde(rename = "@graph", default)]
    pub graph: Vec<LinkedConnection>,
}

/// A single connection node in the page graph.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedConnection {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@type", default)]
    pub kind: Option<String>,

    pub departure_stop: String,
    pub arrival_stop: String,
    pub departure_time: String,
    pub arrival_time: String,

    #[serde(rename = "gtfs:trip")]
    pub trip: String,
}
