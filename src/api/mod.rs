//! Typed bindings for the backend's resource endpoints, grouped per
//! resource the way the server groups its routes. All calls go through
//! [`ApiClient`](crate::client::ApiClient) and inherit its refresh-and-retry
//! behavior.

pub mod charts;
pub mod dashboards;
pub mod datasets;
pub mod datasources;
pub mod users;
