//! Workspace-level end-to-end tests live in `http_flows.rs`.
