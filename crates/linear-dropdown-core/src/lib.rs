//! Dropdown lookups against Linear for no-code automation builders.
//!
//! Each lookup is a hidden trigger: the host invokes it with a
//! [`host::RequestContext`] whenever a dropdown needs options, one page per call.

pub mod auth;
pub mod config;
pub mod graphql;
pub mod host;
pub mod services;
