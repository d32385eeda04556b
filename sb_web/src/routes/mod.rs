//! ABOUTME: Route handler modules for the web API
//! ABOUTME: Proxy relay, screenshots, identity tracking and service metadata

pub mod identity;
pub mod meta;
pub mod proxy;
pub mod screenshot;
