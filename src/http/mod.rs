//! HTTP client construction and the reqwest-backed [`crate::script::HttpCapability`].
mod client;
mod execution;

#[cfg(test)]
mod tests;

pub use client::build_client;
pub use execution::ReqwestHttp;
