//! Cloudflare v4 API access

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod response;
pub mod user;

pub use client::{Client, RetryConfig};
pub use error::ApiError;
pub use response::{ApiResponse, ResponseInfo};
pub use user::{TokenStatus, UserDetails};
