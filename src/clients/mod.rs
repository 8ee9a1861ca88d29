//! 远端 API 客户端层

pub mod backend;

pub use backend::{ApiClient, BackendApi, InterviewEndpoint, InterviewTurn};
