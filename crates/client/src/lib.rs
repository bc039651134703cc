//! StudentIntro Client
//!
//! Typed access to the StudentIntro program on any cluster:
//! - `ClientConfig` naming the cluster, wallet and program
//! - `Cluster` backends for JSON-RPC and the in-process bank
//! - `StudentIntroClient` for create, update, close and fetch
//! - `run_scenario`, the create/update/close check

pub mod client;
pub mod cluster;
pub mod config;
pub mod error;
pub mod scenario;
pub mod wallet;

pub use client::StudentIntroClient;
pub use cluster::{Cluster, LocalCluster, RpcCluster};
pub use config::{ClientConfig, ClusterTarget, Commitment};
pub use error::ClientError;
pub use scenario::{run_scenario, IntroFixture, Scenario, ScenarioError, ScenarioReport, ScenarioStep};
