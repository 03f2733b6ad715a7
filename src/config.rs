//! Environment-driven configuration for both binaries.

use crate::ops::Op;
use std::net::SocketAddr;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

/// Simulated cost per operator, stamped onto tasks at planning time so
/// workers never need configuration access.
#[derive(Debug, Clone)]
pub struct OperationTimes {
    pub addition_ms: u64,
    pub subtraction_ms: u64,
    pub multiplication_ms: u64,
    pub division_ms: u64,
}

impl Default for OperationTimes {
    fn default() -> Self {
        Self {
            addition_ms: 1000,
            subtraction_ms: 1000,
            multiplication_ms: 1000,
            division_ms: 1000,
        }
    }
}

impl OperationTimes {
    pub fn from_env() -> Self {
        Self {
            addition_ms: env_or("TIME_ADDITION_MS", 1000),
            subtraction_ms: env_or("TIME_SUBTRACTION_MS", 1000),
            multiplication_ms: env_or("TIME_MULTIPLICATIONS_MS", 1000),
            division_ms: env_or("TIME_DIVISIONS_MS", 1000),
        }
    }

    pub fn for_op(&self, op: Op) -> u64 {
        match op {
            Op::Add => self.addition_ms,
            Op::Sub => self.subtraction_ms,
            Op::Mul => self.multiplication_ms,
            Op::Div => self.division_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub bind_addr: SocketAddr,
    pub queue_capacity: usize,
    pub operation_times: OperationTimes,
    /// In-process workers; 0 means all computation is done by remote agents.
    pub local_workers: usize,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env_or("PORT", 8080);
        let bind_addr = format!("{}:{}", host, port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)));

        Self {
            bind_addr,
            queue_capacity: env_or("QUEUE_CAPACITY", 100),
            operation_times: OperationTimes::from_env(),
            local_workers: env_or("LOCAL_WORKERS", 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub orchestrator_url: String,
    pub computing_power: usize,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            orchestrator_url: std::env::var("ORCHESTRATOR_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            computing_power: env_or("COMPUTING_POWER", 4),
        }
    }
}
