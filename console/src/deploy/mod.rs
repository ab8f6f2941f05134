//! Deployment orchestration
//!
//! [`driver::Driver`] walks one deployment through its phases and delegates
//! the build and release mechanics to a [`driver::DeployStrategy`]:
//! [`simulated::SimulatedStrategy`] narrates a local run on a fixed schedule,
//! [`provider::ProviderStrategy`] drives a real Vercel deployment.

pub mod driver;
pub mod fsm;
pub mod provider;
pub mod simulated;
pub mod trigger;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which strategy deploy requests run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Simulated,
    Vercel,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Simulated => "simulated",
            StrategyKind::Vercel => "vercel",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated" | "local" => Ok(StrategyKind::Simulated),
            "vercel" | "provider" => Ok(StrategyKind::Vercel),
            _ => Err(format!("Invalid deployment strategy: {}", s)),
        }
    }
}
