//! StudentIntro scenario
//!
//! Create, update and close the wallet's intro account in order, checking
//! the fetched state after each step. The first failure ends the run.

use crate::{client::StudentIntroClient, error::ClientError};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use student_intro_program::StudentIntro;
use std::fmt;
use thiserror::Error;

/// Name and message submitted by one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroFixture {
    pub name: String,
    pub message: String,
}

impl IntroFixture {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    fn of(intro: &StudentIntro) -> Self {
        Self::new(intro.name.clone(), intro.message.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub initial: IntroFixture,
    pub updated: IntroFixture,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            initial: IntroFixture::new("name", "message"),
            updated: IntroFixture::new("realloc", "realloc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStep {
    Create,
    Update,
    Close,
}

impl fmt::Display for ScenarioStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScenarioStep::Create => "create",
            ScenarioStep::Update => "update",
            ScenarioStep::Close => "close",
        })
    }
}

/// What a successful run observed
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub address: Pubkey,
    pub create_signature: Signature,
    pub update_signature: Signature,
    pub close_signature: Signature,
    /// Account size after create
    pub created_size: usize,
    /// Account size after update
    pub updated_size: usize,
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{step} failed: {source}")]
    Client {
        step: ScenarioStep,
        #[source]
        source: ClientError,
    },

    #[error("{step}: expected {expected:?}, fetched {actual:?}")]
    Mismatch {
        step: ScenarioStep,
        expected: IntroFixture,
        actual: IntroFixture,
    },

    #[error("{step}: intro belongs to {actual}, expected {expected}")]
    WrongStudent {
        step: ScenarioStep,
        expected: Pubkey,
        actual: Pubkey,
    },

    #[error("{step}: account holds {actual} bytes, expected {expected}")]
    SizeMismatch {
        step: ScenarioStep,
        expected: usize,
        actual: usize,
    },

    #[error("intro account {0} still holds data after close")]
    StillOpen(Pubkey),
}

impl ScenarioError {
    fn client(step: ScenarioStep) -> impl FnOnce(ClientError) -> Self {
        move |source| ScenarioError::Client { step, source }
    }
}

/// Run create, update and close against `client`'s wallet
pub async fn run_scenario(
    client: &StudentIntroClient,
    scenario: &Scenario,
) -> Result<ScenarioReport, ScenarioError> {
    let address = client.student_intro_address();
    tracing::info!("Student {} intro account {}", client.student(), address);

    let step = ScenarioStep::Create;
    let create_signature = client
        .add_student_intro(&scenario.initial.name, &scenario.initial.message)
        .await
        .map_err(ScenarioError::client(step))?;
    tracing::info!("{}: {}", step, create_signature);
    let created_size = verify(client, step, &scenario.initial).await?;

    let step = ScenarioStep::Update;
    let update_signature = client
        .update_student_intro(&scenario.updated.name, &scenario.updated.message)
        .await
        .map_err(ScenarioError::client(step))?;
    tracing::info!("{}: {}", step, update_signature);
    let updated_size = verify(client, step, &scenario.updated).await?;

    let step = ScenarioStep::Close;
    let close_signature = client
        .close_student_intro()
        .await
        .map_err(ScenarioError::client(step))?;
    tracing::info!("{}: {}", step, close_signature);

    match client.fetch_student_intro().await {
        Err(ClientError::AccountNotFound(_)) => {
            tracing::info!("{}: account {} is gone", step, address);
        }
        Ok(_) => return Err(ScenarioError::StillOpen(address)),
        Err(e) => return Err(ScenarioError::Client { step, source: e }),
    }

    Ok(ScenarioReport {
        address,
        create_signature,
        update_signature,
        close_signature,
        created_size,
        updated_size,
    })
}

/// Check the fetched intro against `expected`, returning the account size
async fn verify(
    client: &StudentIntroClient,
    step: ScenarioStep,
    expected: &IntroFixture,
) -> Result<usize, ScenarioError> {
    let address = client.student_intro_address();
    let not_found = || ScenarioError::Client {
        step,
        source: ClientError::AccountNotFound(address),
    };
    let account = client
        .fetch_account()
        .await
        .map_err(ScenarioError::client(step))?
        .ok_or_else(not_found)?;
    let intro = client
        .decode(&address, &account)
        .map_err(ScenarioError::client(step))?
        .ok_or_else(not_found)?;

    if intro.student != client.student() {
        return Err(ScenarioError::WrongStudent {
            step,
            expected: client.student(),
            actual: intro.student,
        });
    }

    let actual = IntroFixture::of(&intro);
    if &actual != expected {
        return Err(ScenarioError::Mismatch {
            step,
            expected: expected.clone(),
            actual,
        });
    }

    let expected_size = StudentIntro::space(&expected.name, &expected.message);
    if account.data.len() != expected_size {
        return Err(ScenarioError::SizeMismatch {
            step,
            expected: expected_size,
            actual: account.data.len(),
        });
    }

    tracing::info!(
        "{}: fetched name={:?} message={:?} ({} bytes)",
        step,
        intro.name,
        intro.message,
        account.data.len()
    );
    Ok(account.data.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fixtures() {
        let scenario = Scenario::default();
        assert_eq!(scenario.initial, IntroFixture::new("name", "message"));
        assert_eq!(scenario.updated, IntroFixture::new("realloc", "realloc"));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(ScenarioStep::Create.to_string(), "create");
        assert_eq!(ScenarioStep::Close.to_string(), "close");
    }

    #[test]
    fn test_scenario_from_json() {
        let scenario: Scenario = serde_json::from_str(
            r#"{"initial":{"name":"a","message":"b"},"updated":{"name":"c","message":"d"}}"#,
        )
        .unwrap();
        assert_eq!(scenario.updated.message, "d");
    }
}
