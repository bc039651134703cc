//! StudentIntro client
//!
//! Builds, signs and submits StudentIntro instructions for one student
//! wallet and decodes the intro account it owns.

use crate::{
    cluster::{Cluster, LocalCluster, RpcCluster},
    config::{ClientConfig, ClusterTarget},
    error::ClientError,
    wallet,
};
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_program,
    transaction::Transaction,
};
use student_intro_program::{instruction, StudentIntro};
use std::sync::Arc;

pub struct StudentIntroClient {
    cluster: Arc<dyn Cluster>,
    payer: Keypair,
    program_id: Pubkey,
}

impl StudentIntroClient {
    pub fn new(cluster: Arc<dyn Cluster>, payer: Keypair, program_id: Pubkey) -> Self {
        Self {
            cluster,
            payer,
            program_id,
        }
    }

    /// Connect to the configured cluster with the configured wallet
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let payer = wallet::load_keypair(config.keypair_path.as_deref())?;

        let cluster: Arc<dyn Cluster> = match &config.cluster {
            ClusterTarget::Rpc(url) => Arc::new(RpcCluster::new(
                url,
                config.commitment,
                config.confirm_timeout,
                config.poll_interval,
            )?),
            ClusterTarget::Local => Arc::new(LocalCluster::new()),
        };

        tracing::info!(
            "Client for {} using program {}",
            payer.pubkey(),
            config.program_id
        );
        Ok(Self::new(cluster, payer, config.program_id))
    }

    /// The wallet signing for the student
    pub fn student(&self) -> Pubkey {
        self.payer.pubkey()
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn cluster(&self) -> &Arc<dyn Cluster> {
        &self.cluster
    }

    /// Address of the student's intro account
    pub fn student_intro_address(&self) -> Pubkey {
        StudentIntro::derive_pda(&self.student(), &self.program_id).0
    }

    pub async fn add_student_intro(
        &self,
        name: &str,
        message: &str,
    ) -> Result<Signature, ClientError> {
        let ix = instruction::add_student_intro(&self.program_id, &self.student(), name, message);
        self.send(ix).await
    }

    pub async fn update_student_intro(
        &self,
        name: &str,
        message: &str,
    ) -> Result<Signature, ClientError> {
        let ix =
            instruction::update_student_intro(&self.program_id, &self.student(), name, message);
        self.send(ix).await
    }

    pub async fn close_student_intro(&self) -> Result<Signature, ClientError> {
        let ix = instruction::close(&self.program_id, &self.student());
        self.send(ix).await
    }

    /// Raw intro account, `None` if it does not exist
    pub async fn fetch_account(&self) -> Result<Option<Account>, ClientError> {
        self.cluster.get_account(&self.student_intro_address()).await
    }

    /// Decoded intro, `None` if the account is absent or was closed
    pub async fn try_fetch_student_intro(&self) -> Result<Option<StudentIntro>, ClientError> {
        let address = self.student_intro_address();
        let Some(account) = self.cluster.get_account(&address).await? else {
            return Ok(None);
        };
        self.decode(&address, &account)
    }

    /// Decoded intro, `AccountNotFound` if there is none
    pub async fn fetch_student_intro(&self) -> Result<StudentIntro, ClientError> {
        let address = self.student_intro_address();
        self.try_fetch_student_intro()
            .await?
            .ok_or(ClientError::AccountNotFound(address))
    }

    /// Ask the cluster to fund the wallet
    pub async fn airdrop(&self, lamports: u64) -> Result<Signature, ClientError> {
        self.cluster.request_airdrop(&self.student(), lamports).await
    }

    /// Wallet balance in lamports
    pub async fn balance(&self) -> Result<u64, ClientError> {
        Ok(self
            .cluster
            .get_account(&self.student())
            .await?
            .map(|account| account.lamports)
            .unwrap_or(0))
    }

    pub(crate) fn decode(
        &self,
        address: &Pubkey,
        account: &Account,
    ) -> Result<Option<StudentIntro>, ClientError> {
        // A closed intro is an empty account handed back to the system program
        if account.owner == system_program::id() && account.data.is_empty() {
            return Ok(None);
        }
        if account.owner != self.program_id {
            return Err(ClientError::InvalidOwner {
                pubkey: *address,
                owner: account.owner,
            });
        }
        StudentIntro::unpack(&account.data)
            .map(Some)
            .map_err(|source| ClientError::InvalidAccountData {
                pubkey: *address,
                source,
            })
    }

    async fn send(&self, ix: Instruction) -> Result<Signature, ClientError> {
        let blockhash = self.cluster.latest_blockhash().await?;
        let message = Message::new(&[ix], Some(&self.student()));
        let tx = Transaction::new(&[&self.payer], message, blockhash);
        self.cluster.send_and_confirm(&tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use student_intro_program::StudentIntroError;

    fn local_client() -> StudentIntroClient {
        StudentIntroClient::new(
            Arc::new(LocalCluster::new()),
            Keypair::new(),
            student_intro_program::id(),
        )
    }

    #[test]
    fn test_address_is_stable() {
        let client = local_client();
        let (expected, _) = Pubkey::find_program_address(
            &[client.student().as_ref()],
            &student_intro_program::id(),
        );
        assert_eq!(client.student_intro_address(), expected);
        assert_eq!(client.student_intro_address(), client.student_intro_address());
    }

    #[tokio::test]
    async fn test_fetch_missing_intro() {
        let client = local_client();
        assert!(client.try_fetch_student_intro().await.unwrap().is_none());
        assert!(matches!(
            client.fetch_student_intro().await,
            Err(ClientError::AccountNotFound(address)) if address == client.student_intro_address()
        ));
    }

    #[tokio::test]
    async fn test_add_and_fetch() {
        let client = local_client();
        client.airdrop(1_000_000_000).await.unwrap();
        assert_eq!(client.balance().await.unwrap(), 1_000_000_000);

        client.add_student_intro("Ada", "hello").await.unwrap();
        let intro = client.fetch_student_intro().await.unwrap();
        assert_eq!(intro.student, client.student());
        assert_eq!(intro.name, "Ada");
        assert_eq!(intro.message, "hello");

        let err = client.add_student_intro("Ada", "again").await.unwrap_err();
        assert_eq!(
            err.program_error(&client.program_id()),
            Some(StudentIntroError::AccountAlreadyInitialized)
        );
    }

    #[test]
    fn test_decode_rejects_foreign_owner() {
        let client = local_client();
        let address = client.student_intro_address();
        let account = Account {
            lamports: 1,
            data: vec![0; 64],
            owner: Pubkey::new_unique(),
            executable: false,
            rent_epoch: 0,
        };
        assert!(matches!(
            client.decode(&address, &account),
            Err(ClientError::InvalidOwner { .. })
        ));
    }
}
