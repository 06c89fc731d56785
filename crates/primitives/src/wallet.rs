//! Signing seam of the execution pipeline and a local mnemonic-based `Wallet`
use crate::UserOperationHash;
use async_trait::async_trait;
use ethers::{
    prelude::k256::ecdsa::SigningKey,
    signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
    types::{Address, Bytes},
};
use expanded_pathbuf::ExpandedPathBuf;

/// Produces the signature of a user operation hash
///
/// The returned bytes are attached to the user operation verbatim.
#[async_trait]
pub trait UserOperationSigner: Send + Sync {
    /// Address of the signing key (smart account owner)
    fn address(&self) -> Address;

    async fn sign_hash(&self, hash: &UserOperationHash) -> eyre::Result<Bytes>;
}

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Create a new wallet from the given file containing the mnemonic phrase
    ///
    /// # Arguments
    /// * `path` - The path to the file where the mnemonic phrase is stored
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_file(path: ExpandedPathBuf, chain_id: u64) -> eyre::Result<Self> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(path.to_path_buf())
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;

        Ok(Self { signer: signer.with_chain_id(chain_id) })
    }

    /// Create a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, chain_id: u64) -> eyre::Result<Self> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;

        Ok(Self { signer: signer.with_chain_id(chain_id) })
    }

    /// Create a new wallet from a hex encoded private key
    pub fn from_key(key: &str, chain_id: u64) -> eyre::Result<Self> {
        let signer: LocalWallet = key.trim_start_matches("0x").parse()?;
        Ok(Self { signer: signer.with_chain_id(chain_id) })
    }
}

#[async_trait]
impl UserOperationSigner for Wallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs the user operation hash as an EIP-191 personal message
    async fn sign_hash(&self, hash: &UserOperationHash) -> eyre::Result<Bytes> {
        let sig = self.signer.sign_message(hash.0.as_bytes()).await?;
        Ok(sig.to_vec().into())
    }
}
