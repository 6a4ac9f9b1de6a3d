use crate::protocol::ScaleConfig;
use frost::keys::{KeyPackage, PublicKeyPackage};
use frost::round1::{SigningCommitments, SigningNonces};
use frost::round2::SignatureShare;
use frost_ed25519::{self as frost, Identifier, Signature, SigningPackage};
use old_rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("scale {0} exceeds the {max} participant limit", max = u16::MAX)]
    TooManyParticipants(ScaleConfig),

    #[error(transparent)]
    Frost(#[from] frost::Error),

    #[error("signature does not verify under the group key")]
    InvalidSignature,
}

/// Participant counts as FROST expects them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrostSettings {
    pub system_size: u16,
    pub threshold: u16,
}

impl TryFrom<ScaleConfig> for FrostSettings {
    type Error = WorkloadError;

    fn try_from(scale: ScaleConfig) -> Result<Self, Self::Error> {
        let narrow = |v: u32| u16::try_from(v).map_err(|_| WorkloadError::TooManyParticipants(scale));
        Ok(Self {
            system_size: narrow(scale.system_size())?,
            threshold: narrow(scale.threshold())?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct FrostPackage {
    pub(crate) secret: BTreeMap<Identifier, KeyPackage>,
    pub(crate) public: PublicKeyPackage,
}

impl FrostPackage {
    pub fn secret(&self) -> &BTreeMap<Identifier, KeyPackage> {
        &self.secret
    }
    pub fn public(&self) -> &PublicKeyPackage {
        &self.public
    }
}

pub struct FrostRound1 {
    pub(crate) nonces: BTreeMap<Identifier, SigningNonces>,
    pub(crate) commitments: BTreeMap<Identifier, SigningCommitments>,
}

impl FrostRound1 {
    pub fn nonces(&self) -> &BTreeMap<Identifier, SigningNonces> {
        &self.nonces
    }
    pub fn commitments(&self) -> &BTreeMap<Identifier, SigningCommitments> {
        &self.commitments
    }
}

pub struct FrostRound2 {
    pub(crate) signing_package: SigningPackage,
    pub(crate) signature_shares: BTreeMap<Identifier, SignatureShare>,
}

impl FrostRound2 {
    pub fn signing_package(&self) -> &SigningPackage {
        &self.signing_package
    }
    pub fn signature_shares(&self) -> &BTreeMap<Identifier, SignatureShare> {
        &self.signature_shares
    }
}

/// Initiation: trusted-dealer key generation for every participant.
pub fn setup<RNG>(settings: &FrostSettings, rng: &mut RNG) -> Result<FrostPackage, WorkloadError>
where
    RNG: RngCore + CryptoRng,
{
    let (shares, public) = frost::keys::generate_with_dealer(
        settings.system_size,
        settings.threshold,
        frost::keys::IdentifierList::Default,
        rng,
    )?;

    // Each participant verifies its share from the dealer.
    let mut secret = BTreeMap::new();
    for (identifier, share) in shares {
        secret.insert(identifier, KeyPackage::try_from(share)?);
    }

    Ok(FrostPackage { secret, public })
}

/// Round 1 for the first `threshold` participants.
pub fn vote_commitments<RNG>(
    settings: &FrostSettings,
    package: &FrostPackage,
    rng: &mut RNG,
) -> Result<FrostRound1, WorkloadError>
where
    RNG: RngCore + CryptoRng,
{
    let mut nonces = BTreeMap::new();
    let mut commitments = BTreeMap::new();

    for index in 1..=settings.threshold {
        let identifier = Identifier::try_from(index)?;
        let key_package = package
            .secret
            .get(&identifier)
            .ok_or(frost::Error::UnknownIdentifier)?;
        let (participant_nonces, participant_commitments) =
            frost::round1::commit(key_package.signing_share(), rng);
        nonces.insert(identifier, participant_nonces);
        commitments.insert(identifier, participant_commitments);
    }
    Ok(FrostRound1 { nonces, commitments })
}

/// Round 2: every committed participant produces its signature share.
pub fn sign_message(
    package: &FrostPackage,
    round1: &FrostRound1,
    message: &[u8],
) -> Result<FrostRound2, WorkloadError> {
    let signing_package = SigningPackage::new(round1.commitments.clone(), message);

    let mut signature_shares = BTreeMap::new();
    for (identifier, nonces) in &round1.nonces {
        let key_package = package
            .secret
            .get(identifier)
            .ok_or(frost::Error::UnknownIdentifier)?;
        let share = frost::round2::sign(&signing_package, nonces, key_package)?;
        signature_shares.insert(*identifier, share);
    }
    Ok(FrostRound2 {
        signing_package,
        signature_shares,
    })
}

/// Aggregation by the coordinator; also checks every share.
pub fn aggregate(package: &FrostPackage, round2: &FrostRound2) -> Result<Signature, WorkloadError> {
    Ok(frost::aggregate(
        &round2.signing_package,
        &round2.signature_shares,
        &package.public,
    )?)
}

pub fn verify(package: &FrostPackage, message: &[u8], signature: &Signature) -> Result<(), WorkloadError> {
    package
        .public
        .verifying_key()
        .verify(message, signature)
        .map_err(|_| WorkloadError::InvalidSignature)
}
