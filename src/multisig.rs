//! Plain multisig baseline: a threshold certificate is a list of individual
//! ed25519 signatures checked one by one against the committee.

use crate::protocol::ScaleConfig;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use old_rand::rngs::OsRng;
use old_rand::{CryptoRng, RngCore};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyingShare(VerifyingKey);

pub struct KeypairShare {
    signing_key: SigningKey,
    pub verifying_share: VerifyingShare,
}

impl KeypairShare {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let signing_key = SigningKey::generate(rng);
        let verifying_share = VerifyingShare(signing_key.verifying_key());
        Self {
            signing_key,
            verifying_share,
        }
    }

    pub fn sign(&self, message: &[u8]) -> SignatureShare {
        SignatureShare {
            signer: self.verifying_share,
            signature: self.signing_key.sign(message),
        }
    }
}

impl Default for KeypairShare {
    fn default() -> Self {
        Self::generate(&mut OsRng)
    }
}

#[derive(Clone, Debug)]
pub struct SignatureShare {
    pub signer: VerifyingShare,
    pub signature: Signature,
}

#[derive(Clone, Debug, Default)]
pub struct Committee {
    members: BTreeMap<[u8; 32], VerifyingKey>,
}

impl Committee {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, share: VerifyingShare) {
        self.members.insert(share.0.to_bytes(), share.0);
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// True when at least `threshold` distinct committee members signed `message`.
    pub fn verify(&self, message: &[u8], certificate: &[SignatureShare], threshold: usize) -> bool {
        let mut signers = BTreeSet::new();
        for share in certificate {
            let id = share.signer.0.to_bytes();
            let Some(member) = self.members.get(&id) else {
                continue;
            };
            if signers.contains(&id) {
                continue;
            }
            if member.verify(message, &share.signature).is_ok() {
                signers.insert(id);
            }
        }
        signers.len() >= threshold
    }
}

/// Key material and committee for one scale.
pub struct MultisigPackage {
    pub participants: Vec<KeypairShare>,
    pub committee: Committee,
}

/// Initiation: key generation for every participant plus committee assembly.
pub fn setup<R: RngCore + CryptoRng>(scale: &ScaleConfig, rng: &mut R) -> MultisigPackage {
    let participants: Vec<KeypairShare> = (0..scale.system_size())
        .map(|_| KeypairShare::generate(&mut *rng))
        .collect();
    let mut committee = Committee::new();
    for participant in &participants {
        committee.add_key(participant.verifying_share);
    }
    MultisigPackage {
        participants,
        committee,
    }
}

/// Signatures of the first `threshold` participants.
pub fn certificate(package: &MultisigPackage, scale: &ScaleConfig, message: &[u8]) -> Vec<SignatureShare> {
    package
        .participants
        .iter()
        .take(scale.threshold() as usize)
        .map(|participant| participant.sign(message))
        .collect()
}
