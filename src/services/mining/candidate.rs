// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::domain::constants::{FIELD_ELEMENT_BODY_BYTES, PAYLOAD_BYTES};
use crate::domain::session::AcceptanceRule;
use alloy::eips::eip4844::env_settings::EnvKzgSettings;
use alloy::eips::eip4844::{
    BYTES_PER_BLOB, Blob, Bytes48, FIELD_ELEMENTS_PER_BLOB, kzg_to_versioned_hash,
};
use alloy::primitives::{B256, U256};
use rand::RngCore;

const FIELD_ELEMENT_BYTES: usize = 32;
const BODY_BYTES: usize = FIELD_ELEMENTS_PER_BLOB as usize * FIELD_ELEMENT_BODY_BYTES;

/// An accepted blob, ready for the transaction builder.
#[derive(Clone)]
pub struct Candidate {
    pub blob: Box<Blob>,
    pub commitment: Bytes48,
    pub versioned_hash: B256,
    pub acceptance: U256,
    pub worker_id: usize,
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("versioned_hash", &self.versioned_hash)
            .field("acceptance", &self.acceptance)
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

/// Packs a 126 KiB payload into a blob.
///
/// Element `i` carries `payload[31*i..31*i+31]` in bytes 1..32, and byte 0 holds one
/// nibble of the trailing 2048 bytes, so every element stays below the BLS12-381 modulus.
pub fn encode_payload(payload: &[u8]) -> Result<Box<Blob>, AppError> {
    if payload.len() != PAYLOAD_BYTES {
        return Err(AppError::Kzg(format!(
            "payload must be {PAYLOAD_BYTES} bytes, got {}",
            payload.len()
        )));
    }
    let (body, tail) = payload.split_at(BODY_BYTES);

    let mut bytes = vec![0u8; BYTES_PER_BLOB];
    for (i, element) in bytes.chunks_exact_mut(FIELD_ELEMENT_BYTES).enumerate() {
        let packed = tail[i / 2];
        element[0] = if i % 2 == 0 { packed >> 4 } else { packed & 0x0f };
        let start = i * FIELD_ELEMENT_BODY_BYTES;
        element[1..].copy_from_slice(&body[start..start + FIELD_ELEMENT_BODY_BYTES]);
    }

    Blob::try_from(bytes.as_slice())
        .map(Box::new)
        .map_err(|e| AppError::Kzg(format!("blob sizing: {e}")))
}

/// Inverse of [`encode_payload`].
pub fn decode_payload(blob: &Blob) -> Vec<u8> {
    let mut body = Vec::with_capacity(PAYLOAD_BYTES);
    let mut tail = vec![0u8; PAYLOAD_BYTES - BODY_BYTES];
    for (i, element) in blob.as_slice().chunks_exact(FIELD_ELEMENT_BYTES).enumerate() {
        body.extend_from_slice(&element[1..]);
        let nibble = element[0] & 0x0f;
        if i % 2 == 0 {
            tail[i / 2] |= nibble << 4;
        } else {
            tail[i / 2] |= nibble;
        }
    }
    body.extend_from_slice(&tail);
    body
}

/// Integer compared against the target.
pub fn acceptance_value(versioned_hash: &B256, rule: AcceptanceRule) -> U256 {
    match rule {
        AcceptanceRule::Truncate => U256::from_be_slice(&versioned_hash[1..]),
        AcceptanceRule::LegacyShift => {
            let mut shifted = versioned_hash.0;
            shifted.copy_within(1.., 0);
            U256::from_be_bytes(shifted)
        }
    }
}

pub fn accepts(value: U256, target: U256) -> bool {
    value < target
}

/// Stateless per-attempt miner shared by every worker thread.
pub struct CandidateMiner {
    kzg: EnvKzgSettings,
    rule: AcceptanceRule,
}

impl CandidateMiner {
    pub fn new(rule: AcceptanceRule) -> Self {
        Self {
            kzg: EnvKzgSettings::Default,
            rule,
        }
    }

    pub fn commit(&self, blob: &Blob) -> Result<Bytes48, AppError> {
        let kzg_blob = c_kzg::Blob::from_bytes(blob.as_slice())?;
        let commitment = self.kzg.get().blob_to_kzg_commitment(&kzg_blob)?;
        Ok(Bytes48::from(*commitment.to_bytes()))
    }

    /// Commitment proof for a blob whose commitment is already known.
    pub fn prove(&self, blob: &Blob, commitment: &Bytes48) -> Result<Bytes48, AppError> {
        let kzg_blob = c_kzg::Blob::from_bytes(blob.as_slice())?;
        let commitment = c_kzg::Bytes48::from_bytes(commitment.as_slice())?;
        let proof = self.kzg.get().compute_blob_kzg_proof(&kzg_blob, &commitment)?;
        Ok(Bytes48::from(*proof.to_bytes()))
    }

    /// Evaluates one already-encoded blob against `target`.
    pub fn evaluate(
        &self,
        blob: Box<Blob>,
        target: U256,
        worker_id: usize,
    ) -> Result<Option<Candidate>, AppError> {
        let commitment = self.commit(&blob)?;
        let versioned_hash = kzg_to_versioned_hash(commitment.as_slice());
        let acceptance = acceptance_value(&versioned_hash, self.rule);
        if !accepts(acceptance, target) {
            return Ok(None);
        }
        Ok(Some(Candidate {
            blob,
            commitment,
            versioned_hash,
            acceptance,
            worker_id,
        }))
    }

    /// One full attempt: fresh random payload, encode, commit, test.
    pub fn mine_once<R: RngCore>(
        &self,
        rng: &mut R,
        target: U256,
        worker_id: usize,
    ) -> Result<Option<Candidate>, AppError> {
        let mut payload = vec![0u8; PAYLOAD_BYTES];
        rng.fill_bytes(&mut payload);
        let blob = encode_payload(&payload)?;
        self.evaluate(blob, target, worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn random_payload(seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut payload = vec![0u8; PAYLOAD_BYTES];
        rng.fill_bytes(&mut payload);
        payload
    }

    #[test]
    fn encoding_is_invertible_and_field_aligned() {
        let payload = random_payload(7);
        let blob = encode_payload(&payload).expect("encode");
        assert_eq!(decode_payload(&blob), payload);
        assert!(
            blob.as_slice()
                .chunks_exact(FIELD_ELEMENT_BYTES)
                .all(|element| element[0] <= 0x0f)
        );
    }

    #[test]
    fn encoding_rejects_wrong_payload_size() {
        assert!(matches!(encode_payload(&[0u8; 10]), Err(AppError::Kzg(_))));
    }

    #[test]
    fn acceptance_is_strictly_less_than_target() {
        let target = U256::from(2u64);
        assert!(accepts(U256::from(1u64), target));
        assert!(!accepts(U256::from(2u64), target));
        assert!(!accepts(U256::from(3u64), target));
        assert!(!accepts(U256::ZERO, U256::ZERO));
    }

    #[test]
    fn truncate_drops_version_byte() {
        let hash = b256!("01000000000000000000000000000000000000000000000000000000000000ff");
        assert_eq!(
            acceptance_value(&hash, AcceptanceRule::Truncate),
            U256::from(0xffu64)
        );
    }

    #[test]
    fn legacy_shift_duplicates_last_byte() {
        let hash = b256!("01000000000000000000000000000000000000000000000000000000000000ff");
        assert_eq!(
            acceptance_value(&hash, AcceptanceRule::LegacyShift),
            U256::from(0xffffu64)
        );
    }

    #[test]
    fn mined_candidate_carries_v1_hash() {
        let miner = CandidateMiner::new(AcceptanceRule::Truncate);
        let mut rng = StdRng::seed_from_u64(11);
        let candidate = miner
            .mine_once(&mut rng, U256::MAX, 0)
            .expect("mine")
            .expect("MAX target accepts everything");
        assert_eq!(candidate.versioned_hash[0], 0x01);
        assert_eq!(
            candidate.acceptance,
            acceptance_value(&candidate.versioned_hash, AcceptanceRule::Truncate)
        );
        assert_eq!(
            kzg_to_versioned_hash(candidate.commitment.as_slice()),
            candidate.versioned_hash
        );

        let mut rng = StdRng::seed_from_u64(11);
        assert!(miner.mine_once(&mut rng, U256::ZERO, 0).expect("mine").is_none());
    }
}
