use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::VerifyError;
use crate::sim::{replay_strict, ReplayResult};
use crate::tape::{parse_tape, MAX_FRAMES_DEFAULT};
use crate::types::FrameInput;

/// Everything a verifier needs: the tape plus the config both sites ran.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub tape: Vec<u8>,
    #[serde(default)]
    pub config: SimConfig,
    /// 0 selects `MAX_FRAMES_DEFAULT`.
    #[serde(default)]
    pub max_frames: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationJournal {
    pub seed: u32,
    pub frame_count: u32,
    pub final_digest: u64,
    pub final_rng_state: u32,
    pub tape_checksum: u32,
    pub live_actors: u32,
    pub deaths: u32,
}

pub fn verify_request(request: &VerifyRequest) -> Result<VerificationJournal, VerifyError> {
    let max_frames = if request.max_frames == 0 {
        MAX_FRAMES_DEFAULT
    } else {
        request.max_frames
    };
    verify_tape(&request.config, &request.tape, max_frames)
}

pub fn verify_tape(
    config: &SimConfig,
    bytes: &[u8],
    max_frames: u32,
) -> Result<VerificationJournal, VerifyError> {
    verify_tape_with_replay(config, bytes, max_frames, replay_strict)
}

fn verify_tape_with_replay<F>(
    config: &SimConfig,
    bytes: &[u8],
    max_frames: u32,
    replay_fn: F,
) -> Result<VerificationJournal, VerifyError>
where
    F: FnOnce(&SimConfig, u32, &[FrameInput]) -> Result<ReplayResult, VerifyError>,
{
    let tape = parse_tape(bytes, max_frames)?;
    let result = replay_fn(config, tape.header.seed, &tape.frames)?;

    if result.final_digest != tape.footer.final_digest {
        return Err(VerifyError::DigestMismatch {
            claimed: tape.footer.final_digest,
            computed: result.final_digest,
        });
    }

    Ok(VerificationJournal {
        seed: tape.header.seed,
        frame_count: tape.header.frame_count,
        final_digest: result.final_digest,
        final_rng_state: result.final_rng_state,
        tape_checksum: tape.footer.checksum,
        live_actors: result.live_actors,
        deaths: result.deaths,
    })
}
