use arena_core::fixed_point::IVec2;
use arena_core::sim::replay;
use arena_core::tape::{parse_tape, serialize_tape, MAX_FRAMES_DEFAULT};
use arena_core::{verify_request, verify_tape, ControlInput, FrameInput, OwnerId, SimConfig, VerifyRequest};

fn recorded_session(frames: u32) -> Vec<FrameInput> {
    (0..frames)
        .map(|frame| {
            let mut input = FrameInput::default();
            if frame == 0 {
                input.connects = vec![OwnerId(17), OwnerId(3), OwnerId(250)];
            }
            if frame == frames / 2 {
                input.disconnects = vec![OwnerId(250)];
            }
            let x = 500 + (frame as i32 * 37) % 3_000;
            input
                .controls
                .insert(OwnerId(3), ControlInput::toward(IVec2::new(x, 2_000)));
            if frame % 90 < 20 {
                input.controls.insert(
                    OwnerId(17),
                    ControlInput::toward(IVec2::new(2_000, x)).boosting(),
                );
            }
            input
        })
        .collect()
}

fn record(config: &SimConfig, seed: u32, frames: &[FrameInput]) -> Vec<u8> {
    let result = replay(config, seed, frames).expect("valid config");
    serialize_tape(seed, frames, result.final_digest).expect("tape fits")
}

#[test]
fn recorded_tape_parses_back_to_the_same_inputs() {
    let config = SimConfig::default();
    let frames = recorded_session(500);
    let bytes = record(&config, 0xDEAD_BEEF, &frames);

    let tape = parse_tape(&bytes, MAX_FRAMES_DEFAULT).expect("tape should parse");
    assert_eq!(tape.header.seed, 0xDEAD_BEEF);
    assert_eq!(tape.header.frame_count, 500);
    assert_eq!(tape.frames, frames);
}

#[test]
fn verifies_recorded_session() {
    let config = SimConfig::default();
    let frames = recorded_session(500);
    let bytes = record(&config, 0xDEAD_BEEF, &frames);
    let expected = replay(&config, 0xDEAD_BEEF, &frames).expect("valid config");

    let journal = verify_tape(&config, &bytes, MAX_FRAMES_DEFAULT).expect("honest tape verifies");
    assert_eq!(journal.seed, 0xDEAD_BEEF);
    assert_eq!(journal.frame_count, 500);
    assert_eq!(journal.final_digest, expected.final_digest);
    assert_eq!(journal.final_rng_state, expected.final_rng_state);
    assert_eq!(journal.live_actors, expected.live_actors);
    assert!(journal.deaths >= 1, "the disconnect counts as a death");
}

#[test]
fn verify_request_survives_json_transport() {
    let config = SimConfig::without_food();
    let frames = recorded_session(120);
    let request = VerifyRequest {
        tape: record(&config, 99, &frames),
        config,
        max_frames: 0,
    };

    let json = serde_json::to_string(&request).expect("request serializes");
    let decoded: VerifyRequest = serde_json::from_str(&json).expect("request deserializes");
    let journal = verify_request(&decoded).expect("honest tape verifies");
    assert_eq!(journal.frame_count, 120);
}
