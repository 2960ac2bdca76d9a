#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod constants;
pub mod contact;
pub mod error;
pub mod fixed_point;
pub mod ordering;
pub mod physics;
pub mod rng;
pub mod sim;
pub mod store;
pub mod tape;
pub mod types;
pub mod verify;

pub use config::SimConfig;
pub use error::{ConfigError, RuleCode, SimError, TapeError, VerifyError};
pub use sim::{Death, DeathCause, FrameReport, Simulation, WorldSnapshot};
pub use types::{ControlInput, FrameInput, OwnerId};
pub use verify::{verify_request, verify_tape, VerificationJournal, VerifyRequest};
