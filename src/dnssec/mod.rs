pub mod algorithm;
pub mod crypto;
pub mod delegation;
pub mod denial;
pub mod digest;
pub mod errors;
pub mod key_tag;
pub mod keyset;
pub mod outcome;
pub mod query;
pub mod rank;
pub mod review;
pub mod section;
pub mod signer;
pub mod validator;
pub mod verifier;
pub mod zone_cut;

pub use algorithm::DnsSecAlgorithm;
pub use crypto::RingVerifier;
pub use denial::NsecDenialChecker;
pub use digest::DigestType;
pub use errors::{DenialError, ValidationError};
pub use key_tag::calculate_key_tag;
pub use outcome::{Outcome, YieldReason};
pub use query::{Query, QueryFlags, QueryId, Request, ResolutionPlan};
pub use rank::{Rank, RankedEntry, RankedRRArray};
pub use validator::Validator;
pub use verifier::{
    DenialChecker, DnskeyTrust, RrsetVerdict, RrsetVerifier, ValidationContext, ValidationFlags,
};
pub use zone_cut::{CutArena, CutId, ZoneCut};

/// DNSSEC constants
pub mod constants {
    /// Default cap on NSEC3 iterations accepted in proofs
    pub const MAX_NSEC3_ITERATIONS: u16 = 150;
}
