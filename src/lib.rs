//! Secure multi-party computation of a same-response tally.
//!
//! A fixed set of mutually distrusting participants each hold one secret value. Together they
//! compute, for every participant, how many participants hold a value equal to its own, without
//! revealing the values to each other. Only a designated output party learns the counts.
//!
//! This crate describes that computation as a static circuit. Executing it securely is the job of
//! an external secure-computation runtime, which consumes the circuit together with the
//! participants' inputs.
//!
//! ## Main Components
//!
//! * [`backend`]: The [`backend::Backend`] trait, the primitives a secure-computation runtime
//!   offers (party and input declaration, comparison, oblivious selection, addition, outputs).
//! * [`tally`]: The tally itself, written once against [`backend::Backend`].
//! * [`circuit`] and [`builder`]: The recorded graph and the backend that records it.
//! * [`cleartext`]: A plaintext backend defining the reference semantics.
//! * [`config`] and [`bindings`]: Circuit parameters, input values and party bindings.
//!
//! ## Example
//!
//! ```
//! use identicall::{TallyConfig, tally::{secrets, tally_circuit}};
//!
//! # fn main() -> Result<(), identicall::Error> {
//! let config = TallyConfig::default();
//! let circuit = tally_circuit(&config)?;
//!
//! // evaluate in the clear to see what the output party receives
//! let disclosures = circuit.eval(&secrets(&config, &[3, 7, 3, 3, 9])?)?;
//! assert_eq!(disclosures.get("Responder4", "same_response_count_for_r0"), Some(3));
//! assert_eq!(disclosures.recipients().count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! Every count is disclosed to the output party only; intermediate comparisons and sums are never
//! outputs. Participants are assumed to follow the protocol, the circuit does not detect cheating.
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod backend;
pub mod bindings;
pub mod builder;
pub mod circuit;
pub mod cleartext;
pub mod config;
pub mod error;
pub mod tally;

pub use config::TallyConfig;
pub use error::Error;
