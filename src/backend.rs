//! The boundary to the secure-computation runtime.
//!
//! Parties and secret values are opaque handles owned by a [`Backend`]. The tally is written once
//! against this trait and can then be recorded as a [`Circuit`](crate::circuit::Circuit) by
//! [`CircuitBuilder`](crate::builder::CircuitBuilder) or computed directly on plaintext values by
//! [`Cleartext`](crate::cleartext::Cleartext).
use std::fmt::Debug;

/// The primitives a secure-computation runtime offers to describe a computation.
///
/// Comparison results can only be consumed by [`Backend::select`]; there is no way to branch on
/// them in the host language, which keeps every description data-oblivious.
pub trait Backend {
    /// Identity of a participant.
    type Party: Clone + Debug;
    /// A secret unsigned integer.
    type UInt: Clone + Debug;
    /// A secret boolean.
    type Bool: Clone + Debug;
    /// Handle to a declared output.
    type Output: Debug;
    /// Errors that can occur while describing the computation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Declares a party with a unique name.
    fn declare_party(&mut self, name: &str) -> Result<Self::Party, Self::Error>;

    /// Declares a secret input with a unique name, supplied by `party`.
    fn declare_secret_input(
        &mut self,
        name: &str,
        party: &Self::Party,
    ) -> Result<Self::UInt, Self::Error>;

    /// `a >= b`
    fn greater_or_equal(
        &mut self,
        a: &Self::UInt,
        b: &Self::UInt,
    ) -> Result<Self::Bool, Self::Error>;

    /// `a <= b`
    fn less_or_equal(&mut self, a: &Self::UInt, b: &Self::UInt) -> Result<Self::Bool, Self::Error>;

    /// Obliviously selects `if_true` if `cond` holds, otherwise `if_false`.
    fn select(
        &mut self,
        cond: &Self::Bool,
        if_true: &Self::UInt,
        if_false: &Self::UInt,
    ) -> Result<Self::UInt, Self::Error>;

    /// `a + b`
    fn add(&mut self, a: &Self::UInt, b: &Self::UInt) -> Result<Self::UInt, Self::Error>;

    /// A secret literal.
    fn constant(&mut self, value: u64) -> Result<Self::UInt, Self::Error>;

    /// Discloses `value` in plaintext to `recipient` and nobody else.
    fn declare_output(
        &mut self,
        value: &Self::UInt,
        name: &str,
        recipient: &Self::Party,
    ) -> Result<Self::Output, Self::Error>;
}
