//! A [`Backend`] that computes directly on plaintext values.
//!
//! Nothing here is secret: all inputs are visible to the process running it. It serves as the
//! reference semantics of the primitives, e.g. to check a description against expected results
//! without recording and evaluating a circuit.
//!
//! Names are checked like [`CircuitBuilder`](crate::builder::CircuitBuilder) checks them: a party,
//! input or output declared twice is rejected, never overwritten.
use std::collections::HashSet;

use tracing::trace;

use crate::{
    backend::Backend,
    bindings::{Disclosures, Secrets},
    circuit::PartyId,
    error::{CircuitError, EvalError},
};

/// Computes backend calls on plaintext `u64` values.
#[derive(Debug, Default)]
pub struct Cleartext {
    secrets: Secrets,
    parties: Vec<String>,
    input_names: HashSet<String>,
    output_names: HashSet<String>,
    disclosures: Disclosures,
}

impl Cleartext {
    /// Creates a backend that reads its inputs from `secrets`.
    pub fn new(secrets: Secrets) -> Self {
        Self {
            secrets,
            ..Default::default()
        }
    }

    /// The values disclosed so far, by recipient.
    pub fn disclosures(&self) -> &Disclosures {
        &self.disclosures
    }

    /// Consumes the backend, returning the disclosed values.
    pub fn into_disclosures(self) -> Disclosures {
        self.disclosures
    }

    fn party_name(&self, party: PartyId) -> Result<&str, EvalError> {
        self.parties
            .get(party.0)
            .map(String::as_str)
            .ok_or(EvalError::UnknownParty(party))
    }
}

impl Backend for Cleartext {
    type Party = PartyId;
    type UInt = u64;
    type Bool = bool;
    type Output = ();
    type Error = EvalError;

    fn declare_party(&mut self, name: &str) -> Result<PartyId, EvalError> {
        if self.parties.iter().any(|p| p == name) {
            return Err(CircuitError::DuplicatePartyName(name.to_string()).into());
        }
        self.parties.push(name.to_string());
        Ok(PartyId(self.parties.len() - 1))
    }

    fn declare_secret_input(&mut self, name: &str, party: &PartyId) -> Result<u64, EvalError> {
        self.party_name(*party)?;
        if !self.input_names.insert(name.to_string()) {
            return Err(CircuitError::DuplicateInputName(name.to_string()).into());
        }
        self.secrets
            .get(name)
            .ok_or_else(|| EvalError::MissingInput(name.to_string()))
    }

    fn greater_or_equal(&mut self, a: &u64, b: &u64) -> Result<bool, EvalError> {
        Ok(a >= b)
    }

    fn less_or_equal(&mut self, a: &u64, b: &u64) -> Result<bool, EvalError> {
        Ok(a <= b)
    }

    fn select(&mut self, cond: &bool, if_true: &u64, if_false: &u64) -> Result<u64, EvalError> {
        Ok(if *cond { *if_true } else { *if_false })
    }

    fn add(&mut self, a: &u64, b: &u64) -> Result<u64, EvalError> {
        a.checked_add(*b).ok_or(EvalError::Overflow)
    }

    fn constant(&mut self, value: u64) -> Result<u64, EvalError> {
        Ok(value)
    }

    fn declare_output(
        &mut self,
        value: &u64,
        name: &str,
        recipient: &PartyId,
    ) -> Result<(), EvalError> {
        let recipient = self.party_name(*recipient)?.to_string();
        if !self.output_names.insert(name.to_string()) {
            return Err(CircuitError::DuplicateOutputName(name.to_string()).into());
        }
        trace!(output = name, recipient = recipient.as_str(), "disclosing output");
        self.disclosures.insert(&recipient, name, *value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_picks_branch_by_condition() -> Result<(), EvalError> {
        let mut c = Cleartext::default();
        let (one, zero) = (c.constant(1)?, c.constant(0)?);
        let t = c.less_or_equal(&2, &3)?;
        let f = c.greater_or_equal(&2, &3)?;
        assert_eq!(c.select(&t, &one, &zero)?, 1);
        assert_eq!(c.select(&f, &one, &zero)?, 0);
        Ok(())
    }

    #[test]
    fn missing_input_is_reported() -> Result<(), EvalError> {
        let mut c = Cleartext::new(Secrets::new().with("x", 1));
        let p = c.declare_party("p")?;
        assert_eq!(c.declare_secret_input("x", &p)?, 1);
        assert_eq!(
            c.declare_secret_input("y", &p),
            Err(EvalError::MissingInput("y".into()))
        );
        Ok(())
    }

    #[test]
    fn overflow_is_reported() {
        let mut c = Cleartext::default();
        assert_eq!(c.add(&u64::MAX, &1), Err(EvalError::Overflow));
    }

    #[test]
    fn outputs_reach_only_their_recipient() -> Result<(), EvalError> {
        let mut c = Cleartext::default();
        let alice = c.declare_party("alice")?;
        c.declare_party("bob")?;
        c.declare_output(&42, "answer", &alice)?;
        let disclosures = c.into_disclosures();
        assert_eq!(disclosures.get("alice", "answer"), Some(42));
        assert_eq!(disclosures.for_party("bob"), None);
        assert_eq!(
            Cleartext::default().declare_output(&1, "x", &PartyId(3)),
            Err(EvalError::UnknownParty(PartyId(3)))
        );
        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() -> Result<(), EvalError> {
        let mut c = Cleartext::new(Secrets::new().with("x", 1));
        let p = c.declare_party("p")?;
        assert_eq!(
            c.declare_party("p"),
            Err(EvalError::InvalidCircuit(CircuitError::DuplicatePartyName(
                "p".into()
            )))
        );
        c.declare_secret_input("x", &p)?;
        assert_eq!(
            c.declare_secret_input("x", &p),
            Err(EvalError::InvalidCircuit(CircuitError::DuplicateInputName(
                "x".into()
            )))
        );
        Ok(())
    }

    #[test]
    fn duplicate_output_keeps_first_value() -> Result<(), EvalError> {
        let mut c = Cleartext::default();
        let p = c.declare_party("p")?;
        c.declare_output(&1, "out", &p)?;
        assert_eq!(
            c.declare_output(&2, "out", &p),
            Err(EvalError::InvalidCircuit(CircuitError::DuplicateOutputName(
                "out".into()
            )))
        );
        assert_eq!(c.disclosures().get("p", "out"), Some(1));
        assert_eq!(c.disclosures().len(), 1);
        Ok(())
    }
}
