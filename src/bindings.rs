//! Values and party bindings supplied alongside a circuit when it is executed.
//!
//! A secure-computation runtime needs three things besides the circuit itself: the secret values
//! of the inputs ([`Secrets`]), a mapping from the circuit's party names to the runtime's own
//! party identities ([`ProgramBindings`]) and, after the computation, a place to deliver the
//! disclosed values ([`Disclosures`]).
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{
    circuit::{Circuit, PartyId},
    error::BindingError,
};

/// Secret input values by input name.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secrets(BTreeMap<String, u64>);

impl Secrets {
    /// Creates an empty set of secrets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the value of an input, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: u64) -> Option<u64> {
        self.0.insert(name.into(), value)
    }

    /// Builder-style variant of [`Secrets::insert`].
    pub fn with(mut self, name: impl Into<String>, value: u64) -> Self {
        self.insert(name, value);
        self
    }

    /// The value of the named input.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    /// The number of supplied inputs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no inputs are supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Secrets {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // We don't want to potentially log the secret values
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "<REDACTED>")))
            .finish()
    }
}

/// Plaintext outputs as delivered to their recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosures(BTreeMap<String, BTreeMap<String, u64>>);

impl Disclosures {
    pub(crate) fn insert(&mut self, recipient: &str, output: &str, value: u64) {
        self.0
            .entry(recipient.to_string())
            .or_default()
            .insert(output.to_string(), value);
    }

    /// All outputs disclosed to `party`, by output name.
    pub fn for_party(&self, party: &str) -> Option<&BTreeMap<String, u64>> {
        self.0.get(party)
    }

    /// The value of `output` as disclosed to `party`.
    pub fn get(&self, party: &str, output: &str) -> Option<u64> {
        self.for_party(party)?.get(output).copied()
    }

    /// The names of all parties that received at least one output.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// The total number of disclosed values.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing was disclosed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Binds the parties of a circuit to the identities used by the executing runtime.
///
/// Input parties supply secret inputs, output parties receive disclosed outputs. A party can be
/// both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramBindings {
    input_parties: BTreeMap<String, String>,
    output_parties: BTreeMap<String, String>,
}

impl ProgramBindings {
    /// Creates empty bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the circuit party `name` as an input provider with the runtime id `party_id`.
    pub fn add_input_party(&mut self, name: impl Into<String>, party_id: impl Into<String>) {
        self.input_parties.insert(name.into(), party_id.into());
    }

    /// Binds the circuit party `name` as an output recipient with the runtime id `party_id`.
    pub fn add_output_party(&mut self, name: impl Into<String>, party_id: impl Into<String>) {
        self.output_parties.insert(name.into(), party_id.into());
    }

    /// The runtime id of the input party `name`.
    pub fn input_party(&self, name: &str) -> Option<&str> {
        self.input_parties.get(name).map(String::as_str)
    }

    /// The runtime id of the output party `name`.
    pub fn output_party(&self, name: &str) -> Option<&str> {
        self.output_parties.get(name).map(String::as_str)
    }

    /// Checks that the bindings cover exactly the roles the circuit assigns.
    ///
    /// Every party owning an input must be bound as an input party, every recipient of an output
    /// must be bound as an output party, and no party may be bound as an output party unless the
    /// circuit discloses something to it.
    pub fn validate(&self, circuit: &Circuit) -> Result<(), BindingError> {
        for name in self.input_parties.keys().chain(self.output_parties.keys()) {
            if circuit.party_id(name).is_none() {
                return Err(BindingError::UnknownParty(name.clone()));
            }
        }
        for (_, _, party) in circuit.inputs() {
            let name = party_name(circuit, party)?;
            if !self.input_parties.contains_key(name) {
                return Err(BindingError::UnboundInputParty(name.to_string()));
            }
        }
        let mut recipients = BTreeSet::new();
        for output in circuit.outputs() {
            let name = party_name(circuit, output.recipient)?;
            if !self.output_parties.contains_key(name) {
                return Err(BindingError::UnboundOutputParty(name.to_string()));
            }
            recipients.insert(name);
        }
        if let Some(name) = self
            .output_parties
            .keys()
            .find(|name| !recipients.contains(name.as_str()))
        {
            return Err(BindingError::UnexpectedOutputParty(name.clone()));
        }
        Ok(())
    }
}

fn party_name(circuit: &Circuit, party: PartyId) -> Result<&str, BindingError> {
    circuit
        .party(party)
        .map(|p| p.name.as_str())
        .ok_or_else(|| BindingError::UnknownParty(party.to_string()))
}

/// Derives a participant's secret value from an identifier.
///
/// Equal identifiers always map to equal values, so participants can compare identities without
/// revealing them. The value is the first 8 bytes (little endian) of the blake3 hash.
pub fn response_from_identifier(identifier: &str) -> u64 {
    let hash = blake3::hash(identifier.as_bytes());
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TallyConfig, tally::tally_circuit};

    fn bound(circuit: &Circuit) -> ProgramBindings {
        let mut bindings = ProgramBindings::new();
        for (i, party) in circuit.parties().iter().enumerate() {
            bindings.add_input_party(&party.name, format!("peer-{i}"));
        }
        bindings.add_output_party("Responder4", "peer-4");
        bindings
    }

    #[test]
    fn complete_bindings_are_accepted() -> Result<(), crate::Error> {
        let circuit = tally_circuit(&TallyConfig::default())?;
        let bindings = bound(&circuit);
        bindings.validate(&circuit)?;
        assert_eq!(bindings.output_party("Responder4"), Some("peer-4"));
        assert_eq!(bindings.input_party("Responder0"), Some("peer-0"));
        Ok(())
    }

    #[test]
    fn missing_input_party_is_rejected() -> Result<(), crate::Error> {
        let circuit = tally_circuit(&TallyConfig::default())?;
        let mut bindings = ProgramBindings::new();
        bindings.add_input_party("Responder0", "peer-0");
        bindings.add_output_party("Responder4", "peer-4");
        assert_eq!(
            bindings.validate(&circuit),
            Err(BindingError::UnboundInputParty("Responder1".into()))
        );
        Ok(())
    }

    #[test]
    fn output_to_non_recipient_is_rejected() -> Result<(), crate::Error> {
        let circuit = tally_circuit(&TallyConfig::default())?;
        let mut bindings = bound(&circuit);
        bindings.add_output_party("Responder0", "peer-0");
        assert_eq!(
            bindings.validate(&circuit),
            Err(BindingError::UnexpectedOutputParty("Responder0".into()))
        );
        Ok(())
    }

    #[test]
    fn missing_output_party_is_rejected() -> Result<(), crate::Error> {
        let circuit = tally_circuit(&TallyConfig::default())?;
        let mut bindings = ProgramBindings::new();
        for party in circuit.parties() {
            bindings.add_input_party(&party.name, "peer");
        }
        assert_eq!(
            bindings.validate(&circuit),
            Err(BindingError::UnboundOutputParty("Responder4".into()))
        );
        Ok(())
    }

    #[test]
    fn unknown_party_is_rejected() -> Result<(), crate::Error> {
        let circuit = tally_circuit(&TallyConfig::default())?;
        let mut bindings = bound(&circuit);
        bindings.add_input_party("Responder5", "peer-5");
        assert_eq!(
            bindings.validate(&circuit),
            Err(BindingError::UnknownParty("Responder5".into()))
        );
        Ok(())
    }

    #[test]
    fn identifiers_hash_deterministically() {
        assert_eq!(
            response_from_identifier("alice"),
            response_from_identifier("alice")
        );
        assert_ne!(
            response_from_identifier("alice"),
            response_from_identifier("bob")
        );
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let secrets = Secrets::new().with("r0_response", 1234567);
        let debug = format!("{secrets:?}");
        assert!(debug.contains("r0_response"));
        assert!(!debug.contains("1234567"));
    }
}
