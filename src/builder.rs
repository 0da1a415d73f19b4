//! Records calls to the [`Backend`] primitives as a [`Circuit`].
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    backend::Backend,
    circuit::{
        Circuit, Node, NodeId, Output, OutputId, Party, PartyId, SecretBool, SecretUInt,
        ValueKind, check_kind,
    },
    error::CircuitError,
};

/// Builds a [`Circuit`] from backend calls.
///
/// Construction errors (duplicate names, unknown parties or handles) are reported by the call
/// that causes them. The first of them is kept and returned again by [`CircuitBuilder::build`],
/// which also validates the complete graph once more, so a builder never yields a partial or
/// inconsistent circuit.
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    circuit: Circuit,
    party_names: HashSet<String>,
    input_names: HashSet<String>,
    output_names: HashSet<String>,
    constants: HashMap<u64, NodeId>,
    error: Option<CircuitError>,
}

impl CircuitBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and returns the recorded circuit.
    ///
    /// Fails with the first error any call on this builder returned.
    pub fn build(self) -> Result<Circuit, CircuitError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.circuit.validate()?;
        debug!(stats = ?self.circuit.stats(), "built circuit");
        Ok(self.circuit)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.circuit.nodes.len());
        self.circuit.nodes.push(node);
        id
    }

    fn reject<T>(&mut self, error: CircuitError) -> Result<T, CircuitError> {
        self.error.get_or_insert_with(|| error.clone());
        Err(error)
    }

    fn operand(&mut self, operand: NodeId, expected: ValueKind) -> Result<NodeId, CircuitError> {
        let next = NodeId(self.circuit.nodes.len());
        match check_kind(&self.circuit.nodes, next, operand, expected) {
            Ok(()) => Ok(operand),
            Err(e) => self.reject(e),
        }
    }

    fn party(&mut self, party: PartyId) -> Result<PartyId, CircuitError> {
        if self.circuit.party(party).is_some() {
            Ok(party)
        } else {
            self.reject(CircuitError::UnknownParty(party))
        }
    }
}

impl Backend for CircuitBuilder {
    type Party = PartyId;
    type UInt = SecretUInt;
    type Bool = SecretBool;
    type Output = OutputId;
    type Error = CircuitError;

    fn declare_party(&mut self, name: &str) -> Result<PartyId, CircuitError> {
        if !self.party_names.insert(name.to_string()) {
            return self.reject(CircuitError::DuplicatePartyName(name.to_string()));
        }
        let id = PartyId(self.circuit.parties.len());
        self.circuit.parties.push(Party {
            name: name.to_string(),
        });
        Ok(id)
    }

    fn declare_secret_input(
        &mut self,
        name: &str,
        party: &PartyId,
    ) -> Result<SecretUInt, CircuitError> {
        let party = self.party(*party)?;
        if !self.input_names.insert(name.to_string()) {
            return self.reject(CircuitError::DuplicateInputName(name.to_string()));
        }
        Ok(SecretUInt(self.push(Node::Input {
            name: name.to_string(),
            party,
        })))
    }

    fn greater_or_equal(
        &mut self,
        a: &SecretUInt,
        b: &SecretUInt,
    ) -> Result<SecretBool, CircuitError> {
        let a = self.operand(a.0, ValueKind::UInt)?;
        let b = self.operand(b.0, ValueKind::UInt)?;
        Ok(SecretBool(self.push(Node::GreaterOrEqual(a, b))))
    }

    fn less_or_equal(&mut self, a: &SecretUInt, b: &SecretUInt) -> Result<SecretBool, CircuitError> {
        let a = self.operand(a.0, ValueKind::UInt)?;
        let b = self.operand(b.0, ValueKind::UInt)?;
        Ok(SecretBool(self.push(Node::LessOrEqual(a, b))))
    }

    fn select(
        &mut self,
        cond: &SecretBool,
        if_true: &SecretUInt,
        if_false: &SecretUInt,
    ) -> Result<SecretUInt, CircuitError> {
        let node = Node::Select {
            cond: self.operand(cond.0, ValueKind::Bool)?,
            if_true: self.operand(if_true.0, ValueKind::UInt)?,
            if_false: self.operand(if_false.0, ValueKind::UInt)?,
        };
        Ok(SecretUInt(self.push(node)))
    }

    fn add(&mut self, a: &SecretUInt, b: &SecretUInt) -> Result<SecretUInt, CircuitError> {
        let a = self.operand(a.0, ValueKind::UInt)?;
        let b = self.operand(b.0, ValueKind::UInt)?;
        Ok(SecretUInt(self.push(Node::Add(a, b))))
    }

    fn constant(&mut self, value: u64) -> Result<SecretUInt, CircuitError> {
        if let Some(id) = self.constants.get(&value) {
            return Ok(SecretUInt(*id));
        }
        let id = self.push(Node::Constant(value));
        self.constants.insert(value, id);
        Ok(SecretUInt(id))
    }

    fn declare_output(
        &mut self,
        value: &SecretUInt,
        name: &str,
        recipient: &PartyId,
    ) -> Result<OutputId, CircuitError> {
        let value = self.operand(value.0, ValueKind::UInt)?;
        let recipient = self.party(*recipient)?;
        if !self.output_names.insert(name.to_string()) {
            return self.reject(CircuitError::DuplicateOutputName(name.to_string()));
        }
        let id = OutputId(self.circuit.outputs.len());
        self.circuit.outputs.push(Output {
            name: name.to_string(),
            value,
            recipient,
        });
        Ok(id)
    }
}
