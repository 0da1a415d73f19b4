//! The recorded tally computation as a static, acyclic data-flow graph.
//!
//! A [`Circuit`] is the artifact handed to an external secure-computation compiler. It consists
//! of a party table, a list of [`Node`]s in topological order (every operand of a node is defined
//! before the node) and a list of [`Output`]s, each disclosed to exactly one party.
//!
//! Nodes only depend on their operands. Two comparisons over unrelated inputs share no path in the
//! graph, which [`Circuit::layers`] makes explicit so that a runtime can evaluate them in parallel.
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{
    bindings::{Disclosures, Secrets},
    error::{CircuitError, Error, EvalError},
};

/// Index of a node in [`Circuit::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The position of the node in the circuit.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// Index of a party in [`Circuit::parties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId(pub(crate) usize);

impl PartyId {
    /// The declaration index of the party.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party #{}", self.0)
    }
}

/// Handle to a secret unsigned integer in a circuit under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretUInt(pub(crate) NodeId);

/// Handle to a secret comparison result in a circuit under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBool(pub(crate) NodeId);

/// Handle to a declared output, the index in [`Circuit::outputs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputId(pub(crate) usize);

impl SecretUInt {
    /// The node producing this value.
    pub fn node(self) -> NodeId {
        self.0
    }
}

impl SecretBool {
    /// The node producing this value.
    pub fn node(self) -> NodeId {
        self.0
    }
}

impl OutputId {
    /// The position of the output in the circuit.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The kind of value a node produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// An unsigned integer.
    UInt,
    /// A boolean, only usable as the condition of a [`Node::Select`].
    Bool,
}

/// A single operation of the circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// A secret unsigned integer supplied by `party`.
    Input {
        /// Unique name used to route the value to its provider.
        name: String,
        /// The party supplying the value.
        party: PartyId,
    },
    /// A secret literal.
    Constant(u64),
    /// `a >= b`.
    GreaterOrEqual(NodeId, NodeId),
    /// `a <= b`.
    LessOrEqual(NodeId, NodeId),
    /// `if cond { if_true } else { if_false }`, evaluated obliviously.
    Select {
        /// A [`ValueKind::Bool`] node.
        cond: NodeId,
        /// Chosen if `cond` holds.
        if_true: NodeId,
        /// Chosen otherwise.
        if_false: NodeId,
    },
    /// `a + b` over unsigned integers.
    Add(NodeId, NodeId),
}

impl Node {
    /// The kind of value produced by this node.
    pub fn kind(&self) -> ValueKind {
        match self {
            Node::GreaterOrEqual(..) | Node::LessOrEqual(..) => ValueKind::Bool,
            Node::Input { .. } | Node::Constant(_) | Node::Select { .. } | Node::Add(..) => {
                ValueKind::UInt
            }
        }
    }

    /// The operands of this node together with the kind each one must have.
    pub fn operands(&self) -> Vec<(NodeId, ValueKind)> {
        match *self {
            Node::Input { .. } | Node::Constant(_) => vec![],
            Node::GreaterOrEqual(a, b) | Node::LessOrEqual(a, b) | Node::Add(a, b) => {
                vec![(a, ValueKind::UInt), (b, ValueKind::UInt)]
            }
            Node::Select {
                cond,
                if_true,
                if_false,
            } => vec![
                (cond, ValueKind::Bool),
                (if_true, ValueKind::UInt),
                (if_false, ValueKind::UInt),
            ],
        }
    }
}

/// A participant of the computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Unique name of the party.
    pub name: String,
}

/// A value opened in plaintext to exactly one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    /// Unique name of the output.
    pub name: String,
    /// The node whose value is disclosed.
    pub value: NodeId,
    /// The only party learning the value.
    pub recipient: PartyId,
}

/// Operation counts of a circuit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    /// Declared parties.
    pub parties: usize,
    /// Secret inputs.
    pub inputs: usize,
    /// Secret literals.
    pub constants: usize,
    /// `>=` and `<=` comparisons.
    pub comparisons: usize,
    /// Conditional selections.
    pub selects: usize,
    /// Additions.
    pub additions: usize,
    /// Disclosed outputs.
    pub outputs: usize,
}

/// A static data-flow graph over secret values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circuit {
    pub(crate) parties: Vec<Party>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) outputs: Vec<Output>,
}

impl Circuit {
    /// The declared parties, in declaration order.
    pub fn parties(&self) -> &[Party] {
        &self.parties
    }

    /// The nodes in topological order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The declared outputs.
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Returns the party with the given id, if it exists.
    pub fn party(&self, id: PartyId) -> Option<&Party> {
        self.parties.get(id.0)
    }

    /// Looks up a party by name.
    pub fn party_id(&self, name: &str) -> Option<PartyId> {
        self.parties
            .iter()
            .position(|p| p.name == name)
            .map(PartyId)
    }

    /// Iterates over the secret inputs as `(node, name, owning party)`.
    pub fn inputs(&self) -> impl Iterator<Item = (NodeId, &str, PartyId)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match node {
            Node::Input { name, party } => Some((NodeId(i), name.as_str(), *party)),
            _ => None,
        })
    }

    /// Counts the operations of the circuit.
    pub fn stats(&self) -> CircuitStats {
        let mut stats = CircuitStats {
            parties: self.parties.len(),
            outputs: self.outputs.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            match node {
                Node::Input { .. } => stats.inputs += 1,
                Node::Constant(_) => stats.constants += 1,
                Node::GreaterOrEqual(..) | Node::LessOrEqual(..) => stats.comparisons += 1,
                Node::Select { .. } => stats.selects += 1,
                Node::Add(..) => stats.additions += 1,
            }
        }
        stats
    }

    /// Checks that the circuit is well-formed.
    ///
    /// A well-formed circuit has unique party, input and output names, only refers to declared
    /// parties, only uses operands defined before the node using them and only uses operands of
    /// the kind an operation expects. Every output discloses an unsigned integer.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let mut party_names = HashSet::new();
        for party in &self.parties {
            if !party_names.insert(party.name.as_str()) {
                return Err(CircuitError::DuplicatePartyName(party.name.clone()));
            }
        }
        let mut input_names = HashSet::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId(i);
            if let Node::Input { name, party } = node {
                self.check_party(*party)?;
                if !input_names.insert(name.as_str()) {
                    return Err(CircuitError::DuplicateInputName(name.clone()));
                }
            }
            for (operand, expected) in node.operands() {
                if operand.0 >= i {
                    return Err(CircuitError::ForwardReference { node: id, operand });
                }
                check_kind(&self.nodes, id, operand, expected)?;
            }
        }
        let mut output_names = HashSet::new();
        for output in &self.outputs {
            self.check_party(output.recipient)?;
            let Some(node) = self.nodes.get(output.value.0) else {
                return Err(CircuitError::UnknownNode(output.value));
            };
            if node.kind() != ValueKind::UInt {
                return Err(CircuitError::KindMismatch {
                    node: output.value,
                    operand: output.value,
                    expected: ValueKind::UInt,
                    actual: node.kind(),
                });
            }
            if !output_names.insert(output.name.as_str()) {
                return Err(CircuitError::DuplicateOutputName(output.name.clone()));
            }
        }
        Ok(())
    }

    /// Checks that every output is disclosed to `recipient` and nobody else.
    pub fn validate_disclosure(&self, recipient: PartyId) -> Result<(), CircuitError> {
        let expected = self
            .party(recipient)
            .ok_or(CircuitError::UnknownParty(recipient))?;
        for output in &self.outputs {
            if output.recipient != recipient {
                let actual = self
                    .party(output.recipient)
                    .ok_or(CircuitError::UnknownParty(output.recipient))?;
                return Err(CircuitError::UnintendedRecipient {
                    output: output.name.clone(),
                    recipient: actual.name.clone(),
                    expected: expected.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Groups the nodes by their depth in the graph.
    ///
    /// Layer 0 contains inputs and constants, layer `d` contains every node whose deepest operand
    /// is in layer `d - 1`. Nodes of the same layer never depend on each other.
    pub fn layers(&self) -> Vec<Vec<NodeId>> {
        let mut depths: Vec<usize> = Vec::with_capacity(self.nodes.len());
        let mut layers: Vec<Vec<NodeId>> = vec![];
        for (i, node) in self.nodes.iter().enumerate() {
            let depth = node
                .operands()
                .iter()
                .map(|(operand, _)| depths.get(operand.0).map_or(0, |d| d + 1))
                .max()
                .unwrap_or(0);
            depths.push(depth);
            if layers.len() <= depth {
                layers.resize_with(depth + 1, Vec::new);
            }
            layers[depth].push(NodeId(i));
        }
        layers
    }

    /// Evaluates the circuit in plaintext.
    ///
    /// This is a reference evaluation used to check what a secure runtime must compute; it sees
    /// every input in the clear. The result contains, for every recipient, the outputs disclosed to
    /// it and nothing else.
    pub fn eval(&self, secrets: &Secrets) -> Result<Disclosures, EvalError> {
        self.validate()?;
        // comparison results are stored as 0 / 1, kinds are guaranteed by `validate`
        let mut values: Vec<u64> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = match node {
                Node::Input { name, .. } => secrets
                    .get(name)
                    .ok_or_else(|| EvalError::MissingInput(name.clone()))?,
                Node::Constant(c) => *c,
                Node::GreaterOrEqual(a, b) => (values[a.0] >= values[b.0]) as u64,
                Node::LessOrEqual(a, b) => (values[a.0] <= values[b.0]) as u64,
                Node::Select {
                    cond,
                    if_true,
                    if_false,
                } => {
                    if values[cond.0] != 0 {
                        values[if_true.0]
                    } else {
                        values[if_false.0]
                    }
                }
                Node::Add(a, b) => values[a.0]
                    .checked_add(values[b.0])
                    .ok_or(EvalError::Overflow)?,
            };
            values.push(value);
        }
        let mut disclosures = Disclosures::default();
        for output in &self.outputs {
            let recipient = &self.parties[output.recipient.0].name;
            disclosures.insert(recipient, &output.name, values[output.value.0]);
        }
        Ok(disclosures)
    }

    /// Serializes the circuit for handoff to an external compiler.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserializes and validates a circuit.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let circuit: Circuit = bincode::deserialize(bytes)?;
        circuit.validate()?;
        Ok(circuit)
    }

    /// Maps every party to the names of the outputs it receives.
    pub fn outputs_by_recipient(&self) -> HashMap<PartyId, Vec<&str>> {
        let mut by_recipient: HashMap<PartyId, Vec<&str>> = HashMap::new();
        for output in &self.outputs {
            by_recipient
                .entry(output.recipient)
                .or_default()
                .push(output.name.as_str());
        }
        by_recipient
    }

    fn check_party(&self, party: PartyId) -> Result<(), CircuitError> {
        if party.0 < self.parties.len() {
            Ok(())
        } else {
            Err(CircuitError::UnknownParty(party))
        }
    }
}

/// Checks that `operand` exists and produces a value of kind `expected`.
pub(crate) fn check_kind(
    nodes: &[Node],
    node: NodeId,
    operand: NodeId,
    expected: ValueKind,
) -> Result<(), CircuitError> {
    let Some(op) = nodes.get(operand.0) else {
        return Err(CircuitError::UnknownNode(operand));
    };
    let actual = op.kind();
    if actual != expected {
        return Err(CircuitError::KindMismatch {
            node,
            operand,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_party_circuit() -> Circuit {
        Circuit {
            parties: vec![
                Party {
                    name: "alice".into(),
                },
                Party { name: "bob".into() },
            ],
            nodes: vec![
                Node::Input {
                    name: "a".into(),
                    party: PartyId(0),
                },
                Node::Input {
                    name: "b".into(),
                    party: PartyId(1),
                },
                Node::GreaterOrEqual(NodeId(0), NodeId(1)),
                Node::Select {
                    cond: NodeId(2),
                    if_true: NodeId(0),
                    if_false: NodeId(1),
                },
            ],
            outputs: vec![Output {
                name: "max".into(),
                value: NodeId(3),
                recipient: PartyId(1),
            }],
        }
    }

    #[test]
    fn valid_circuit_evaluates_max() -> Result<(), EvalError> {
        let circuit = two_party_circuit();
        circuit.validate()?;
        let secrets = Secrets::new().with("a", 7).with("b", 3);
        let disclosures = circuit.eval(&secrets)?;
        assert_eq!(disclosures.get("bob", "max"), Some(7));
        assert_eq!(disclosures.for_party("alice"), None);
        Ok(())
    }

    #[test]
    fn forward_reference_is_rejected() {
        let mut circuit = two_party_circuit();
        circuit.nodes[2] = Node::GreaterOrEqual(NodeId(0), NodeId(3));
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::ForwardReference {
                node: NodeId(2),
                operand: NodeId(3)
            })
        );
    }

    #[test]
    fn comparison_result_cannot_be_summed() {
        let mut circuit = two_party_circuit();
        circuit.nodes.push(Node::Add(NodeId(0), NodeId(2)));
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::KindMismatch {
                operand: NodeId(2),
                expected: ValueKind::UInt,
                actual: ValueKind::Bool,
                ..
            })
        ));
    }

    #[test]
    fn comparison_result_cannot_be_disclosed() {
        let mut circuit = two_party_circuit();
        circuit.outputs[0].value = NodeId(2);
        assert!(matches!(
            circuit.validate(),
            Err(CircuitError::KindMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut circuit = two_party_circuit();
        circuit.parties[1].name = "alice".into();
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::DuplicatePartyName("alice".into()))
        );

        let mut circuit = two_party_circuit();
        circuit.nodes[1] = Node::Input {
            name: "a".into(),
            party: PartyId(1),
        };
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::DuplicateInputName("a".into()))
        );

        let mut circuit = two_party_circuit();
        circuit.outputs.push(circuit.outputs[0].clone());
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::DuplicateOutputName("max".into()))
        );
    }

    #[test]
    fn unknown_recipient_is_rejected() {
        let mut circuit = two_party_circuit();
        circuit.outputs[0].recipient = PartyId(2);
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::UnknownParty(PartyId(2)))
        );
    }

    #[test]
    fn disclosure_to_other_party_is_rejected() {
        let circuit = two_party_circuit();
        assert!(circuit.validate_disclosure(PartyId(1)).is_ok());
        assert_eq!(
            circuit.validate_disclosure(PartyId(0)),
            Err(CircuitError::UnintendedRecipient {
                output: "max".into(),
                recipient: "bob".into(),
                expected: "alice".into(),
            })
        );
    }

    #[test]
    fn layers_follow_dependency_depth() {
        let circuit = two_party_circuit();
        assert_eq!(
            circuit.layers(),
            vec![
                vec![NodeId(0), NodeId(1)],
                vec![NodeId(2)],
                vec![NodeId(3)]
            ]
        );
    }

    #[test]
    fn eval_reports_missing_input() {
        let circuit = two_party_circuit();
        let secrets = Secrets::new().with("a", 1);
        assert_eq!(
            circuit.eval(&secrets),
            Err(EvalError::MissingInput("b".into()))
        );
    }

    #[test]
    fn eval_reports_overflow() {
        let mut circuit = two_party_circuit();
        circuit.nodes.push(Node::Add(NodeId(0), NodeId(1)));
        let secrets = Secrets::new().with("a", u64::MAX).with("b", 1);
        assert_eq!(circuit.eval(&secrets), Err(EvalError::Overflow));
    }

    #[test]
    fn corrupted_bytes_are_rejected() -> Result<(), Error> {
        let mut circuit = two_party_circuit();
        let bytes = circuit.to_bytes()?;
        assert_eq!(Circuit::from_bytes(&bytes)?, circuit);

        circuit.nodes[3] = Node::Add(NodeId(0), NodeId(2));
        let bytes = circuit.to_bytes()?;
        assert!(matches!(
            Circuit::from_bytes(&bytes),
            Err(Error::Circuit(CircuitError::KindMismatch { .. }))
        ));
        assert!(matches!(
            Circuit::from_bytes(&bytes[..bytes.len() / 2]),
            Err(Error::Serde(_))
        ));
        Ok(())
    }
}
