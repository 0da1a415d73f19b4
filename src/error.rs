//! Errors raised while configuring, building, binding or evaluating a tally circuit.

use crate::circuit::{NodeId, PartyId, ValueKind};

/// The participant count or output party is unusable. Raised before any node is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A circuit for zero participants is degenerate.
    #[error("a tally needs at least one participant")]
    NoParticipants,
    /// The count could not be represented without risking counter overflow downstream.
    #[error("{participants} participants exceed the supported maximum of {max}")]
    TooManyParticipants {
        /// The requested number of participants.
        participants: usize,
        /// The largest supported number of participants.
        max: usize,
    },
    /// The output party index does not name one of the participants.
    #[error("output party {index} does not exist among {participants} participants")]
    InvalidOutputParty {
        /// The requested output party index.
        index: usize,
        /// The number of declared participants.
        participants: usize,
    },
}

/// The circuit graph is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CircuitError {
    /// Two parties were declared with the same name.
    #[error("party name {0:?} is declared twice")]
    DuplicatePartyName(String),
    /// Two secret inputs were declared with the same name.
    #[error("input name {0:?} is declared twice")]
    DuplicateInputName(String),
    /// Two outputs were declared with the same name.
    #[error("output name {0:?} is declared twice")]
    DuplicateOutputName(String),
    /// The party is not declared in this circuit.
    #[error("{0} is not declared in this circuit")]
    UnknownParty(PartyId),
    /// The node is not part of this circuit.
    #[error("{0} is not part of this circuit")]
    UnknownNode(NodeId),
    /// A node uses an operand that is defined after it.
    #[error("{node} refers to {operand}, which is not defined before it")]
    ForwardReference {
        /// The node using the operand.
        node: NodeId,
        /// The offending operand.
        operand: NodeId,
    },
    /// A node uses an operand of the wrong kind, e.g. a comparison result as a summand.
    #[error("{node} expects {operand} to be {expected:?}, but it is {actual:?}")]
    KindMismatch {
        /// The node using the operand.
        node: NodeId,
        /// The offending operand.
        operand: NodeId,
        /// The kind the node requires.
        expected: ValueKind,
        /// The kind the operand produces.
        actual: ValueKind,
    },
    /// An output is disclosed to a party other than the designated output party.
    #[error("output {output:?} is disclosed to {recipient:?} instead of {expected:?}")]
    UnintendedRecipient {
        /// The name of the output.
        output: String,
        /// The party the output is disclosed to.
        recipient: String,
        /// The designated output party.
        expected: String,
    },
    /// The supplied values do not pair up with the participants.
    #[error("{participants} participants but {inputs} secret inputs")]
    InputCountMismatch {
        /// The number of participants.
        participants: usize,
        /// The number of supplied values.
        inputs: usize,
    },
}

/// Errors of the plaintext reference evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// No value was supplied for the named input.
    #[error("no value supplied for input {0:?}")]
    MissingInput(String),
    /// An addition exceeded the range of the unsigned counter.
    #[error("unsigned counter overflow")]
    Overflow,
    /// The party was never declared.
    #[error("{0} is not declared")]
    UnknownParty(PartyId),
    /// An expected output was not disclosed to the party reading it.
    #[error("output {output:?} was not disclosed to {recipient:?}")]
    MissingOutput {
        /// The name of the output.
        output: String,
        /// The party expecting the output.
        recipient: String,
    },
    /// The circuit failed validation before it could be evaluated.
    #[error("invalid circuit: {0}")]
    InvalidCircuit(#[from] CircuitError),
}

/// Program bindings do not match the parties of a circuit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// A party owning a secret input has no external party id.
    #[error("input party {0:?} is not bound")]
    UnboundInputParty(String),
    /// A party receiving outputs has no external party id.
    #[error("output party {0:?} is not bound")]
    UnboundOutputParty(String),
    /// A bound party name does not exist in the circuit.
    #[error("party {0:?} does not exist in the circuit")]
    UnknownParty(String),
    /// A party is bound as an output party but the circuit discloses nothing to it.
    #[error("party {0:?} is bound as output party but receives no outputs")]
    UnexpectedOutputParty(String),
}

/// The error type of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`ConfigError`].
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// See [`CircuitError`].
    #[error("construction error: {0}")]
    Circuit(#[from] CircuitError),
    /// See [`EvalError`].
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    /// See [`BindingError`].
    #[error("binding error: {0}")]
    Binding(#[from] BindingError),
    /// The circuit could not be (de-)serialized.
    #[error("could not (de-)serialize circuit: {0}")]
    Serde(#[from] bincode::Error),
    /// A configuration document could not be parsed.
    #[error("could not parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}
