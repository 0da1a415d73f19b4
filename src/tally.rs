//! The same-response tally.
//!
//! Each of `N` participants supplies one secret value. For every participant `i` the tally
//! computes `count[i] = Σ_j equal(response[i], response[j])` over all `j` in `0..N`, including
//! `j == i`: a participant's own response always matches itself, so every count is at least 1.
//! All `N` counts are disclosed to the output party only.
//!
//! The description is written once against [`Backend`] and can be recorded as a [`Circuit`]
//! ([`tally_circuit`]) or computed on plaintext values ([`tally_cleartext`]).
//!
//! Equality is derived from the two order comparisons `>=` and `<=` by nested selection, see
//! [`secret_equal`]. No comparison is skipped or shared: the `N × N` matrix is evaluated in full
//! (`2 N²` comparisons), which keeps the graph static and every comparison independent of the
//! others.
use tracing::{Level, debug, instrument};

use crate::{
    backend::Backend,
    bindings::Secrets,
    builder::CircuitBuilder,
    circuit::{Circuit, PartyId},
    cleartext::Cleartext,
    config::TallyConfig,
    error::{CircuitError, Error, EvalError},
};

/// Handles produced while describing a tally.
pub struct Tally<B: Backend> {
    /// The participants in declaration order.
    pub participants: Vec<B::Party>,
    /// The only party learning the counts.
    pub output_party: B::Party,
    /// `responses[i]` is the secret input of `participants[i]`.
    pub responses: Vec<B::UInt>,
    /// `counts[i]` is the number of participants whose response equals `responses[i]`.
    pub counts: Vec<B::UInt>,
    /// `outputs[i]` discloses `counts[i]` to the output party.
    pub outputs: Vec<B::Output>,
}

/// Declares the participants, named according to `config.naming`.
pub fn initialize_participants<B: Backend>(
    backend: &mut B,
    config: &TallyConfig,
) -> Result<Vec<B::Party>, B::Error> {
    (0..config.participants)
        .map(|i| backend.declare_party(&config.naming.party_name(i)))
        .collect()
}

/// Declares one secret input per participant, owned by that participant.
pub fn initialize_inputs<B: Backend>(
    backend: &mut B,
    config: &TallyConfig,
    participants: &[B::Party],
) -> Result<Vec<B::UInt>, B::Error> {
    participants
        .iter()
        .enumerate()
        .map(|(i, party)| backend.declare_secret_input(&config.naming.input_name(i), party))
        .collect()
}

/// Returns a secret `1` if `a == b` and a secret `0` otherwise.
///
/// Computed as `select(a >= b, select(a <= b, 1, 0), 0)`. Both comparisons are always part of the
/// description, `secret_equal(a, a)` is `1`.
pub fn secret_equal<B: Backend>(
    backend: &mut B,
    a: &B::UInt,
    b: &B::UInt,
) -> Result<B::UInt, B::Error> {
    let one = backend.constant(1)?;
    let zero = backend.constant(0)?;
    let le = backend.less_or_equal(a, b)?;
    let ge = backend.greater_or_equal(a, b)?;
    let le_bit = backend.select(&le, &one, &zero)?;
    backend.select(&ge, &le_bit, &zero)
}

/// Counts how many of `others` are equal to `response`.
///
/// The sum starts at a secret `0` and adds one equality bit per element of `others`, in iteration
/// order. Since addition is commutative and associative, the order does not affect the result.
pub fn count_matches<'a, B>(
    backend: &mut B,
    response: &B::UInt,
    others: impl IntoIterator<Item = &'a B::UInt>,
) -> Result<B::UInt, B::Error>
where
    B: Backend,
    B::UInt: 'a,
{
    let mut count = backend.constant(0)?;
    for other in others {
        let equal = secret_equal(backend, response, other)?;
        count = backend.add(&count, &equal)?;
    }
    Ok(count)
}

/// Reduces the all-pairs comparison matrix to one count per response.
pub fn tally_counts<B: Backend>(
    backend: &mut B,
    responses: &[B::UInt],
) -> Result<Vec<B::UInt>, B::Error> {
    let mut counts = Vec::with_capacity(responses.len());
    for response in responses {
        counts.push(count_matches(backend, response, responses)?);
    }
    Ok(counts)
}

/// Discloses every count to `output_party`, naming output `i` after participant `i`.
pub fn disclose_counts<B: Backend>(
    backend: &mut B,
    config: &TallyConfig,
    counts: &[B::UInt],
    output_party: &B::Party,
) -> Result<Vec<B::Output>, B::Error> {
    counts
        .iter()
        .enumerate()
        .map(|(i, count)| {
            backend.declare_output(count, &config.naming.output_name(i), output_party)
        })
        .collect()
}

/// Describes the complete tally for `config` on `backend`.
///
/// The configuration is validated before anything is declared.
pub fn build<B>(backend: &mut B, config: &TallyConfig) -> Result<Tally<B>, Error>
where
    B: Backend,
    B::Error: From<CircuitError> + Into<Error>,
{
    config.validate()?;
    describe(backend, config).map_err(Into::into)
}

fn describe<B>(backend: &mut B, config: &TallyConfig) -> Result<Tally<B>, B::Error>
where
    B: Backend,
    B::Error: From<CircuitError>,
{
    let participants = initialize_participants(backend, config)?;
    let responses = initialize_inputs(backend, config, &participants)?;
    let index = config.output_party_index();
    let output_party = participants
        .get(index)
        .cloned()
        .ok_or(CircuitError::UnknownParty(PartyId(index)))?;
    debug!(
        participants = participants.len(),
        "declared participants and inputs"
    );

    let counts = tally_counts(backend, &responses)?;
    debug!(counts = counts.len(), "reduced comparison matrix");

    let outputs = disclose_counts(backend, config, &counts, &output_party)?;
    debug!(output_party = index, "declared outputs");

    Ok(Tally {
        participants,
        output_party,
        responses,
        counts,
        outputs,
    })
}

/// Builds the tally circuit for `config`.
///
/// The returned circuit is validated and discloses all of its outputs to the output party.
#[instrument(level = Level::DEBUG, skip_all, err, fields(participants = config.participants))]
pub fn tally_circuit(config: &TallyConfig) -> Result<Circuit, Error> {
    let mut builder = CircuitBuilder::new();
    let tally = build(&mut builder, config)?;
    let circuit = builder.build()?;
    circuit.validate_disclosure(tally.output_party)?;
    Ok(circuit)
}

/// Maps `values[i]` to the input name of participant `i`.
pub fn secrets(config: &TallyConfig, values: &[u64]) -> Result<Secrets, Error> {
    if values.len() != config.participants {
        return Err(CircuitError::InputCountMismatch {
            participants: config.participants,
            inputs: values.len(),
        }
        .into());
    }
    Ok(values
        .iter()
        .enumerate()
        .map(|(i, value)| (config.naming.input_name(i), *value))
        .collect())
}

/// Computes the counts on plaintext `values`, `values[i]` being the response of participant `i`.
///
/// The counts are read back from what the output party received, after checking that nobody else
/// received anything.
#[instrument(level = Level::DEBUG, skip_all, err, fields(participants = config.participants))]
pub fn tally_cleartext(config: &TallyConfig, values: &[u64]) -> Result<Vec<u64>, Error> {
    config.validate()?;
    let mut backend = Cleartext::new(secrets(config, values)?);
    build(&mut backend, config)?;
    let disclosures = backend.into_disclosures();
    let output_party = config.naming.party_name(config.output_party_index());
    if let Some(recipient) = disclosures.recipients().find(|r| *r != output_party) {
        let output = disclosures
            .for_party(recipient)
            .and_then(|outputs| outputs.keys().next().cloned())
            .unwrap_or_default();
        return Err(CircuitError::UnintendedRecipient {
            output,
            recipient: recipient.to_string(),
            expected: output_party,
        }
        .into());
    }
    (0..config.participants)
        .map(|i| {
            let output = config.naming.output_name(i);
            disclosures
                .get(&output_party, &output)
                .ok_or_else(|| {
                    Error::from(EvalError::MissingOutput {
                        output,
                        recipient: output_party.clone(),
                    })
                })
        })
        .collect()
}
