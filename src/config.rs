//! Configuration of a tally circuit instance.
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error};

/// Number of participants used when none is configured.
pub const DEFAULT_PARTICIPANTS: usize = 5;

/// Largest supported number of participants.
///
/// Counts never exceed the number of participants, so any counter type that holds this value
/// cannot overflow.
pub const MAX_PARTICIPANTS: usize = 1024;

/// Parameters of a tally circuit. A circuit is built for exactly one configuration; changing the
/// number of participants requires building a new circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TallyConfig {
    /// The number of participants, each contributing one secret value.
    pub participants: usize,
    /// The index of the only party learning the counts. Defaults to the last participant.
    pub output_party: Option<usize>,
    /// How parties, inputs and outputs are named.
    pub naming: Naming,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PARTICIPANTS)
    }
}

impl TallyConfig {
    /// A configuration for `participants` parties with default naming, disclosing to the last one.
    pub fn new(participants: usize) -> Self {
        Self {
            participants,
            output_party: None,
            naming: Naming::default(),
        }
    }

    /// Discloses the counts to the participant at `index` instead of the last one.
    pub fn with_output_party(mut self, index: usize) -> Self {
        self.output_party = Some(index);
        self
    }

    /// Parses and validates a JSON configuration. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: TallyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The index of the output party.
    pub fn output_party_index(&self) -> usize {
        self.output_party
            .unwrap_or(self.participants.saturating_sub(1))
    }

    /// Rejects configurations that would lead to a degenerate or unsafe circuit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants == 0 {
            return Err(ConfigError::NoParticipants);
        }
        if self.participants > MAX_PARTICIPANTS {
            return Err(ConfigError::TooManyParticipants {
                participants: self.participants,
                max: MAX_PARTICIPANTS,
            });
        }
        let index = self.output_party_index();
        if index >= self.participants {
            return Err(ConfigError::InvalidOutputParty {
                index,
                participants: self.participants,
            });
        }
        Ok(())
    }
}

/// Naming scheme for parties, inputs and outputs.
///
/// Every name is `prefix + index (+ suffix)`, so names of the same kind are distinct for distinct
/// indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Naming {
    /// Prefix of party names.
    pub party_prefix: String,
    /// Prefix of secret input names.
    pub input_prefix: String,
    /// Suffix of secret input names.
    pub input_suffix: String,
    /// Prefix of output names.
    pub output_prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            party_prefix: "Responder".into(),
            input_prefix: "r".into(),
            input_suffix: "_response".into(),
            output_prefix: "same_response_count_for_r".into(),
        }
    }
}

impl Naming {
    /// Name of participant `i`.
    pub fn party_name(&self, i: usize) -> String {
        format!("{}{i}", self.party_prefix)
    }

    /// Name of the secret input of participant `i`.
    pub fn input_name(&self, i: usize) -> String {
        format!("{}{i}{}", self.input_prefix, self.input_suffix)
    }

    /// Name of the count of participant `i`.
    pub fn output_name(&self, i: usize) -> String {
        format!("{}{i}", self.output_prefix)
    }
}
