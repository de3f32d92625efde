//! Model identifiers and their wire names.
//!
//! [`EngineName`] is the closed set of models the API knows about. Chat
//! completions only accept a subset of them, expressed as [`ChatModel`].
//! Converting an engine that has no chat endpoint fails immediately with
//! [`ClientError::UnsupportedModel`], before any request is built.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::client::ClientError;

/// Every model identifier known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineName {
    // GPT-3
    Ada,
    Babbage,
    Curie,
    Davinci,
    TextAda001,
    TextBabbage001,
    TextCurie001,
    // GPT-3.5
    Gpt35Turbo,
    TextDavinci003,
    TextDavinci002,
    CodeDavinci002,
    // GPT-4
    Gpt4Turbo,
    Gpt4,
    Gpt4o,
    Gpt4oMini,
}

impl EngineName {
    pub const ALL: [EngineName; 15] = [
        EngineName::Ada,
        EngineName::Babbage,
        EngineName::Curie,
        EngineName::Davinci,
        EngineName::TextAda001,
        EngineName::TextBabbage001,
        EngineName::TextCurie001,
        EngineName::Gpt35Turbo,
        EngineName::TextDavinci003,
        EngineName::TextDavinci002,
        EngineName::CodeDavinci002,
        EngineName::Gpt4Turbo,
        EngineName::Gpt4,
        EngineName::Gpt4o,
        EngineName::Gpt4oMini,
    ];

    /// The exact name the API expects for this model.
    pub const fn as_str(self) -> &'static str {
        match self {
            EngineName::Ada => "ada",
            EngineName::Babbage => "babbage",
            EngineName::Curie => "curie",
            EngineName::Davinci => "davinci",
            EngineName::TextAda001 => "text-ada-001",
            EngineName::TextBabbage001 => "text-babbage-001",
            EngineName::TextCurie001 => "text-curie-001",
            EngineName::Gpt35Turbo => "gpt-3.5-turbo",
            EngineName::TextDavinci003 => "text-davinci-003",
            EngineName::TextDavinci002 => "text-davinci-002",
            EngineName::CodeDavinci002 => "code-davinci-002",
            EngineName::Gpt4Turbo => "gpt-4-turbo",
            EngineName::Gpt4 => "gpt-4",
            EngineName::Gpt4o => "gpt-4o",
            EngineName::Gpt4oMini => "gpt-4o-mini",
        }
    }

    /// Whether this engine can serve `/chat/completions`.
    pub fn supports_chat(self) -> bool {
        ChatModel::try_from(self).is_ok()
    }
}

impl fmt::Display for EngineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineName {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngineName::ALL
            .into_iter()
            .find(|engine| engine.as_str() == s)
            .ok_or_else(|| ClientError::UnsupportedModel(s.to_string()))
    }
}

impl Serialize for EngineName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Models accepted by the chat completions endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatModel {
    Gpt35Turbo,
    Gpt4Turbo,
    Gpt4,
    Gpt4o,
    Gpt4oMini,
}

impl ChatModel {
    pub const ALL: [ChatModel; 5] = [
        ChatModel::Gpt35Turbo,
        ChatModel::Gpt4Turbo,
        ChatModel::Gpt4,
        ChatModel::Gpt4o,
        ChatModel::Gpt4oMini,
    ];

    pub const fn engine(self) -> EngineName {
        match self {
            ChatModel::Gpt35Turbo => EngineName::Gpt35Turbo,
            ChatModel::Gpt4Turbo => EngineName::Gpt4Turbo,
            ChatModel::Gpt4 => EngineName::Gpt4,
            ChatModel::Gpt4o => EngineName::Gpt4o,
            ChatModel::Gpt4oMini => EngineName::Gpt4oMini,
        }
    }

    pub const fn as_str(self) -> &'static str {
        self.engine().as_str()
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<EngineName> for ChatModel {
    type Error = ClientError;

    fn try_from(engine: EngineName) -> Result<Self, Self::Error> {
        match engine {
            EngineName::Gpt35Turbo => Ok(ChatModel::Gpt35Turbo),
            EngineName::Gpt4Turbo => Ok(ChatModel::Gpt4Turbo),
            EngineName::Gpt4 => Ok(ChatModel::Gpt4),
            EngineName::Gpt4o => Ok(ChatModel::Gpt4o),
            EngineName::Gpt4oMini => Ok(ChatModel::Gpt4oMini),
            other => Err(ClientError::UnsupportedModel(format!(
                "{} is not a chat model",
                other
            ))),
        }
    }
}

impl From<ChatModel> for EngineName {
    fn from(model: ChatModel) -> Self {
        model.engine()
    }
}

impl Serialize for ChatModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_engine_has_a_wire_name() {
        for engine in EngineName::ALL {
            assert!(!engine.as_str().is_empty(), "{:?} has an empty name", engine);
            assert_eq!(engine.as_str(), engine.as_str());
        }
    }

    #[test]
    fn test_all_table_has_no_duplicates() {
        let unique: HashSet<_> = EngineName::ALL.iter().collect();
        assert_eq!(unique.len(), EngineName::ALL.len());
    }

    #[test]
    fn test_known_wire_names() {
        assert_eq!(EngineName::Gpt35Turbo.as_str(), "gpt-3.5-turbo");
        assert_eq!(EngineName::Gpt4Turbo.as_str(), "gpt-4-turbo");
        assert_eq!(EngineName::TextBabbage001.as_str(), "text-babbage-001");
        assert_eq!(EngineName::CodeDavinci002.to_string(), "code-davinci-002");
        assert_eq!(ChatModel::Gpt4oMini.as_str(), "gpt-4o-mini");
    }

    #[test]
    fn test_from_str_round_trips_every_engine() {
        for engine in EngineName::ALL {
            assert_eq!(engine.as_str().parse::<EngineName>().unwrap(), engine);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_name() {
        let err = "gpt-9".parse::<EngineName>().unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedModel(name) if name == "gpt-9"));
    }

    #[test]
    fn test_chat_models_map_to_engines() {
        for model in ChatModel::ALL {
            let engine = EngineName::from(model);
            assert_eq!(ChatModel::try_from(engine).unwrap(), model);
            assert_eq!(engine.as_str(), model.as_str());
        }
    }

    #[test]
    fn test_completion_engines_are_not_chat_models() {
        let err = ChatModel::try_from(EngineName::Davinci).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedModel(_)));
        assert!(!EngineName::TextAda001.supports_chat());
        assert!(EngineName::Gpt4.supports_chat());
    }

    #[test]
    fn test_serializes_as_wire_name() {
        assert_eq!(
            serde_json::to_string(&EngineName::Gpt4o).unwrap(),
            "\"gpt-4o\""
        );
        assert_eq!(
            serde_json::to_string(&ChatModel::Gpt35Turbo).unwrap(),
            "\"gpt-3.5-turbo\""
        );
    }
}
