use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseEnumError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Declares a string-backed identifier for one entity kind.
///
/// Each kind gets its own type so a `ProjectId` can never be passed where a
/// `ChatId` is expected. On the wire the id is a bare string.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh random (UUID v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(
    /// Identifier of a user account.
    UserId
);
entity_id!(ProjectId);
entity_id!(ChatId);
entity_id!(MessageId);
entity_id!(ModelId);
entity_id!(QuickPromptId);
entity_id!(
    /// Identifier of a user's settings row (not the user id).
    SettingsId
);
entity_id!(IntegrationId);

/// The kind of entity an id refers to. Used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Project,
    Chat,
    Message,
    Model,
    QuickPrompt,
    UserSettings,
    Integration,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Project => "project",
            EntityKind::Chat => "chat",
            EntityKind::Message => "message",
            EntityKind::Model => "model",
            EntityKind::QuickPrompt => "quick prompt",
            EntityKind::UserSettings => "user settings",
            EntityKind::Integration => "integration",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Closed wire enums
// ---------------------------------------------------------------------------

/// Declares an enum whose members serialize to a fixed set of string literals.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

wire_enum!(
    /// Author of a chat message. Alternation is not enforced.
    Role, "role" {
        User => "user",
        Assistant => "assistant",
    }
);

wire_enum!(
    /// Section a quick prompt is listed under.
    PromptCategory, "category" {
        Write => "write",
        Learn => "learn",
        Code => "code",
        Lifestuff => "lifestuff",
    }
);

wire_enum!(
    #[derive(Default)]
    ColorMode, "colorMode" {
        Light => "light",
        Dark => "dark",
        #[default]
        System => "system",
    }
);

wire_enum!(
    #[derive(Default)]
    ChatFont, "chatFont" {
        #[default]
        Default => "default",
        System => "system",
        /// Dyslexia-friendly typeface
        Dyslexic => "dyslexic",
    }
);

wire_enum!(
    /// External service a user can connect from the settings screen.
    IntegrationType, "integration type" {
        GoogleDrive => "google_drive",
        Gmail => "gmail",
        Calendar => "calendar",
        Github => "github",
    }
);

impl IntegrationType {
    /// Display name used when an integration is added without one.
    pub fn display_name(&self) -> &'static str {
        match self {
            IntegrationType::GoogleDrive => "Google Drive",
            IntegrationType::Gmail => "Gmail",
            IntegrationType::Calendar => "Google Calendar",
            IntegrationType::Github => "GitHub",
        }
    }
}
