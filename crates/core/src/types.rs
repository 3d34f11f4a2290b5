use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype_string {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Return the inner string as a str slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
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
                Self(s.to_owned())
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    ChatId,
    "A conversation identifier, suffixed with the platform domain."
);
newtype_string!(UserId, "A sender identifier (participant address).");
newtype_string!(MessageId, "A platform-assigned unique message identifier.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_from_str() {
        let chat = ChatId::from("1203630@g.us");
        assert_eq!(chat.as_str(), "1203630@g.us");
        assert_eq!(&*chat, "1203630@g.us");
    }

    #[test]
    fn newtype_from_string() {
        let user = UserId::from("5511999@s.whatsapp.net".to_string());
        assert_eq!(user.to_string(), "5511999@s.whatsapp.net");
    }

    #[test]
    fn newtype_serde_roundtrip() {
        let id = MessageId::new("3EB0C431");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"3EB0C431\"");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
