use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility level declared on a method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Callable from anywhere, including top-level code.
    #[default]
    Public,
    /// Callable from the owning class, its subclasses and classes nested in the owner.
    Protected,
    /// Callable from the owning class and classes nested in the owner.
    Private,
}

impl AccessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::Public => "public",
            AccessPolicy::Protected => "protected",
            AccessPolicy::Private => "private",
        }
    }

    /// Resolve a policy tag leniently.
    ///
    /// A tag that names no known policy degrades to [`AccessPolicy::Public`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.parse() {
            Ok(policy) => policy,
            Err(_) => {
                tracing::warn!(tag, "unrecognized access policy tag, treating method as public");
                AccessPolicy::Public
            }
        }
    }

    /// Resolve an optional tag. An unset tag means public.
    pub fn resolve(tag: Option<&str>) -> Self {
        tag.map(Self::from_tag).unwrap_or_default()
    }

    /// Whether calls need an authorization check at all.
    pub fn is_restricted(&self) -> bool {
        !matches!(self, AccessPolicy::Public)
    }
}

impl FromStr for AccessPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(AccessPolicy::Public),
            "protected" => Ok(AccessPolicy::Protected),
            "private" => Ok(AccessPolicy::Private),
            _ => Err(Error::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_public() {
        assert_eq!(AccessPolicy::default(), AccessPolicy::Public);
        assert_eq!(AccessPolicy::resolve(None), AccessPolicy::Public);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!("private".parse::<AccessPolicy>().unwrap(), AccessPolicy::Private);
        assert_eq!(" Protected ".parse::<AccessPolicy>().unwrap(), AccessPolicy::Protected);
        assert_eq!("PUBLIC".parse::<AccessPolicy>().unwrap(), AccessPolicy::Public);
        assert!("internal".parse::<AccessPolicy>().is_err());
    }

    #[test]
    fn test_malformed_tag_degrades_to_public() {
        assert_eq!(AccessPolicy::from_tag("friend"), AccessPolicy::Public);
        assert_eq!(AccessPolicy::resolve(Some("")), AccessPolicy::Public);
        assert_eq!(AccessPolicy::resolve(Some("private")), AccessPolicy::Private);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AccessPolicy::Protected).unwrap();
        assert_eq!(json, "\"protected\"");
        let policy: AccessPolicy = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(policy, AccessPolicy::Private);
    }
}
