//! Authorization rules for method calls.

use crate::AccessPolicy;
use std::fmt;

/// Class relationships the authorization rules depend on.
///
/// `C` is the owner class marker. Implementations decide what identity means;
/// the rules only ever compare markers with `==` and ask these two questions.
pub trait Lineage<C> {
    /// Whether `child` is `parent` or one of its descendants.
    fn is_subclass(&self, child: C, parent: C) -> bool;

    /// Whether `outer` declares `inner` directly in its own namespace.
    fn is_nested_in(&self, inner: C, outer: C) -> bool;
}

/// Why a call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The call came from outside any class context.
    NoContext,
    /// The calling class is not the owner (private).
    NotOwner,
    /// The calling class does not descend from the owner (protected).
    NotSubclass,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DenyReason::NoContext => "no class context",
            DenyReason::NotOwner => "caller is not the owning class",
            DenyReason::NotSubclass => "caller is not a subclass of the owning class",
        };
        f.write_str(text)
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: DenyReason },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl AccessPolicy {
    /// Check whether `caller` may invoke a method with this policy owned by `owner`.
    ///
    /// `caller` is the class currently executing, or `None` when the call
    /// originates outside any class.
    pub fn check<C, L>(&self, owner: C, caller: Option<C>, lineage: &L) -> Decision
    where
        C: Copy + PartialEq,
        L: Lineage<C> + ?Sized,
    {
        if *self == AccessPolicy::Public {
            return Decision::Allow;
        }

        let Some(caller) = caller else {
            return Decision::Deny {
                reason: DenyReason::NoContext,
            };
        };

        // A helper class declared inside the owner shares its trust boundary.
        if lineage.is_nested_in(caller, owner) {
            return Decision::Allow;
        }

        match self {
            AccessPolicy::Public => Decision::Allow,
            AccessPolicy::Private if caller == owner => Decision::Allow,
            AccessPolicy::Private => Decision::Deny {
                reason: DenyReason::NotOwner,
            },
            AccessPolicy::Protected if lineage.is_subclass(caller, owner) => Decision::Allow,
            AccessPolicy::Protected => Decision::Deny {
                reason: DenyReason::NotSubclass,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANIMAL: u8 = 0;
    const DOG: u8 = 1;
    const CAT: u8 = 2;
    const ROCK: u8 = 3;
    /// Declared inside `ANIMAL`.
    const HELPER: u8 = 4;

    struct Zoo;

    impl Lineage<u8> for Zoo {
        fn is_subclass(&self, child: u8, parent: u8) -> bool {
            child == parent || (parent == ANIMAL && matches!(child, DOG | CAT))
        }

        fn is_nested_in(&self, inner: u8, outer: u8) -> bool {
            inner == HELPER && outer == ANIMAL
        }
    }

    #[test]
    fn test_public_allows_everyone() {
        let policy = AccessPolicy::Public;
        assert!(policy.check(ANIMAL, None, &Zoo).is_allowed());
        assert!(policy.check(ANIMAL, Some(ROCK), &Zoo).is_allowed());
    }

    #[test]
    fn test_private_requires_owner() {
        let policy = AccessPolicy::Private;
        assert!(policy.check(ANIMAL, Some(ANIMAL), &Zoo).is_allowed());
        assert_eq!(
            policy.check(ANIMAL, Some(DOG), &Zoo),
            Decision::Deny {
                reason: DenyReason::NotOwner
            }
        );
        assert_eq!(
            policy.check(ANIMAL, None, &Zoo),
            Decision::Deny {
                reason: DenyReason::NoContext
            }
        );
    }

    #[test]
    fn test_protected_allows_descendants() {
        let policy = AccessPolicy::Protected;
        assert!(policy.check(ANIMAL, Some(ANIMAL), &Zoo).is_allowed());
        assert!(policy.check(ANIMAL, Some(DOG), &Zoo).is_allowed());
        assert!(policy.check(ANIMAL, Some(CAT), &Zoo).is_allowed());
        assert_eq!(
            policy.check(ANIMAL, Some(ROCK), &Zoo),
            Decision::Deny {
                reason: DenyReason::NotSubclass
            }
        );
        assert!(!policy.check(ANIMAL, None, &Zoo).is_allowed());
        // Ancestors do not qualify.
        assert!(!policy.check(DOG, Some(ANIMAL), &Zoo).is_allowed());
    }

    #[test]
    fn test_nested_class_is_trusted() {
        assert!(AccessPolicy::Private.check(ANIMAL, Some(HELPER), &Zoo).is_allowed());
        assert!(AccessPolicy::Protected.check(ANIMAL, Some(HELPER), &Zoo).is_allowed());
        // Nesting is one-way.
        assert!(!AccessPolicy::Private.check(HELPER, Some(ANIMAL), &Zoo).is_allowed());
    }
}
