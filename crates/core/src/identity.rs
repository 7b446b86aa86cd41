use std::sync::{PoisonError, RwLock};

use crate::post::UserId;

/// Source of the currently signed-in user, read synchronously at every render
/// and before every owner-only action.
pub trait IdentityProvider: Send + Sync {
    fn current_uid(&self) -> Option<UserId>;
}

/// Identity held in memory; `None` means nobody is signed in.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    uid: RwLock<Option<UserId>>,
}

impl StaticIdentity {
    pub fn signed_in(uid: impl Into<UserId>) -> Self {
        Self {
            uid: RwLock::new(Some(uid.into())),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, uid: impl Into<UserId>) {
        *self.uid.write().unwrap_or_else(PoisonError::into_inner) = Some(uid.into());
    }

    pub fn sign_out(&self) {
        *self.uid.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_uid(&self) -> Option<UserId> {
        self.uid
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_uid() {
        assert_eq!(StaticIdentity::anonymous().current_uid(), None);
    }

    #[test]
    fn sign_in_and_out() {
        let identity = StaticIdentity::anonymous();
        identity.sign_in("u1");
        assert_eq!(identity.current_uid(), Some(UserId::from("u1")));

        identity.sign_out();
        assert_eq!(identity.current_uid(), None);
    }
}
