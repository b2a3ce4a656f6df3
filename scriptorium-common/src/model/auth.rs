//! Bearer tokens identifying a viewer.
//!
//! A token reads `<user id>:<core>:<salt>` with core and salt base64 encoded.
//! Only the argon2 hash of the core is stored.

use crate::model::{Id, user::UserMarker};
use argon2::{Argon2, Params};
use base64::{DecodeError, Engine, prelude::BASE64_STANDARD};
use std::{
    fmt::{Debug, Formatter},
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::OffsetDateTime;

pub const TOKEN_CORE_LEN: usize = 24;
pub const TOKEN_SALT_LEN: usize = 18;
pub const TOKEN_HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing auth token failed: {0}")]
pub struct AuthTokenHashError(argon2::Error);

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum AuthTokenDecodeError {
    #[error("Expected three parts separated by ':'")]
    NotEnoughParts,
    #[error("Invalid user id: {0}")]
    InvalidUserId(ParseIntError),
    #[error("Decoding base64 failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("The core part must decode to 24 bytes")]
    InvalidCoreLength,
    #[error("The salt part must decode to 18 bytes")]
    InvalidSaltLength,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AuthToken {
    pub user_id: Id<UserMarker>,
    pub core: [u8; TOKEN_CORE_LEN],
    pub salt: [u8; TOKEN_SALT_LEN],
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct AuthTokenHash(pub Box<[u8; TOKEN_HASH_LEN]>);

/// A stored token: whose it is and until when it is valid.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Authentication {
    pub user: Id<UserMarker>,
    pub token_hash: AuthTokenHash,
    pub expires_at: Option<OffsetDateTime>,
}

impl Authentication {
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl AuthToken {
    pub fn hash(&self) -> Result<AuthTokenHash, AuthTokenHashError> {
        let mut hash = Box::new([0; TOKEN_HASH_LEN]);
        Argon2::default()
            .hash_password_into(&self.core, &self.salt, &mut *hash)
            .map_err(AuthTokenHashError)?;

        Ok(AuthTokenHash(hash))
    }
}

impl FromStr for AuthToken {
    type Err = AuthTokenDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [user_id, core, salt] = s
            .splitn(3, ':')
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| Self::Err::NotEnoughParts)?;

        Ok(Self {
            user_id: i64::from_str(user_id)
                .map_err(Self::Err::InvalidUserId)?
                .into(),
            core: BASE64_STANDARD
                .decode(core)?
                .try_into()
                .map_err(|_| Self::Err::InvalidCoreLength)?,
            salt: BASE64_STANDARD
                .decode(salt)?
                .try_into()
                .map_err(|_| Self::Err::InvalidSaltLength)?,
        })
    }
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Debug for AuthTokenHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthTokenHash([redacted])")
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The auth token hash had an invalid length")]
pub struct InvalidAuthTokenHashError;

impl TryFrom<Vec<u8>> for AuthTokenHash {
    type Error = InvalidAuthTokenHashError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        let hash: [u8; TOKEN_HASH_LEN] =
            value.try_into().map_err(|_| InvalidAuthTokenHashError)?;
        Ok(Self(Box::new(hash)))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        auth::{
            AuthToken, AuthTokenDecodeError, AuthTokenHash, Authentication, TOKEN_CORE_LEN,
            TOKEN_HASH_LEN, TOKEN_SALT_LEN,
        },
    };
    use base64::{Engine, prelude::BASE64_STANDARD};
    use time::{Duration, macros::datetime};

    fn token(user_id: i64, core_byte: u8) -> AuthToken {
        AuthToken {
            user_id: Id::new(user_id),
            core: [core_byte; TOKEN_CORE_LEN],
            salt: [7; TOKEN_SALT_LEN],
        }
    }

    #[test]
    fn parse_token() {
        let core = BASE64_STANDARD.encode([1_u8; TOKEN_CORE_LEN]);
        let salt = BASE64_STANDARD.encode([7_u8; TOKEN_SALT_LEN]);
        let parsed: AuthToken = format!("17:{core}:{salt}").parse().unwrap();

        assert_eq!(parsed, token(17, 1));
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(
            "17:abc".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::NotEnoughParts)
        );
        assert!(matches!(
            "x:AAAA:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::InvalidUserId(_))
        ));
        assert!(matches!(
            "17:!!!:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::Decode(_))
        ));
        assert_eq!(
            "17:AAAA:AAAA".parse::<AuthToken>(),
            Err(AuthTokenDecodeError::InvalidCoreLength)
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let first = token(1, 1);
        let second = token(1, 2);

        assert_eq!(first.hash().unwrap(), first.hash().unwrap());
        assert_ne!(first.hash().unwrap(), second.hash().unwrap());
    }

    #[test]
    fn hash_from_bytes() {
        assert!(AuthTokenHash::try_from(vec![0; TOKEN_HASH_LEN]).is_ok());
        assert!(AuthTokenHash::try_from(vec![0; TOKEN_HASH_LEN - 1]).is_err());
    }

    #[test]
    fn expiry() {
        let now = datetime!(2026-03-01 12:00 UTC);
        let mut authentication = Authentication {
            user: Id::new(1),
            token_hash: AuthTokenHash(Box::new([0; TOKEN_HASH_LEN])),
            expires_at: None,
        };
        assert!(!authentication.is_expired_at(now));

        authentication.expires_at = Some(now + Duration::hours(1));
        assert!(!authentication.is_expired_at(now));

        authentication.expires_at = Some(now - Duration::seconds(1));
        assert!(authentication.is_expired_at(now));
    }
}
