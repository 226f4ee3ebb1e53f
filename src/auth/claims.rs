use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Which endpoint family a token is good for. Refresh tokens never pass the
/// `AuthUser` extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Token payload. Timestamps are unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        kind: TokenKind,
        issuer: &str,
        audience: &str,
        issued_at: OffsetDateTime,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id,
            iat: issued_at.unix_timestamp().max(0) as usize,
            exp: (issued_at + ttl).unix_timestamp().max(0) as usize,
            iss: issuer.to_owned(),
            aud: audience.to_owned(),
            kind,
        }
    }

    pub fn is_access(&self) -> bool {
        self.kind == TokenKind::Access
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_issue_time_plus_ttl() {
        let at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let claims = Claims::new(Uuid::nil(), TokenKind::Refresh, "iss", "aud", at, Duration::minutes(30));
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_001_800);
        assert!(!claims.is_access());
    }

    #[test]
    fn kind_is_serialized_lowercase() {
        let at = OffsetDateTime::from_unix_timestamp(0).unwrap();
        let claims = Claims::new(Uuid::nil(), TokenKind::Access, "iss", "aud", at, Duration::seconds(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["kind"], "access");
        assert!(claims.is_access());
    }
}
