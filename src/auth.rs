use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::mailer::Mailer;
use crate::session::{SessionPayload, SessionStore};
use crate::utils::error::Result;

/// One-time-password login over the session store.
///
/// `begin` issues a challenge and mails the code; `confirm` checks it.
/// A wrong code leaves the session intact so the user can re-enter it
/// until the entry expires naturally. Attempts are deliberately not
/// rate-limited.
pub struct LoginFlow {
    sessions: Arc<SessionStore>,
    mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Confirmed { email: String },
    /// Session id is unknown or expired.
    UnknownSession,
    /// OTP did not match; the session stays valid for another attempt.
    WrongOtp,
}

impl LoginFlow {
    pub fn new(sessions: Arc<SessionStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { sessions, mailer }
    }

    /// Start a login: create a session holding a fresh OTP and email the
    /// code to the user. Returns the opaque session id the client must
    /// present on confirm.
    pub async fn begin(&self, email: &str) -> Result<String> {
        let otp = generate_otp();
        let session_id = self.sessions.create(SessionPayload {
            otp: otp.clone(),
            email: email.to_string(),
        });
        info!(%email, %session_id, "login challenge created");

        let body = format!(
            "Here is your One-Time-Password: {}. Please do not share this with anyone else.",
            otp
        );
        if let Err(e) = self
            .mailer
            .send(email, "Log In Code for Price Sentry", &body)
            .await
        {
            // Without the code the session is useless; drop it
            warn!(%email, "failed to send OTP code: {}", e);
            self.sessions.end(&session_id);
            return Err(e);
        }

        Ok(session_id)
    }

    /// Check an OTP against its session. The session is consumed on the
    /// first successful confirmation and never reused.
    pub fn confirm(&self, session_id: &str, otp: &str) -> LoginOutcome {
        let Some(payload) = self.sessions.get(session_id) else {
            return LoginOutcome::UnknownSession;
        };
        if payload.otp != otp {
            return LoginOutcome::WrongOtp;
        }
        self.sessions.end(session_id);
        LoginOutcome::Confirmed {
            email: payload.email,
        }
    }
}

fn generate_otp() -> String {
    rand::thread_rng().gen_range(10_000..=99_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::MockMailer;
    use crate::utils::error::AppError;
    use std::sync::Mutex;

    /// Mailer double that remembers the OTP body it was asked to deliver.
    struct CapturingMailer {
        bodies: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, _to: &str, _subject: &str, body: &str) -> Result<()> {
            self.bodies.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    fn otp_from_body(body: &str) -> String {
        body.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    #[tokio::test]
    async fn test_full_login_roundtrip() {
        let sessions = Arc::new(SessionStore::new());
        let mailer = Arc::new(CapturingMailer {
            bodies: Mutex::new(Vec::new()),
        });
        let flow = LoginFlow::new(sessions.clone(), mailer.clone());

        let session_id = flow.begin("alice@example.com").await.unwrap();
        let otp = otp_from_body(&mailer.bodies.lock().unwrap()[0]);
        assert_eq!(otp.len(), 5);

        assert_eq!(
            flow.confirm(&session_id, &otp),
            LoginOutcome::Confirmed {
                email: "alice@example.com".to_string()
            }
        );
        // Consumed on first success, never reused
        assert_eq!(flow.confirm(&session_id, &otp), LoginOutcome::UnknownSession);
    }

    #[tokio::test]
    async fn test_wrong_otp_allows_reentry() {
        let sessions = Arc::new(SessionStore::new());
        let mailer = Arc::new(CapturingMailer {
            bodies: Mutex::new(Vec::new()),
        });
        let flow = LoginFlow::new(sessions.clone(), mailer.clone());

        let session_id = flow.begin("alice@example.com").await.unwrap();
        assert_eq!(flow.confirm(&session_id, "00000"), LoginOutcome::WrongOtp);

        // The session survived the failed attempt
        let otp = otp_from_body(&mailer.bodies.lock().unwrap()[0]);
        assert!(matches!(
            flow.confirm(&session_id, &otp),
            LoginOutcome::Confirmed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let sessions = Arc::new(SessionStore::new());
        let mailer = Arc::new(MockMailer::new());
        let flow = LoginFlow::new(sessions, mailer);
        assert_eq!(flow.confirm("bogus", "12345"), LoginOutcome::UnknownSession);
    }

    #[tokio::test]
    async fn test_failed_send_drops_session() {
        let sessions = Arc::new(SessionStore::new());
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(AppError::Mail("relay down".to_string())));
        let flow = LoginFlow::new(sessions.clone(), Arc::new(mailer));

        assert!(flow.begin("alice@example.com").await.is_err());
    }

    #[test]
    fn test_otp_shape() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 5);
            let value: u32 = otp.parse().unwrap();
            assert!((10_000..=99_999).contains(&value));
        }
    }
}
