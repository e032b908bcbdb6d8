//! Session identity and access control
//!
//! A session holds at most one email identity and one verified phone number.
//! Both are persisted in the local store and restored once when the session
//! starts. Sign-out clears the email only.

pub mod gate;
pub mod store;

pub use gate::{Access, AccessGate, AccessRequirement};
pub use store::{FileStore, LocalStore, MemoryStore, EMAIL_KEY, PHONE_KEY};

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracking::{phone_document_id, EventLog, TrackedEvent, ANONYMOUS};

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9\s-]{10,}$").expect("valid phone pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
}

/// Optional leading `+`, then at least ten ASCII digits, spaces or hyphens
pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone)
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    email: Option<String>,
    phone: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Start a session, picking up identities from an earlier one
    pub fn restore(store: &dyn LocalStore) -> Self {
        let email = store.get(EMAIL_KEY).filter(|e| is_valid_email(e));
        let phone = store.get(PHONE_KEY).filter(|p| is_valid_phone(p));
        if phone.is_some() {
            log::debug!("restored verified phone from local store");
        }
        Self { email, phone }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Email if signed in, otherwise `anonymous`
    pub fn user_label(&self) -> &str {
        self.email().unwrap_or(ANONYMOUS)
    }

    /// Attach an email identity
    pub fn sign_in(
        &mut self,
        email: &str,
        display_name: Option<&str>,
        store: &dyn LocalStore,
        events: &EventLog,
    ) -> Result<()> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(Error::InvalidEmail(email.to_string()));
        }
        store.set(EMAIL_KEY, email)?;
        self.email = Some(email.to_string());
        log::info!("signed in as {}", email);
        events.record(TrackedEvent::Login {
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        });
        Ok(())
    }

    /// Clear the email identity. A verified phone stays unlocked.
    pub fn sign_out(&mut self, store: &dyn LocalStore) -> Result<()> {
        store.remove(EMAIL_KEY)?;
        if let Some(email) = self.email.take() {
            log::info!("signed out {}", email);
        }
        Ok(())
    }

    /// Validate and persist a phone number
    pub fn unlock_phone(&mut self, phone: &str, store: &dyn LocalStore, events: &EventLog) -> Result<()> {
        let phone = phone.trim();
        if !is_valid_phone(phone) {
            return Err(Error::InvalidPhone(phone.to_string()));
        }
        store.set(PHONE_KEY, phone)?;
        self.phone = Some(phone.to_string());
        log::info!("phone unlocked");

        let document_id = match self.email() {
            Some(email) => email.to_string(),
            None => phone_document_id(phone),
        };
        events.record(TrackedEvent::PhoneUnlock {
            phone: phone.to_string(),
            document_id,
            linked_email: self.email.clone(),
        });
        Ok(())
    }

    /// Forget the verified phone, here and in the store
    pub fn forget_phone(&mut self, store: &dyn LocalStore) -> Result<()> {
        store.remove(PHONE_KEY)?;
        self.phone = None;
        Ok(())
    }
}
