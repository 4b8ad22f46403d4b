//! Cookie-consent state machine.
//!
//! Originally a page-wide provider; here it is an explicit handle created
//! once per session, read by the tracker and the banner, and mutated only
//! through [`ConsentManager::accept`] / [`ConsentManager::decline`]. Cookie
//! and web-storage access go through collaborator traits so the machine
//! itself stays pure and testable.

/// Name of the consent cookie.
pub const CONSENT_COOKIE_NAME: &str = "cookie-consent";

/// Consent cookie lifetime in days.
pub const CONSENT_COOKIE_EXPIRY_DAYS: i64 = 365;

/// Cookie name prefixes owned by the analytics collaborator. Scrubbed when
/// the user declines or resets consent.
const ANALYTICS_COOKIE_PREFIXES: [&str; 4] = ["ph_phc", "_ph_", "ph_", "posthog"];

/// Substrings identifying analytics entries in local/session storage.
const ANALYTICS_STORAGE_MARKERS: [&str; 2] = ["posthog", "ph_"];

/// The user's tracking choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    /// No choice recorded yet; the banner is shown.
    Unset,
    /// User accepted tracking; analytics may initialize.
    Accepted,
    /// User declined tracking; analytics never initializes.
    Declined,
}

impl ConsentState {
    /// Parse a stored cookie value. Anything unrecognized is `Unset`.
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value {
            Some("accepted") => ConsentState::Accepted,
            Some("declined") => ConsentState::Declined,
            _ => ConsentState::Unset,
        }
    }

    /// Value persisted in the consent cookie, if any.
    pub fn cookie_value(&self) -> Option<&'static str> {
        match self {
            ConsentState::Accepted => Some("accepted"),
            ConsentState::Declined => Some("declined"),
            ConsentState::Unset => None,
        }
    }
}

/// Cookie read/write collaborator.
pub trait CookieJar {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str, max_age_days: i64);
    fn remove(&mut self, name: &str);
    /// Names of all cookies currently present, for the decline-time scrub.
    fn names(&self) -> Vec<String>;
}

/// Local/session storage collaborator, key enumeration and removal only.
pub trait KeyValueStorage {
    fn keys(&self) -> Vec<String>;
    fn remove(&mut self, key: &str);
}

/// Side effect the caller must perform after a consent transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ConsentEffect {
    /// Nothing further to do.
    None,
    /// Reload the page so the analytics collaborator initializes cleanly
    /// with consent already persisted (avoids partial-init races).
    ReloadPage,
}

/// Session-scoped consent handle.
pub struct ConsentManager<J, S>
where
    J: CookieJar,
    S: KeyValueStorage,
{
    jar: J,
    local_storage: S,
    session_storage: S,
    state: ConsentState,
    show_banner: bool,
}

impl<J, S> ConsentManager<J, S>
where
    J: CookieJar,
    S: KeyValueStorage,
{
    /// Read the persisted choice on session start. An absent or unreadable
    /// cookie means `Unset`, which shows the banner.
    pub fn load(jar: J, local_storage: S, session_storage: S) -> Self {
        let state = ConsentState::from_cookie(jar.get(CONSENT_COOKIE_NAME).as_deref());
        let show_banner = state == ConsentState::Unset;

        tracing::debug!("Consent loaded: {:?}, banner: {}", state, show_banner);

        Self {
            jar,
            local_storage,
            session_storage,
            state,
            show_banner,
        }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    /// Release the collaborators, mainly so tests can inspect what was
    /// persisted and scrubbed.
    pub fn into_parts(self) -> (J, S, S) {
        (self.jar, self.local_storage, self.session_storage)
    }

    pub fn show_banner(&self) -> bool {
        self.show_banner
    }

    /// Whether the analytics collaborator is allowed to initialize.
    pub fn allows_tracking(&self) -> bool {
        self.state == ConsentState::Accepted
    }

    /// User clicked accept: persist the choice and request a full page
    /// reload so analytics initializes with consent already present.
    pub fn accept(&mut self) -> ConsentEffect {
        self.transition(ConsentState::Accepted);

        tracing::info!("Cookie consent accepted");
        ConsentEffect::ReloadPage
    }

    /// User clicked decline: persist the choice and proactively scrub any
    /// analytics state already written.
    pub fn decline(&mut self) -> ConsentEffect {
        self.transition(ConsentState::Declined);
        self.scrub_analytics_state();

        tracing::info!("Cookie consent declined, analytics state cleared");
        ConsentEffect::None
    }

    fn transition(&mut self, state: ConsentState) {
        self.state = state;
        self.show_banner = false;
        if let Some(value) = state.cookie_value() {
            self.jar
                .set(CONSENT_COOKIE_NAME, value, CONSENT_COOKIE_EXPIRY_DAYS);
        }
    }

    /// Administrative/debug path: forget the choice and re-show the banner.
    pub fn reset(&mut self) {
        self.state = ConsentState::Unset;
        self.show_banner = true;
        self.jar.remove(CONSENT_COOKIE_NAME);
        self.scrub_analytics_state();

        tracing::info!("Cookie consent reset");
    }

    /// Remove analytics cookies and storage entries by known key shape.
    fn scrub_analytics_state(&mut self) {
        for name in self.jar.names() {
            if ANALYTICS_COOKIE_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
            {
                self.jar.remove(&name);
            }
        }

        for key in self.local_storage.keys() {
            if ANALYTICS_STORAGE_MARKERS.iter().any(|m| key.contains(m)) {
                self.local_storage.remove(&key);
            }
        }

        for key in self.session_storage.keys() {
            if ANALYTICS_STORAGE_MARKERS.iter().any(|m| key.contains(m)) {
                self.session_storage.remove(&key);
            }
        }
    }
}
