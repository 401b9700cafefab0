//! Navigation back to the login screen

use log::{debug, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Why the client asked for the login screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// A call was attempted without a session
    NotAuthenticated,
    /// The API answered 401
    SessionExpired,
}

/// Navigation collaborator invoked when the user has to sign in again.
///
/// Concurrent calls may each trigger a redirect; implementations must
/// tolerate repeats.
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, reason: RedirectReason);
}

/// Redirect that only logs (headless callers)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRedirect;

impl LoginRedirect for NoopRedirect {
    fn redirect_to_login(&self, reason: RedirectReason) {
        info!("Login required ({:?})", reason);
    }
}

/// Redirect that forwards reasons to a UI event loop
#[derive(Debug, Clone)]
pub struct ChannelRedirect {
    tx: UnboundedSender<RedirectReason>,
}

impl ChannelRedirect {
    /// Create the redirect and the receiver the UI loop listens on
    pub fn new() -> (Self, UnboundedReceiver<RedirectReason>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LoginRedirect for ChannelRedirect {
    fn redirect_to_login(&self, reason: RedirectReason) {
        if self.tx.send(reason).is_err() {
            debug!("Login redirect dropped, no listener ({:?})", reason);
        }
    }
}
