//! Web push notification infrastructure.
//!
//! Manages VAPID keys and browser push subscriptions, and delivers
//! notifications to browser push services.
//!
//! # Architecture
//!
//! ```text
//! Page calls pushManager.subscribe(applicationServerKey)
//!     ↓
//! Subscription JSON is stored here (`pwa-push subscribe`)
//!     ↓
//! `pwa-push send` encrypts (RFC 8291) and posts (RFC 8030) to each endpoint
//!     ↓
//! Push service delivers to the service worker, which shows the notification
//! ```
//!
//! # VAPID Keys
//!
//! A P-256 ECDSA keypair (RFC 8292). The public key is the application
//! server key pages subscribe with; the private key signs each request.
//!
//! # Push Subscriptions
//!
//! Stored per browser identity. Subscriptions the push service reports as
//! gone (404/410) are pruned after each send.

pub mod push;
pub mod vapid;
