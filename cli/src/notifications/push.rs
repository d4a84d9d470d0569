//! Web push message sending and subscription management.
//!
//! Stores browser push subscriptions and sends encrypted web push
//! messages (RFC 8030) using VAPID authentication (RFC 8292).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::constants::{AUTH_SECRET_LEN, PUSH_REQUEST_TIMEOUT};
use crate::encoding::url_base64_to_bytes;
use crate::install::is_loopback_host;
use crate::notifications::vapid::{validate_application_server_key, VapidKeys};

/// Client key material of a push subscription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    /// Browser's P-256 ECDH public key (base64url).
    pub p256dh: String,
    /// Shared auth secret (base64url).
    pub auth: String,
}

/// A browser's push subscription, in the shape of `PushSubscription.toJSON()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Expiry in milliseconds since the epoch, when the push service sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    /// Encryption keys.
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    /// Build a subscription from its three required parts.
    pub fn new(endpoint: impl Into<String>, p256dh: impl Into<String>, auth: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }

    /// Check that the subscription can actually be delivered to.
    ///
    /// The endpoint must be `https` (plain `http` only on loopback hosts),
    /// `p256dh` must decode to an uncompressed P-256 point and `auth` to a
    /// 16-byte secret.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid push endpoint URL: {}", self.endpoint))?;
        match url.scheme() {
            "https" => {}
            "http" if is_loopback_host(&url) => {}
            other => anyhow::bail!("Push endpoint must use https, got {other}://"),
        }

        let p256dh = url_base64_to_bytes(&self.keys.p256dh)
            .context("Push subscription setup failed: p256dh is not valid base64url")?;
        validate_application_server_key(&p256dh)
            .context("Push subscription setup failed: p256dh is not a P-256 public key")?;

        let auth = url_base64_to_bytes(&self.keys.auth)
            .context("Push subscription setup failed: auth is not valid base64url")?;
        anyhow::ensure!(
            auth.len() == AUTH_SECRET_LEN,
            "Push subscription setup failed: auth secret must be {} bytes, got {}",
            AUTH_SECRET_LEN,
            auth.len()
        );
        Ok(())
    }

    /// Whether the push service's expiry has passed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time
            .is_some_and(|ms| ms <= now.timestamp_millis())
    }
}

/// A stored subscription plus bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// The browser subscription.
    pub subscription: PushSubscription,
    /// When this identity last (re)subscribed.
    pub subscribed_at: DateTime<Utc>,
}

/// Stores push subscriptions per browser identity.
///
/// Identities are caller-chosen (a user id, a device id). When a push
/// service reports a subscription as gone, it is removed.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionStore {
    /// Maps browser identity → subscription record.
    subscriptions: BTreeMap<String, SubscriptionRecord>,
}

impl PushSubscriptionStore {
    /// Add or update a push subscription for a browser.
    ///
    /// Deduplicates by endpoint: if another identity already holds a
    /// subscription with the same push endpoint, that entry is removed first
    /// so one browser never receives the same notification twice.
    pub fn upsert(&mut self, browser_identity: String, subscription: PushSubscription) {
        self.upsert_at(browser_identity, subscription, Utc::now());
    }

    fn upsert_at(&mut self, browser_identity: String, subscription: PushSubscription, now: DateTime<Utc>) {
        let stale_keys: Vec<String> = self
            .subscriptions
            .iter()
            .filter(|(k, v)| **k != browser_identity && v.subscription.endpoint == subscription.endpoint)
            .map(|(k, _)| k.clone())
            .collect();

        for key in stale_keys {
            log::info!(
                "[WebPush] Replacing stale subscription for {} (same endpoint, new identity {})",
                key,
                browser_identity
            );
            self.subscriptions.remove(&key);
        }

        self.subscriptions.insert(
            browser_identity,
            SubscriptionRecord {
                subscription,
                subscribed_at: now,
            },
        );
    }

    /// Remove a push subscription for a browser. Returns whether it existed.
    pub fn remove(&mut self, browser_identity: &str) -> bool {
        self.subscriptions.remove(browser_identity).is_some()
    }

    /// Remove every subscription using `endpoint`. Returns how many were removed.
    pub fn remove_endpoint(&mut self, endpoint: &str) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|_, record| record.subscription.endpoint != endpoint);
        before - self.subscriptions.len()
    }

    /// Look up the record for a browser identity.
    pub fn get(&self, browser_identity: &str) -> Option<&SubscriptionRecord> {
        self.subscriptions.get(browser_identity)
    }

    /// All stored subscriptions, ordered by identity.
    pub fn all(&self) -> impl Iterator<Item = (&str, &SubscriptionRecord)> {
        self.subscriptions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of stored subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Check if a subscription exists for a given browser identity.
    pub fn contains(&self, browser_identity: &str) -> bool {
        self.subscriptions.contains_key(browser_identity)
    }

    /// Remove duplicate subscriptions that share the same push endpoint.
    ///
    /// Keeps the most recently subscribed entry for each endpoint (ties go
    /// to the identity sorting last). Returns the number removed.
    pub fn dedup_by_endpoint(&mut self) -> usize {
        let mut newest: HashMap<&str, (&str, DateTime<Utc>)> = HashMap::new();
        for (identity, record) in &self.subscriptions {
            let entry = newest
                .entry(record.subscription.endpoint.as_str())
                .or_insert((identity.as_str(), record.subscribed_at));
            if record.subscribed_at >= entry.1 {
                *entry = (identity.as_str(), record.subscribed_at);
            }
        }

        let keep: Vec<String> = newest.values().map(|(id, _)| (*id).to_string()).collect();
        let before = self.subscriptions.len();
        self.subscriptions.retain(|identity, _| keep.contains(identity));
        before - self.subscriptions.len()
    }
}

/// Notification content delivered to the service worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// URL to open when the notification is clicked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Result of a single push delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Push service accepted the message.
    Delivered,
    /// Subscription no longer exists (404/410); it should be removed.
    Expired,
    /// Push service throttled us (429); keep the subscription.
    RateLimited,
}

/// Totals from a fan-out to every stored subscription.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Messages accepted by push services.
    pub delivered: usize,
    /// Identities whose subscriptions are gone.
    pub expired: Vec<String>,
    /// Messages throttled by push services.
    pub rate_limited: usize,
    /// Identities that failed, with the error text.
    pub failed: Vec<(String, String)>,
}

/// Sends web push messages with one VAPID identity.
///
/// Holds a single `reqwest::Client` for connection pooling across sends.
#[derive(Debug, Clone)]
pub struct PushSender {
    client: reqwest::Client,
    vapid: VapidKeys,
    subject: String,
    ttl: u32,
}

impl PushSender {
    /// Create a sender signing as `subject` (a `mailto:` or `https:` URI).
    pub fn new(vapid: VapidKeys, subject: impl Into<String>, ttl: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PUSH_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            vapid,
            subject: subject.into(),
            ttl,
        })
    }

    /// Encrypt and send one payload to one subscription.
    ///
    /// Uses `web-push` for RFC 8291 payload encryption and VAPID signing,
    /// then sends the HTTP request through reqwest.
    pub async fn send(&self, subscription: &PushSubscription, payload: &[u8]) -> Result<SendOutcome> {
        use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

        let sub_info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.keys.p256dh,
            &subscription.keys.auth,
        );

        let mut sig_builder = VapidSignatureBuilder::from_base64(self.vapid.private_key_base64url(), &sub_info)
            .context("Failed to build VAPID signature")?;
        sig_builder.add_claim("sub", self.subject.as_str());
        let sig = sig_builder.build().context("Failed to sign VAPID JWT")?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(sig);
        builder.set_ttl(self.ttl);

        let message = builder.build().context("Failed to build web push message")?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        let response = request.send().await.context("Web push HTTP request failed")?;
        let status = response.status().as_u16();

        match status {
            200..=299 => Ok(SendOutcome::Delivered),
            404 | 410 => {
                log::info!("[WebPush] Subscription expired (HTTP {status})");
                Ok(SendOutcome::Expired)
            }
            429 => {
                log::warn!("[WebPush] Rate limited (429)");
                Ok(SendOutcome::RateLimited)
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!("Web push send failed (HTTP {status}): {body}"))
            }
        }
    }

    /// Send a notification to every subscription in `store` concurrently.
    ///
    /// Subscriptions whose push-service expiry has passed are reported as
    /// expired without a request. The store is not modified; prune
    /// `report.expired` afterwards.
    pub async fn broadcast(
        &self,
        store: &PushSubscriptionStore,
        notification: &NotificationPayload,
    ) -> Result<BroadcastReport> {
        let payload = serde_json::to_vec(notification).context("Failed to serialize notification")?;
        let now = Utc::now();

        let mut report = BroadcastReport::default();
        let mut pending = Vec::new();
        for (identity, record) in store.all() {
            if record.subscription.is_expired_at(now) {
                report.expired.push(identity.to_string());
                continue;
            }
            let payload = &payload;
            pending.push(async move {
                (identity.to_string(), self.send(&record.subscription, payload).await)
            });
        }

        for (identity, result) in join_all(pending).await {
            match result {
                Ok(SendOutcome::Delivered) => report.delivered += 1,
                Ok(SendOutcome::Expired) => report.expired.push(identity),
                Ok(SendOutcome::RateLimited) => report.rate_limited += 1,
                Err(e) => {
                    log::warn!("[WebPush] Delivery to {} failed: {:#}", identity, e);
                    report.failed.push((identity, format!("{e:#}")));
                }
            }
        }

        log::info!(
            "[WebPush] Broadcast: {} delivered, {} expired, {} rate limited, {} failed",
            report.delivered,
            report.expired.len(),
            report.rate_limited,
            report.failed.len()
        );
        Ok(report)
    }
}
