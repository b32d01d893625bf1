//! Digest delivery for scheduled scans.
//!
//! A scan that found new eligible jobs produces a plain-text digest and
//! hands it to a sink. SMTP delivery is optional; without SMTP settings
//! the digest is written to the log instead.

use std::future::Future;

use chrono::{DateTime, Utc};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use jobscan_core::error::AppError;
use jobscan_core::models::JobRecord;

pub struct Digest {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<(JobRecord, String)>,
}

impl Digest {
    pub fn new(run_id: Uuid, entries: Vec<(JobRecord, String)>) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            entries,
        }
    }

    pub fn subject(&self) -> String {
        format!("jobscan: {} new job(s)", self.entries.len())
    }

    /// Plain-text body, one block per job.
    pub fn body(&self) -> String {
        let mut out = format!(
            "Scan {} at {} found {} new job(s):\n\n",
            self.run_id,
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.entries.len()
        );
        for (record, reason) in &self.entries {
            out.push_str(&format!(
                "- {} @ {} ({})\n  {}\n  {}\n\n",
                record.title, record.company, record.location, reason, record.url
            ));
        }
        out
    }
}

/// Where a digest goes. Implementations must not block the scheduler on
/// failure; errors are logged and the cycle moves on.
pub trait DigestSink: Send + Sync {
    fn deliver(&self, digest: &Digest) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Fallback sink: the digest lands in the structured log.
#[derive(Clone, Copy)]
pub struct LogDigestSink;

impl DigestSink for LogDigestSink {
    async fn deliver(&self, digest: &Digest) -> Result<(), AppError> {
        tracing::info!(run_id = %digest.run_id, count = digest.entries.len(), "New jobs digest");
        for (record, reason) in &digest.entries {
            tracing::info!(
                title = %record.title,
                company = %record.company,
                url = %record.url,
                %reason,
                "New job"
            );
        }
        Ok(())
    }
}

/// Email delivery over SMTP with STARTTLS.
#[derive(Clone)]
pub struct SmtpDigestSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpDigestSink {
    /// Build from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, `DIGEST_FROM`, `DIGEST_TO`.
    ///
    /// Returns `Ok(None)` when `SMTP_HOST` is unset (email disabled);
    /// errors when the host is set but the rest is incomplete.
    pub fn from_env() -> Result<Option<Self>, AppError> {
        let Some(host) = non_empty_env("SMTP_HOST") else {
            return Ok(None);
        };

        let from = parse_mailbox("DIGEST_FROM")?;
        let to = parse_mailbox("DIGEST_TO")?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
            .map_err(|e| AppError::ConfigError(format!("invalid SMTP_HOST: {e}")))?;

        if let Some(port) = non_empty_env("SMTP_PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| AppError::ConfigError(format!("invalid SMTP_PORT: {port}")))?;
            builder = builder.port(port);
        }

        if let (Some(username), Some(password)) =
            (non_empty_env("SMTP_USERNAME"), non_empty_env("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Some(Self {
            transport: builder.build(),
            from,
            to,
        }))
    }
}

impl DigestSink for SmtpDigestSink {
    async fn deliver(&self, digest: &Digest) -> Result<(), AppError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest.subject())
            .body(digest.body())
            .map_err(|e| AppError::ConfigError(format!("failed to build digest email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::NetworkError(format!("smtp delivery failed: {e}")))?;

        tracing::info!(run_id = %digest.run_id, to = %self.to, "Digest email sent");
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_mailbox(name: &str) -> Result<Mailbox, AppError> {
    let raw = non_empty_env(name)
        .ok_or_else(|| AppError::ConfigError(format!("{name} must be set when SMTP_HOST is")))?;
    raw.parse()
        .map_err(|e| AppError::ConfigError(format!("invalid {name}: {e}")))
}
