/// Review notifications for statuses that are about to trend
use crate::config::SmtpConfig;
use crate::error::{Result, TrendsError};
use crate::models::{Reviewer, Status};
use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Delivers one review batch to one reviewer.
///
/// Delivery is the notifier's concern; a failure here never undoes the
/// review pass that produced the batch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewNotifier: Send + Sync {
    async fn notify(&self, reviewer: &Reviewer, batch: &[Status]) -> Result<()>;
}

/// SMTP mailer for review batches (or no-op when no host is configured)
#[derive(Clone)]
pub struct MailReviewNotifier {
    transport: Option<Arc<SmtpTransport>>,
    from: Mailbox,
    admin_base_url: String,
}

type SmtpTransport = AsyncSmtpTransport<Tokio1Executor>;

/// Relay for `config`, or `None` when no host is set.
fn smtp_transport(config: &SmtpConfig) -> Result<Option<SmtpTransport>> {
    let host = config.host.trim();
    if host.is_empty() {
        return Ok(None);
    }

    let relay = if config.use_starttls {
        SmtpTransport::starttls_relay(host)
    } else {
        SmtpTransport::relay(host)
    };
    let mut builder = relay
        .map_err(|e| TrendsError::Config(format!("SMTP relay {}: {}", host, e)))?
        .port(config.port);
    if let Some((user, pass)) = config.username.clone().zip(config.password.clone()) {
        builder = builder.credentials(Credentials::new(user, pass));
    }
    Ok(Some(builder.build()))
}

impl MailReviewNotifier {
    /// Without an SMTP host the notifier only logs.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| TrendsError::Config(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = smtp_transport(config)?.map(Arc::new);
        if transport.is_none() {
            warn!("SMTP host not configured; review mails will only be logged");
        }

        Ok(Self {
            transport,
            from,
            admin_base_url: config.admin_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    fn render(&self, reviewer: &Reviewer, batch: &[Status]) -> (String, String) {
        let subject = if batch.len() == 1 {
            "New trending post for review".to_string()
        } else {
            format!("{} new trending posts for review", batch.len())
        };

        let mut body = format!(
            "Hi {},\n\nThe following posts are trending but have not been reviewed yet. \
             They will not be shown publicly until approved.\n\n",
            reviewer.username
        );
        for status in batch {
            body.push_str(&format!(
                "- {}/{} by @{} ({} boosts, {} favourites)\n",
                self.admin_base_url,
                status.id,
                status.account.username,
                status.reblogs_count,
                status.favourites_count
            ));
        }
        body.push_str(&format!("\nReview them at {}\n", self.admin_base_url));

        (subject, body)
    }
}

#[async_trait]
impl ReviewNotifier for MailReviewNotifier {
    async fn notify(&self, reviewer: &Reviewer, batch: &[Status]) -> Result<()> {
        let (subject, body) = self.render(reviewer, batch);

        let Some(transport) = &self.transport else {
            info!(
                reviewer = %reviewer.username,
                statuses = batch.len(),
                "Review mailer running in no-op mode; skipping actual send"
            );
            return Ok(());
        };

        let to = reviewer.email.parse::<Mailbox>().map_err(|e| {
            TrendsError::Notification(format!("Invalid reviewer email address: {}", e))
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject.as_str())
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| TrendsError::Notification(format!("Failed to build email: {}", e)))?;

        transport
            .send(email)
            .await
            .map_err(|e| TrendsError::Notification(format!("Failed to send email: {}", e)))?;

        info!(
            reviewer = %reviewer.username,
            statuses = batch.len(),
            "Trending review email sent"
        );
        Ok(())
    }
}
