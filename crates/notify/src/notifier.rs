//! Notification decisions, rendering and the email log.

use std::sync::Arc;

use chrono::{Duration, Utc};
use doccheck_core::check::{BatchItem, CheckResult, CheckStatus};
use doccheck_core::settings::CheckerSettings;
use doccheck_core::template::{
    render_body, render_subject, ListedItem, Placeholders, Recipient, SiteInfo, TEST_EMAIL_BODY,
    TEST_EMAIL_SUBJECT,
};
use doccheck_core::types::DbId;
use doccheck_db::models::email_log::{
    CreateEmailLog, EmailLog, EmailLogQuery, EmailStats, EMAIL_STATUS_FAILED, EMAIL_STATUS_SENT,
    EMAIL_TYPE_BATCH, EMAIL_TYPE_SINGLE,
};
use doccheck_db::repositories::EmailLogRepo;
use doccheck_db::DbPool;
use doccheck_tainacan::{ItemInfo, ItemSource, Owner};
use serde::Serialize;

use crate::error::EmailError;
use crate::mailer::{is_valid_email, Mailer, OutgoingEmail};

/// Default look-back window for email statistics.
pub const DEFAULT_STATS_DAYS: i64 = 30;

/// What happened to one notification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Sent,
    /// Delivery was attempted and failed.
    Failed(String),
    /// A precondition did not hold; nothing was sent or logged.
    Skipped(String),
}

impl NotifyOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }

    /// Human-readable explanation for the admin UI.
    pub fn message(&self) -> String {
        match self {
            Self::Sent => "Email notification sent successfully.".to_string(),
            Self::Failed(_) => "Failed to send email notification.".to_string(),
            Self::Skipped(reason) => reason.clone(),
        }
    }
}

/// Counters for a grouped batch notification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchNotifyStats {
    pub emails_sent: u32,
    pub emails_failed: u32,
    pub users_notified: Vec<DbId>,
}

/// Sends owner notifications and records each attempt.
#[derive(Clone)]
pub struct Notifier {
    pool: DbPool,
    source: Arc<dyn ItemSource>,
    mailer: Arc<dyn Mailer>,
    site: SiteInfo,
}

impl Notifier {
    pub fn new(
        pool: DbPool,
        source: Arc<dyn ItemSource>,
        mailer: Arc<dyn Mailer>,
        site: SiteInfo,
    ) -> Self {
        Self {
            pool,
            source,
            mailer,
            site,
        }
    }

    // -----------------------------------------------------------------------
    // Single item
    // -----------------------------------------------------------------------

    /// Notify the owner of one checked item.
    ///
    /// Only `incomplete` results are ever sent, and only when notifications
    /// are enabled and the owner has a valid address.
    pub async fn send_single(&self, result: &CheckResult, settings: &CheckerSettings) -> NotifyOutcome {
        self.notify_owner(result, settings).await.1
    }

    /// Notify each incomplete result's owner separately.
    ///
    /// Results whose owner cannot be resolved are ignored; any other outcome
    /// that is not a successful send counts as a failure.
    pub async fn send_each(
        &self,
        results: &[CheckResult],
        settings: &CheckerSettings,
    ) -> BatchNotifyStats {
        let mut stats = BatchNotifyStats::default();
        if !settings.email_enabled {
            return stats;
        }

        for result in results.iter().filter(|r| r.status == CheckStatus::Incomplete) {
            match self.notify_owner(result, settings).await {
                (Some(owner_id), NotifyOutcome::Sent) => {
                    stats.emails_sent += 1;
                    if !stats.users_notified.contains(&owner_id) {
                        stats.users_notified.push(owner_id);
                    }
                }
                (Some(_), _) => stats.emails_failed += 1,
                (None, _) => {}
            }
        }
        stats
    }

    /// The owner id (once known) alongside the outcome.
    async fn notify_owner(
        &self,
        result: &CheckResult,
        settings: &CheckerSettings,
    ) -> (Option<DbId>, NotifyOutcome) {
        if !settings.email_enabled {
            return (None, NotifyOutcome::Skipped("Email notifications are disabled.".into()));
        }
        if result.status != CheckStatus::Incomplete {
            return (None, NotifyOutcome::Skipped("Item has no pending documents.".into()));
        }

        let Some(info) = self.item_info(result.item_id).await else {
            return (None, NotifyOutcome::Skipped("Could not load item information.".into()));
        };
        let Some(owner_id) = info.owner_id else {
            tracing::debug!(item_id = result.item_id, "No owner found for item");
            return (
                None,
                NotifyOutcome::Skipped("Could not find user associated with this item.".into()),
            );
        };
        let Some(owner) = self.valid_owner(owner_id).await else {
            return (
                Some(owner_id),
                NotifyOutcome::Skipped("Invalid user or email.".into()),
            );
        };

        let now = Utc::now();
        let item_url = self.item_url(&info);
        let values = Placeholders::single(
            recipient(&owner),
            &info.title,
            &item_url,
            result,
            &self.site,
            now,
        );
        let subject = render_subject(&settings.templates.single_subject, &values);
        let body = render_body(&settings.templates.single_body, &values, settings.email_html);

        let outcome = self
            .deliver(&owner, result.item_id, EMAIL_TYPE_SINGLE, subject, body, settings)
            .await;
        (Some(owner_id), outcome)
    }

    // -----------------------------------------------------------------------
    // Batch
    // -----------------------------------------------------------------------

    /// Send one grouped message per owner of the incomplete items.
    ///
    /// Items whose owner cannot be resolved are skipped. An owner without a
    /// valid address counts as a failure but is not logged.
    pub async fn send_batch(
        &self,
        items: &[BatchItem],
        collection_id: Option<DbId>,
        settings: &CheckerSettings,
    ) -> BatchNotifyStats {
        let mut stats = BatchNotifyStats::default();
        if !settings.email_enabled {
            tracing::debug!("Email notifications are disabled, skipping batch");
            return stats;
        }

        let mut groups: Vec<(DbId, Vec<ListedItem>)> = Vec::new();
        for item in items.iter().filter(|i| i.status == CheckStatus::Incomplete) {
            let Some(info) = self.item_info(item.id).await else {
                continue;
            };
            let Some(owner_id) = info.owner_id else {
                tracing::debug!(item_id = item.id, "No owner found for item");
                continue;
            };

            let listed = ListedItem {
                id: item.id,
                title: if info.title.is_empty() {
                    item.title.clone()
                } else {
                    info.title.clone()
                },
                url: self.item_url(&info),
                missing_documents: item.missing_documents.clone(),
                invalid_documents: item.invalid_documents.clone(),
            };

            match groups.iter_mut().find(|(id, _)| *id == owner_id) {
                Some((_, list)) => list.push(listed),
                None => groups.push((owner_id, vec![listed])),
            }
        }

        tracing::debug!(owners = groups.len(), "Sending batch notifications");

        for (owner_id, listed) in groups {
            let Some(owner) = self.valid_owner(owner_id).await else {
                stats.emails_failed += 1;
                continue;
            };

            let values =
                Placeholders::batch(recipient(&owner), &listed, collection_id, &self.site, Utc::now());
            let subject = render_subject(&settings.templates.batch_subject, &values);
            let body = render_body(&settings.templates.batch_body, &values, settings.email_html);

            match self
                .deliver(&owner, 0, EMAIL_TYPE_BATCH, subject, body, settings)
                .await
            {
                NotifyOutcome::Sent => {
                    stats.emails_sent += 1;
                    stats.users_notified.push(owner_id);
                }
                _ => stats.emails_failed += 1,
            }
        }

        tracing::info!(
            sent = stats.emails_sent,
            failed = stats.emails_failed,
            "Batch notifications complete"
        );
        stats
    }

    // -----------------------------------------------------------------------
    // Test message
    // -----------------------------------------------------------------------

    /// Send the fixed configuration test message. Not recorded in the log.
    pub async fn send_test(&self, to: &str, settings: &CheckerSettings) -> Result<(), EmailError> {
        let to = to.trim();
        if !is_valid_email(to) {
            return Err(EmailError::Build("Invalid email address provided.".into()));
        }

        let email = OutgoingEmail {
            to: to.to_string(),
            subject: TEST_EMAIL_SUBJECT.into(),
            body: TEST_EMAIL_BODY.into(),
            html: false,
        };
        self.mailer.send(&settings.smtp, &email).await
    }

    // -----------------------------------------------------------------------
    // Log reads
    // -----------------------------------------------------------------------

    pub async fn email_logs(&self, query: &EmailLogQuery) -> Result<Vec<EmailLog>, sqlx::Error> {
        EmailLogRepo::list(&self.pool, query).await
    }

    /// Counters over the last `days` days (at least one).
    pub async fn email_stats(&self, days: i64) -> Result<EmailStats, sqlx::Error> {
        let since = Utc::now() - Duration::days(days.max(1));
        EmailLogRepo::stats_since(&self.pool, since).await
    }

    // ---- private helpers ----

    async fn item_info(&self, item_id: DbId) -> Option<ItemInfo> {
        match self.source.item_info(item_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Failed to load item information");
                None
            }
        }
    }

    async fn valid_owner(&self, user_id: DbId) -> Option<Owner> {
        match self.source.user(user_id).await {
            Ok(Some(owner)) if is_valid_email(&owner.email) => Some(owner),
            Ok(_) => {
                tracing::debug!(user_id, "Invalid user or email");
                None
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load user");
                None
            }
        }
    }

    fn item_url(&self, info: &ItemInfo) -> String {
        info.url.clone().unwrap_or_else(|| {
            format!(
                "{}/wp-admin/post.php?post={}&action=edit",
                self.site.url.trim_end_matches('/'),
                info.id
            )
        })
    }

    /// One send attempt plus its log row.
    async fn deliver(
        &self,
        owner: &Owner,
        item_id: DbId,
        email_type: &'static str,
        subject: String,
        body: String,
        settings: &CheckerSettings,
    ) -> NotifyOutcome {
        let email = OutgoingEmail {
            to: owner.email.trim().to_string(),
            subject,
            body,
            html: settings.email_html,
        };

        let (outcome, status, error_message) = match self.mailer.send(&settings.smtp, &email).await {
            Ok(()) => (NotifyOutcome::Sent, EMAIL_STATUS_SENT, None),
            Err(e) => {
                tracing::warn!(user_id = owner.id, item_id, error = %e, "Email delivery failed");
                let msg = e.to_string();
                (NotifyOutcome::Failed(msg.clone()), EMAIL_STATUS_FAILED, Some(msg))
            }
        };

        let log = CreateEmailLog {
            user_id: owner.id,
            item_id,
            email_type,
            subject: email.subject,
            status,
            sent_date: Utc::now(),
            error_message,
        };
        if let Err(e) = EmailLogRepo::insert(&self.pool, &log).await {
            tracing::error!(user_id = owner.id, item_id, error = %e, "Failed to record email log");
        }

        outcome
    }
}

fn recipient(owner: &Owner) -> Recipient<'_> {
    Recipient {
        name: owner.name(),
        email: &owner.email,
    }
}
