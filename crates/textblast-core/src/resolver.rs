//! Recipient resolution - expands campaign targets into message intents

use crate::template::TemplateRenderer;
use async_trait::async_trait;
use textblast_common::types::{ContactId, PhoneNumber};
use textblast_storage::models::Campaign;
use textblast_storage::{ContactRepository, StoreError, TemplateRepository};
use thiserror::Error;

/// A (recipient, rendered body) pair queued for transmission
///
/// Created per send attempt; not persisted beyond the attempt.
#[derive(Debug, Clone)]
pub struct MessageIntent {
    pub contact_id: ContactId,
    pub phone: String,
    pub body: String,
}

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("campaign template not found")]
    MissingTemplate,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Expands a campaign's target groups into a deduplicated, rendered
/// recipient set
#[async_trait]
pub trait RecipientResolver: Send + Sync {
    async fn resolve(&self, campaign: &Campaign) -> Result<Vec<MessageIntent>, ResolveError>;
}

/// Resolver backed by the contact and template repositories
pub struct StoreRecipientResolver {
    contacts: ContactRepository,
    templates: TemplateRepository,
    renderer: TemplateRenderer,
}

impl StoreRecipientResolver {
    pub fn new(contacts: ContactRepository, templates: TemplateRepository) -> Self {
        Self {
            contacts,
            templates,
            renderer: TemplateRenderer::new(),
        }
    }
}

#[async_trait]
impl RecipientResolver for StoreRecipientResolver {
    async fn resolve(&self, campaign: &Campaign) -> Result<Vec<MessageIntent>, ResolveError> {
        let template = self
            .templates
            .get(campaign.template_id)
            .await?
            .ok_or(ResolveError::MissingTemplate)?;

        let contacts = self.contacts.list_by_groups(&campaign.group_ids).await?;

        let intents = contacts
            .iter()
            .map(|contact| {
                // normalize the phone when it parses; pass it through raw
                // otherwise and let the transport report the failure
                let phone = PhoneNumber::parse(&contact.phone)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| contact.phone.clone());

                MessageIntent {
                    contact_id: contact.id,
                    phone,
                    body: self.renderer.render(&template.body, contact),
                }
            })
            .collect();

        Ok(intents)
    }
}
