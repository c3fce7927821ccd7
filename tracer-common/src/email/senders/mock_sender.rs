use async_trait::async_trait;
use std::sync::Mutex;

use crate::email::{EmailError, EmailMessage, SendEmail};

#[derive(Debug)]
pub struct SentEmail {
    pub body: String,
    pub subject: String,
    pub destination: String,
}

#[derive(Default)]
pub struct MockSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        let mut sent = self
            .sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *sent)
    }
}

#[async_trait]
impl SendEmail for MockSender {
    async fn send<'a>(&self, message: EmailMessage<'a>) -> Result<(), EmailError> {
        let mut sent = self
            .sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        sent.push(SentEmail {
            body: message.body,
            subject: String::from(message.subject),
            destination: String::from(message.destination),
        });

        Ok(())
    }
}
