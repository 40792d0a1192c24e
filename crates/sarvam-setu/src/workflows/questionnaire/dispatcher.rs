use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error};

use super::domain::{ChatEvent, UserId};
use super::engine::QuestionnaireEngine;
use super::gateway::ChatGateway;
use super::matching::RuleSource;
use super::store::SessionStore;

/// Idle time after which a user's mailbox task exits.
pub const DEFAULT_MAILBOX_IDLE: Duration = Duration::from_secs(60);

type Mailboxes = Arc<Mutex<HashMap<UserId, mpsc::UnboundedSender<ChatEvent>>>>;

/// Routes inbound events to one mailbox task per user.
///
/// A user's events are handled strictly in arrival order; different users run concurrently.
/// Senders are only used while the mailbox map is locked, and a task only retires while holding
/// the same lock with an empty queue, so no event is dropped between the two.
pub struct EventDispatcher<S, G, R> {
    engine: Arc<QuestionnaireEngine<S, G, R>>,
    mailboxes: Mailboxes,
    idle_timeout: Duration,
}

impl<S, G, R> EventDispatcher<S, G, R>
where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    pub fn new(engine: Arc<QuestionnaireEngine<S, G, R>>, idle_timeout: Duration) -> Self {
        Self {
            engine,
            mailboxes: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn engine(&self) -> &Arc<QuestionnaireEngine<S, G, R>> {
        &self.engine
    }

    /// Queue `event` behind any pending events for the same user. Requires a Tokio runtime.
    pub fn dispatch(&self, event: ChatEvent) {
        let user = event.user_id().clone();
        let mut mailboxes = lock(&self.mailboxes);

        let event = match mailboxes.get(&user) {
            Some(sender) => match sender.send(event) {
                Ok(()) => return,
                // The task died without retiring; start a new one below.
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        if sender.send(event).is_err() {
            return;
        }
        mailboxes.insert(user.clone(), sender);
        drop(mailboxes);

        debug!(user_id = %user, "mailbox opened");
        tokio::spawn(run_mailbox(
            self.engine.clone(),
            self.mailboxes.clone(),
            user,
            receiver,
            self.idle_timeout,
        ));
    }

    /// Consume an inbound event stream until every sender is dropped.
    pub async fn run(&self, mut events: mpsc::Receiver<ChatEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
    }

    pub fn active_mailboxes(&self) -> usize {
        lock(&self.mailboxes).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run_mailbox<S, G, R>(
    engine: Arc<QuestionnaireEngine<S, G, R>>,
    mailboxes: Mailboxes,
    user: UserId,
    mut receiver: mpsc::UnboundedReceiver<ChatEvent>,
    idle_timeout: Duration,
) where
    S: SessionStore + 'static,
    G: ChatGateway + 'static,
    R: RuleSource + 'static,
{
    loop {
        let event = match tokio::time::timeout(idle_timeout, receiver.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                let pending = {
                    let mut guard = lock(&mailboxes);
                    match receiver.try_recv() {
                        Ok(event) => Some(event),
                        Err(_) => {
                            guard.remove(&user);
                            None
                        }
                    }
                };
                match pending {
                    Some(event) => event,
                    None => break,
                }
            }
        };

        let label = event.label();
        if let Err(err) = engine.handle(event).await {
            error!(user_id = %user, event = label, error = %err, "failed to process chat event");
        }
    }

    debug!(user_id = %user, "mailbox closed");
}
