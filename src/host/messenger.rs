use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Topic {
    message: TypeId,
    channel: Option<i32>,
}

impl Topic {
    fn of<M: 'static>(channel: Option<i32>) -> Self {
        Self {
            message: TypeId::of::<M>(),
            channel,
        }
    }
}

#[derive(Default)]
struct Registry {
    topics: HashMap<Topic, Vec<(Uuid, Handler)>>,
}

impl Registry {
    fn remove(&mut self, topic: &Topic, id: Uuid) {
        if let Some(handlers) = self.topics.get_mut(topic) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
            if handlers.is_empty() {
                self.topics.remove(topic);
            }
        }
    }
}

/// Typed publish/subscribe broker, optionally partitioned by an integer channel.
///
/// Messages sent without a channel reach only subscribers without a channel,
/// and vice versa. Handlers run in subscription order, on the sender's task.
#[derive(Clone, Default)]
pub struct Messenger {
    registry: Arc<Mutex<Registry>>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<M, F>(&self, handler: F) -> Subscription
    where
        M: Any + Send + Sync,
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.subscribe_topic(Topic::of::<M>(None), handler)
    }

    pub fn subscribe_on<M, F>(&self, channel: i32, handler: F) -> Subscription
    where
        M: Any + Send + Sync,
        F: Fn(&M) + Send + Sync + 'static,
    {
        self.subscribe_topic(Topic::of::<M>(Some(channel)), handler)
    }

    /// Delivers `message` to every subscriber of `M`. Returns the number of
    /// handlers invoked.
    pub fn send<M: Any + Send + Sync>(&self, message: &M) -> usize {
        self.deliver(Topic::of::<M>(None), message)
    }

    pub fn send_on<M: Any + Send + Sync>(&self, message: &M, channel: i32) -> usize {
        self.deliver(Topic::of::<M>(Some(channel)), message)
    }

    pub fn subscriber_count<M: Any>(&self, channel: Option<i32>) -> usize {
        self.registry
            .lock()
            .topics
            .get(&Topic::of::<M>(channel))
            .map_or(0, Vec::len)
    }

    fn subscribe_topic<M, F>(&self, topic: Topic, handler: F) -> Subscription
    where
        M: Any + Send + Sync,
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let erased: Handler = Arc::new(move |message: &dyn Any| {
            if let Some(message) = message.downcast_ref::<M>() {
                handler(message);
            }
        });

        self.registry
            .lock()
            .topics
            .entry(topic)
            .or_default()
            .push((id, erased));

        Subscription {
            id,
            topic,
            registry: Arc::downgrade(&self.registry),
        }
    }

    fn deliver(&self, topic: Topic, message: &dyn Any) -> usize {
        // Handlers may subscribe or drop subscriptions, so never call them under the lock.
        let handlers: Vec<Handler> = self
            .registry
            .lock()
            .topics
            .get(&topic)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        for handler in &handlers {
            handler(message);
        }

        handlers.len()
    }
}

/// Keeps a handler registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: Uuid,
    topic: Topic,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.topic, self.id);
        }
    }
}
