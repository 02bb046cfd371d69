use async_trait::async_trait;

#[derive(Default)]
pub struct Router {
    table: std::collections::HashMap<String, Box<dyn RouteHandler>>,
}

impl Router {
    pub fn add_handler(&mut self, topic: &str, handler: Box<dyn RouteHandler>) {
        self.table.insert(String::from(topic), handler);
    }

    pub fn topics_for_subscription(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub async fn handle_message(&mut self, topic: &str, content: &[u8]) -> anyhow::Result<bool> {
        if let Some(handler) = self.table.get_mut(topic) {
            handler.call(topic, content).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn call(&mut self, topic: &str, content: &[u8]) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RouteHandler for CountingHandler {
        async fn call(&mut self, _topic: &str, _content: &[u8]) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl RouteHandler for FailingHandler {
        async fn call(&mut self, _topic: &str, _content: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("handler failed")
        }
    }

    #[tokio::test]
    async fn routes_to_matching_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut router = Router::default();
        router.add_handler(
            "blinds/up/set",
            Box::new(CountingHandler {
                calls: calls.clone(),
            }),
        );

        assert!(router.handle_message("blinds/up/set", b"true").await.unwrap());
        assert!(!router.handle_message("blinds/down/set", b"true").await.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_errors_are_returned() {
        let mut router = Router::default();
        router.add_handler("blinds/up/get", Box::new(FailingHandler));

        assert!(router.handle_message("blinds/up/get", b"").await.is_err());
    }

    #[test]
    fn lists_registered_topics() {
        let mut router = Router::default();
        router.add_handler("a", Box::new(FailingHandler));
        router.add_handler("b", Box::new(FailingHandler));

        let mut topics: Vec<_> = router.topics_for_subscription().collect();
        topics.sort();
        assert_eq!(topics, vec!["a", "b"]);
    }
}
