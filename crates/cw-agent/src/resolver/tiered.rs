//! Tiered resolver: model first, rules as fallback.
//!
//! Tries the primary resolver first. If it recognizes nothing, the fallback
//! gets the same text and catalog. Each call carries its own `source`, so
//! the audit trail shows which tier produced it.

use async_trait::async_trait;

use cw_functions::FunctionSpec;
use cw_protocol::calls::ResolvedCall;

use super::IntentResolver;

/// Composite resolver that tries `primary`, then `fallback`.
pub struct TieredResolver {
    primary: Box<dyn IntentResolver>,
    fallback: Box<dyn IntentResolver>,
}

impl TieredResolver {
    pub fn new(primary: Box<dyn IntentResolver>, fallback: Box<dyn IntentResolver>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl IntentResolver for TieredResolver {
    async fn resolve(&self, text: &str, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
        let calls = self.primary.resolve(text, catalog).await;
        if !calls.is_empty() {
            return calls;
        }

        tracing::debug!(
            primary = self.primary.tier_name(),
            fallback = self.fallback.tier_name(),
            "primary resolver missed, falling back"
        );
        self.fallback.resolve(text, catalog).await
    }

    fn tier_name(&self) -> &str {
        "tiered"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_protocol::calls::CallSource;
    use serde_json::json;

    /// Mock resolver that always returns a fixed result.
    struct MockResolver {
        calls: Vec<ResolvedCall>,
        name: &'static str,
    }

    impl MockResolver {
        fn hit(name: &'static str, function: &str, source: CallSource) -> Self {
            Self {
                calls: vec![ResolvedCall::new(function, json!({}), source)],
                name,
            }
        }

        fn miss(name: &'static str) -> Self {
            Self {
                calls: Vec::new(),
                name,
            }
        }
    }

    #[async_trait]
    impl IntentResolver for MockResolver {
        async fn resolve(&self, _text: &str, _catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
            self.calls.clone()
        }

        fn tier_name(&self) -> &str {
            self.name
        }
    }

    #[tokio::test]
    async fn primary_hit_skips_fallback() {
        let resolver = TieredResolver::new(
            Box::new(MockResolver::hit("model", "search_patient", CallSource::Model)),
            Box::new(MockResolver::hit("rules", "book_appointment", CallSource::Rules)),
        );

        let calls = resolver.resolve("find Ravi", &[]).await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function_name, "search_patient");
        assert_eq!(calls[0].source, CallSource::Model);
    }

    #[tokio::test]
    async fn fallback_on_primary_miss() {
        let resolver = TieredResolver::new(
            Box::new(MockResolver::miss("model")),
            Box::new(MockResolver::hit("rules", "find_available_slots", CallSource::Rules)),
        );

        let calls = resolver.resolve("any cardiology slots?", &[]).await;
        assert_eq!(calls[0].function_name, "find_available_slots");
        assert_eq!(calls[0].source, CallSource::Rules);
    }

    #[tokio::test]
    async fn both_miss_returns_empty() {
        let resolver = TieredResolver::new(
            Box::new(MockResolver::miss("model")),
            Box::new(MockResolver::miss("rules")),
        );

        assert!(resolver.resolve("hello world", &[]).await.is_empty());
        assert_eq!(resolver.tier_name(), "tiered");
    }
}
