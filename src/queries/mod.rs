use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ServiceError;

pub mod supplier_queries;

/// Handles one concrete query type. Queries read state and never emit
/// domain events.
#[async_trait]
pub trait QueryHandler<Q>: Send + Sync {
    /// The return type of the query when executed successfully
    type Result;

    async fn execute(&self, query: Q) -> Result<Self::Result, ServiceError>;
}

#[async_trait]
trait ErasedQueryHandler: Send + Sync {
    async fn execute(
        &self,
        identifier: &str,
        query: Box<dyn Any + Send>,
    ) -> Result<Box<dyn Any + Send>, ServiceError>;
}

struct ErasedHandler<Q, H> {
    handler: H,
    _query: PhantomData<fn(Q)>,
}

#[async_trait]
impl<Q, H> ErasedQueryHandler for ErasedHandler<Q, H>
where
    Q: Send + 'static,
    H: QueryHandler<Q>,
    H::Result: Send + 'static,
{
    async fn execute(
        &self,
        identifier: &str,
        query: Box<dyn Any + Send>,
    ) -> Result<Box<dyn Any + Send>, ServiceError> {
        let query = query.downcast::<Q>().map_err(|_| {
            ServiceError::InternalError(format!(
                "query dispatched to '{}' has a mismatched payload type",
                identifier
            ))
        })?;
        let result = self.handler.execute(*query).await?;
        Ok(Box::new(result))
    }
}

/// String-keyed query dispatcher. Registering under a taken identifier
/// overwrites the previous handler; registration takes `&mut self` and is
/// expected to finish before the bus is shared.
pub struct QueryBus {
    handlers: HashMap<String, Box<dyn ErasedQueryHandler>>,
}

impl QueryBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<Q, H>(&mut self, identifier: impl Into<String>, handler: H)
    where
        Q: Send + 'static,
        H: QueryHandler<Q> + 'static,
        H::Result: Send + 'static,
    {
        let identifier = identifier.into();
        debug!(identifier = %identifier, "registering query handler");
        self.handlers.insert(
            identifier,
            Box::new(ErasedHandler {
                handler,
                _query: PhantomData,
            }),
        );
    }

    pub async fn execute<Q, R>(&self, identifier: &str, query: Q) -> Result<R, ServiceError>
    where
        Q: Send + 'static,
        R: 'static,
    {
        let handler = self
            .handlers
            .get(identifier)
            .ok_or_else(|| ServiceError::QueryHandlerNotFound(identifier.to_string()))?;

        let result = handler.execute(identifier, Box::new(query)).await?;
        result.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
            ServiceError::InternalError(format!(
                "handler for '{}' produced an unexpected result type",
                identifier
            ))
        })
    }
}

impl Default for QueryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct CountQuery;
    struct OtherQuery;

    struct CountHandler {
        value: u64,
    }

    #[async_trait]
    impl QueryHandler<CountQuery> for CountHandler {
        type Result = u64;

        async fn execute(&self, _query: CountQuery) -> Result<Self::Result, ServiceError> {
            Ok(self.value)
        }
    }

    #[tokio::test]
    async fn executes_the_registered_handler() {
        let mut bus = QueryBus::new();
        bus.register("count", CountHandler { value: 7 });

        let result: u64 = bus.execute("count", CountQuery).await.unwrap();
        assert_eq!(result, 7);
    }

    #[tokio::test]
    async fn registering_twice_keeps_only_the_second_handler() {
        let mut bus = QueryBus::new();
        bus.register("count", CountHandler { value: 1 });
        bus.register("count", CountHandler { value: 2 });

        let result: u64 = bus.execute("count", CountQuery).await.unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn unknown_identifier_fails_with_query_handler_not_found() {
        let bus = QueryBus::new();

        let err = bus
            .execute::<CountQuery, u64>("missing", CountQuery)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::QueryHandlerNotFound(ref id) if id == "missing");
        assert_eq!(
            err.to_string(),
            "No handler registered for query missing"
        );
    }

    #[tokio::test]
    async fn mismatched_payload_type_is_an_internal_error() {
        let mut bus = QueryBus::new();
        bus.register("count", CountHandler { value: 7 });

        let err = bus
            .execute::<OtherQuery, u64>("count", OtherQuery)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::InternalError(msg) if msg.contains("count"));
    }
}
