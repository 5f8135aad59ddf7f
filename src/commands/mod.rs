use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::ServiceError;
use crate::events::{DomainEvent, EventBus};

pub mod suppliers;

/// What a command execution hands back: the caller-facing result plus the
/// uncommitted domain events of that invocation.
#[derive(Debug)]
pub struct CommandOutput<R> {
    pub result: R,
    pub events: Vec<DomainEvent>,
}

impl<R> CommandOutput<R> {
    pub fn new(result: R, events: Vec<DomainEvent>) -> Self {
        Self { result, events }
    }

    /// Output with no events attached.
    pub fn bare(result: R) -> Self {
        Self {
            result,
            events: Vec::new(),
        }
    }
}

/// Handles one concrete command type.
///
/// Handlers hold no per-invocation state; everything an execution produces
/// travels in the returned `CommandOutput`, which keeps a shared handler safe
/// under concurrent dispatch.
#[async_trait]
pub trait CommandHandler<C>: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(&self, command: C) -> Result<CommandOutput<Self::Result>, ServiceError>;
}

/// Object-safe shim so handlers for different command types can share one
/// registry. Payloads cross the boundary as `Box<dyn Any>` and are downcast
/// back on each side.
#[async_trait]
trait ErasedCommandHandler: Send + Sync {
    async fn execute(
        &self,
        identifier: &str,
        command: Box<dyn Any + Send>,
    ) -> Result<(Box<dyn Any + Send>, Vec<DomainEvent>), ServiceError>;
}

struct ErasedHandler<C, H> {
    handler: H,
    _command: PhantomData<fn(C)>,
}

#[async_trait]
impl<C, H> ErasedCommandHandler for ErasedHandler<C, H>
where
    C: Send + 'static,
    H: CommandHandler<C>,
    H::Result: Send + 'static,
{
    async fn execute(
        &self,
        identifier: &str,
        command: Box<dyn Any + Send>,
    ) -> Result<(Box<dyn Any + Send>, Vec<DomainEvent>), ServiceError> {
        let command = command.downcast::<C>().map_err(|_| {
            ServiceError::InternalError(format!(
                "command dispatched to '{}' has a mismatched payload type",
                identifier
            ))
        })?;
        let output = self.handler.execute(*command).await?;
        Ok((Box::new(output.result), output.events))
    }
}

/// String-keyed command dispatcher.
///
/// Registering under an identifier that is already taken overwrites the
/// previous handler. After a handler succeeds, its events go out through the
/// event bus before the result is handed back; a failed handler publishes
/// nothing. Registration takes `&mut self` and is expected to finish before
/// the bus is shared.
pub struct CommandBus {
    handlers: HashMap<String, Box<dyn ErasedCommandHandler>>,
    event_bus: Arc<EventBus>,
}

impl CommandBus {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self {
            handlers: HashMap::new(),
            event_bus,
        }
    }

    pub fn register<C, H>(&mut self, identifier: impl Into<String>, handler: H)
    where
        C: Send + 'static,
        H: CommandHandler<C> + 'static,
        H::Result: Send + 'static,
    {
        let identifier = identifier.into();
        debug!(identifier = %identifier, "registering command handler");
        self.handlers.insert(
            identifier,
            Box::new(ErasedHandler {
                handler,
                _command: PhantomData,
            }),
        );
    }

    pub async fn execute<C, R>(&self, identifier: &str, command: C) -> Result<R, ServiceError>
    where
        C: Send + 'static,
        R: 'static,
    {
        let handler = self
            .handlers
            .get(identifier)
            .ok_or_else(|| ServiceError::HandlerNotFound(identifier.to_string()))?;

        let (result, events) = handler.execute(identifier, Box::new(command)).await?;
        if !events.is_empty() {
            self.event_bus.publish_all(&events).await?;
        }

        result.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
            ServiceError::InternalError(format!(
                "handler for '{}' produced an unexpected result type",
                identifier
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventListener, SUPPLIER_CREATED};
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    struct PingCommand;
    struct OtherCommand;

    struct PingHandler {
        reply: &'static str,
        events: Vec<DomainEvent>,
    }

    #[async_trait]
    impl CommandHandler<PingCommand> for PingHandler {
        type Result = String;

        async fn execute(
            &self,
            _command: PingCommand,
        ) -> Result<CommandOutput<Self::Result>, ServiceError> {
            Ok(CommandOutput::new(
                self.reply.to_string(),
                self.events.clone(),
            ))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl CommandHandler<PingCommand> for FailingHandler {
        type Result = String;

        async fn execute(
            &self,
            _command: PingCommand,
        ) -> Result<CommandOutput<Self::Result>, ServiceError> {
            Err(ServiceError::ValidationError("rejected".into()))
        }
    }

    struct RecordingListener {
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventListener for RecordingListener {
        async fn handle(&self, event: &DomainEvent) -> Result<(), ServiceError> {
            self.log.lock().unwrap().push(event.event_name.clone());
            Ok(())
        }
    }

    fn bus_with_recorder() -> (CommandBus, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut event_bus = EventBus::new();
        event_bus.register(
            SUPPLIER_CREATED,
            Arc::new(RecordingListener { log: log.clone() }),
        );
        (CommandBus::new(Arc::new(event_bus)), log)
    }

    #[tokio::test]
    async fn executes_the_registered_handler() {
        let (mut bus, _log) = bus_with_recorder();
        bus.register(
            "ping",
            PingHandler {
                reply: "pong",
                events: vec![],
            },
        );

        let result: String = bus.execute("ping", PingCommand).await.unwrap();
        assert_eq!(result, "pong");
    }

    #[tokio::test]
    async fn registering_twice_keeps_only_the_second_handler() {
        let (mut bus, _log) = bus_with_recorder();
        bus.register(
            "ping",
            PingHandler {
                reply: "first",
                events: vec![],
            },
        );
        bus.register(
            "ping",
            PingHandler {
                reply: "second",
                events: vec![],
            },
        );

        let result: String = bus.execute("ping", PingCommand).await.unwrap();
        assert_eq!(result, "second");
    }

    #[tokio::test]
    async fn unknown_identifier_fails_with_handler_not_found() {
        let (bus, _log) = bus_with_recorder();

        let err = bus
            .execute::<PingCommand, String>("missing", PingCommand)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::HandlerNotFound(id) if id == "missing");
    }

    #[tokio::test]
    async fn events_are_published_after_a_successful_execution() {
        let (mut bus, log) = bus_with_recorder();
        bus.register(
            "ping",
            PingHandler {
                reply: "pong",
                events: vec![
                    DomainEvent::new("id-1", SUPPLIER_CREATED),
                    DomainEvent::new("id-2", SUPPLIER_CREATED),
                ],
            },
        );

        let _: String = bus.execute("ping", PingCommand).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![SUPPLIER_CREATED, SUPPLIER_CREATED]
        );
    }

    #[tokio::test]
    async fn a_failing_handler_publishes_nothing() {
        let (mut bus, log) = bus_with_recorder();
        bus.register("ping", FailingHandler);

        let err = bus
            .execute::<PingCommand, String>("ping", PingCommand)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::ValidationError(_));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_payload_type_is_an_internal_error() {
        let (mut bus, _log) = bus_with_recorder();
        bus.register(
            "ping",
            PingHandler {
                reply: "pong",
                events: vec![],
            },
        );

        let err = bus
            .execute::<OtherCommand, String>("ping", OtherCommand)
            .await
            .unwrap_err();

        assert_matches!(err, ServiceError::InternalError(msg) if msg.contains("ping"));
    }
}
