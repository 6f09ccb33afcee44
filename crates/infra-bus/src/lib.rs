// ytflow Infrastructure - Event Bus Adapter
// Implements: EventEmitter, EventSubscriber

mod memory_bus;

pub use memory_bus::{InMemoryEventBus, DEFAULT_BUS_CAPACITY};
