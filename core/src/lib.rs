pub mod id;
pub mod message;
pub mod payload;
pub mod schema;

pub use id::{ActionName, EventType, NameError};
pub use message::{
    ActionError, ActionRequest, ActionResponse, ArgMap, ClientMessage, EventEnvelope,
};
pub use payload::{EventPayload, PLAYER_EVENT_TYPES, PlayerState, PlayerStatus};
pub use schema::{ActionSchema, ArgSpec};
