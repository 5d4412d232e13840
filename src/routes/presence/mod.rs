mod handler;
mod model;

pub use handler::{health, list_history, query_presence, status_list, update_presence};
pub use model::{
    HealthResponse, HistoryQuery, HistoryResponse, PresenceListResponse, PresenceQuery,
    StatusListResponse, UpdatePresenceRequest, UpdatePresenceResponse,
};
