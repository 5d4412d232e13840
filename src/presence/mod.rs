// 在线状态服务端：记录、存储、读取时推导和变化历史

pub mod history;
pub mod record;
pub mod resolver;
pub mod store;

pub use history::{HistoryEntry, TransitionHistory};
pub use record::{PresenceRecord, PresenceUpdate, UserProfile};
pub use resolver::{DisplayedPresence, resolve};
pub use store::{PresenceStore, StoreError};
