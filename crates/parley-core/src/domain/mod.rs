//! Domain model (ids, roles, envelopes, parts, tasks, states, errors).
//!
//! - envelope: バスが扱う共通 trait
//! - legacy / standard: 2 種類のワイヤー形式
//! - task / state: タスクのライフサイクル

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod legacy;
pub mod role;
pub mod standard;
pub mod state;
pub mod task;
pub(crate) mod wire;

pub use self::envelope::Envelope;
pub use self::errors::{DecodeError, TaskError};
pub use self::ids::{MessageId, SessionId, TaskId};
pub use self::legacy::{LegacyEnvelope, LegacyPayload, MessageType};
pub use self::role::AgentRole;
pub use self::standard::{AgentMessage, FilePart, JsonPart, JsonType, Message, MessageRole, Part, TextPart, TextType};
pub use self::state::TaskState;
pub use self::task::{Artifact, Task, TaskStatus, message_with_context};
pub use self::wire::Object;
