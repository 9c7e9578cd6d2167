//! App - アプリケーション層
//!
//! domain と ports を組み合わせて、エージェント間通信を実装します。
//!
//! # 主要コンポーネント
//! - **MessageBus**: 同期ルーティングと履歴
//! - **BusBuilder**: バスの構築と起動時検証
//! - **AgentRegistry**: ロール → ハンドラ
//! - **thread**: 会話スレッドの再構築
//! - **TaskManager**: タスクとセッションの台帳

pub mod builder;
pub mod bus;
pub mod registry;
pub mod task_manager;
pub mod thread;

pub use self::builder::BusBuilder;
pub use self::bus::MessageBus;
pub use self::registry::{AgentHandler, AgentRegistry, FnHandler, Registration, handler_fn};
pub use self::task_manager::TaskManager;
pub use self::thread::{ThreadNode, ThreadTree};
