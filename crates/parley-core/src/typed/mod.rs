//! Typed - 型付きアクション API
//!
//! アクション名の typo を型で排除し、params の形を serde で検証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Action` trait, `ActionHandler<A>` trait - 型安全
//! - **内部（Dyn）**: `DynActionHandler` trait - object-safe, type erasure
//! - **codec**: envelope ⇔ `ActionRequest` の変換（legacy / standard 両対応）

pub mod action;
pub mod codec;
pub mod handler;
pub mod registry;

pub use self::action::Action;
pub use self::codec::{ActionEnvelope, ActionRequest};
pub use self::handler::{ActionError, ActionHandler, DynActionHandler, TypedActionHandler};
pub use self::registry::{ActionRegistry, RegistryError};
