//! parley-core
//!
//! In-process agent-to-agent messaging.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, roles, legacy / standard envelopes, parts, tasks, states, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, Tool）
//! - **app**: アプリケーションロジック（MessageBus, BusBuilder, thread, TaskManager）
//! - **typed**: 型付きアクション API（Action, ActionHandler, ActionRegistry, ActionEnvelope）
//! - **agents**: 具体的なエージェント（company, person, weather, coordinator）
//! - **observability**: 統計と会話ダンプ
//! - **config**: JSON 設定
//! - **error**: バスのエラー型

pub mod agents;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod ports;
pub mod typed;

pub use crate::app::{BusBuilder, MessageBus, TaskManager};
pub use crate::config::ParleyConfig;
pub use crate::error::{BusError, HandlerError};
