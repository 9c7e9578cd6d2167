//! Agents - バス上で動く具体的なエージェント
//!
//! - **ActionAgent**: 型付きアクションを envelope で公開する汎用ハンドラ
//! - company / person / weather: ツールを呼ぶアクション群
//! - **Coordinator**: 他エージェントへの問い合わせを組み合わせるワークフロー

pub mod action_agent;
pub mod company;
pub mod coordinator;
pub mod person;
pub mod weather;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::action_agent::ActionAgent;
pub use self::company::{company_actions, company_agent};
pub use self::coordinator::{CompanyExecutivesReport, Coordinator, CoordinatorInbox, ExecutiveReport};
pub use self::person::{person_actions, person_agent};
pub use self::weather::weather_agent;
