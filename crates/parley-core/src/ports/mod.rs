//! Ports - 抽象化レイヤー
//!
//! 外部との境界（時刻・ID 生成・envelope の刻印・外部ツール）を trait で切り出し、
//! テストでは決定的な実装に差し替えます。

pub mod clock;
pub mod id_generator;
pub mod stamper;
pub mod tool;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::stamper::Stamper;
pub use self::tool::{FnTool, Tool, ToolResult, Toolbox, tool_fn};
