//! 通知选择模块
//!
//! 将一次事件中新获得的徽章集合归约为单个展示决策，
//! 实际的用户通知由调用方负责。

mod selector;

pub use selector::{NotificationSelector, PresentationDecision, SelectionInput};
