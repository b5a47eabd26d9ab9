//! CLI Commands

pub mod catalog;
pub mod demo;
pub mod evidence;
pub mod risk;
pub mod webhook;

pub use self::catalog::CatalogCommand;
pub use self::demo::DemoCommand;
pub use self::evidence::EvidenceCommand;
pub use self::risk::RiskCommand;
pub use self::webhook::WebhookCommand;
