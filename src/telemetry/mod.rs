pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one per CLI operation
pub fn init() -> LogCtx<ops::init::Init> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn reconcile() -> LogCtx<ops::reconcile::Reconcile> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn legacy() -> LogCtx<ops::legacy::Legacy> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
