//! Durable task dispatch and the worker runtime.

pub mod dispatcher;
pub mod worker;

pub use dispatcher::QueueTaskDispatcher;
pub use worker::Worker;
