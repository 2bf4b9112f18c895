//! In-memory store backends.

mod completion;
mod notification;
mod subject;

pub use completion::MemoryCompletionStore;
pub use notification::MemoryNotificationStore;
pub use subject::MemorySubjectStore;
