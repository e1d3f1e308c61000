mod queue;

pub use queue::ImportQueue;
