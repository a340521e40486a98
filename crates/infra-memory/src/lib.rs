// tfdeploy Infrastructure - In-Memory Adapter
// Implements: JobStore (process-lifetime, no persistence across restarts)

mod job_store;

pub use job_store::MemoryJobStore;
