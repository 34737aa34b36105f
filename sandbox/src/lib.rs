pub mod init;
pub mod report;
pub mod scenario;
pub mod spawn;
pub mod waves;

pub const TICKS_PER_SECOND: u64 = 60;
