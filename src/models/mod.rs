pub mod jdk;

pub use jdk::{Architecture, JdkExecutables, JdkRecord, RecordKey};
