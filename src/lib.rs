#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
pub mod collect;
pub mod config;
pub mod lookup;
pub mod pipeline;
pub mod resolve;
pub mod rewrite;
pub mod types;
