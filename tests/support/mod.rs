#![allow(dead_code)]

pub mod http;
pub mod polymatch_env;
