use std::env;
use lazy_static::lazy_static;
use num_cpus;
use crate::SSC;

lazy_static! {
    pub static ref CONFIG_DEF: SSC = SSC {
        mode: String::from("generate"),
        key: String::from("key"),
        input: String::from("stdin"),
        output: String::from("stdout"),
        bits: 512,
        rounds: 100,
        seed: None,
        user: env::var("USER").unwrap_or_else(|_| String::from("default")),
        threads: num_cpus::get(),
        silent: false,
    };
}
