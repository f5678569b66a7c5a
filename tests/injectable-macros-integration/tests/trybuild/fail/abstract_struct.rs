#![allow(dead_code)]

use injectable_macros::Injectable;

#[derive(Injectable)]
#[injectable(abstract)]
struct Service;

fn main() {}
