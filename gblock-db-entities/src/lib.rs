#![allow(non_snake_case)]

pub mod BlockWhitelist;
pub mod GlobalBlock;
