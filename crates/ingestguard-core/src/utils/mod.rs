pub mod hasher;
pub mod operator;
