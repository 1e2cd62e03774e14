pub mod audit;
pub mod project;
pub mod scenarios;
pub mod seed;
