pub mod app;
pub mod config;
pub mod domain;
pub mod ensembl;
pub mod error;
pub mod fasta;
pub mod output;
pub mod rest;
pub mod sequence;
pub mod store;
