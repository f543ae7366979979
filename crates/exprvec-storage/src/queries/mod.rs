//! SQL operations grouped by table family. Every function takes a borrowed
//! connection; the engine decides which connection and transaction.

pub mod annotations;
pub mod checksum;
pub mod descriptors;
pub mod entities;
pub mod processed;
pub mod raw;
