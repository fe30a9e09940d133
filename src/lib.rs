//! Small, independent utilities: whole-file reads and copies, directory
//! listings, operator-token comparisons, Nth-occurrence search, XML escaping,
//! path separator mapping, map clearing, and a signal registrar that turns OS
//! signal deliveries into `"done"` messages on a caller-owned channel.

pub mod config;
pub mod fsutil;
pub mod maps;
pub mod pathsep;
pub mod predicate;
pub mod signals;
pub mod text;

#[cfg(test)]
mod test_support;
