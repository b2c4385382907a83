//! `fantoccini`-backed implementation of the session traits.
pub mod capabilities;
pub mod driver;
pub mod element;
