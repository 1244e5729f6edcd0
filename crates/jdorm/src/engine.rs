//! Result mapping: turning driver rows into managed entity instances.

pub(crate) mod coerce;

pub(crate) mod hydrate;
