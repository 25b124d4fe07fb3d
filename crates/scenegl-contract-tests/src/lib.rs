#![forbid(unsafe_code)]

//! Backend-agnostic contract tests for the node execution engine. Everything runs headless on
//! `NullBackend` and a software state driver.

#[cfg(test)]
mod bench;

#[cfg(test)]
mod lifecycle;

#[cfg(test)]
mod evaluation;

#[cfg(test)]
mod scoping;

#[cfg(test)]
mod fixtures;
