//! Pipeline stages for artifact extraction.
//!
//! Each submodule implements one step. All of them are synchronous and pure
//! except [`input`], which touches the filesystem.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ parse ──▶ boilerplate ──▶ locate ──▶ resolve ──▶ context ──▶ assemble
//! (bytes)    (dialect)   (Dom)     (root, paras)  (candidates) (fields)  (citing/ctx)  (records)
//!                                                                 metadata ──┘
//! ```
//!
//! 1. [`input`]       — discover document files and load their bytes
//! 2. [`classify`]    — web page or structured XML, from a short prefix
//! 3. [`parse`]       — HTML or namespace-aware XML into the shared [`dom::Dom`],
//!    falling back to the other parser on failure
//! 4. [`boilerplate`] — strip site chrome, pick the article root, collect paragraphs
//! 5. [`locate`]      — image and table candidates with their containers
//! 6. [`resolve`]     — captions, sources, alt text, table bodies
//! 7. [`context`]     — citing and contextual paragraphs per artifact
//! 8. [`assemble`]    — artifact ids and output records
//!
//! [`metadata`] reads title, authors, abstract and date off the same tree;
//! [`text`] holds the normaliser and term extractor every stage shares.

pub mod assemble;
pub mod boilerplate;
pub mod classify;
pub mod context;
pub mod dom;
pub mod input;
pub mod locate;
pub mod metadata;
pub mod parse;
pub mod resolve;
pub mod text;
