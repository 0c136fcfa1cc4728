//! XmlPos - XML parsing with per-element source lines
//!
//! A single scan drives two consumers at once: a tree builder and a
//! position recorder that notes the current line at every start tag. The
//! recorded lines are then attached to the finished tree in element
//! pre-order.
//!
//! Modules:
//! - core: scanner, spans and the `ScanHandler` event seam
//! - dom: arena document and the tree builder
//! - position: locator, recorder, queue and annotator
//! - strategy: single-document pipeline and parallel batches

use rustler::{Binary, Env, NifResult, Term};

pub mod core;
pub mod dom;
pub mod error;
pub mod position;
pub mod strategy;
mod term;

use strategy::{element_lines, parse_with_lines, ParseOptions};
use term::{document_to_term, element_lines_to_term, error_to_term};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Annotated DOM
// ============================================================================

fn parse_to_term<'a>(env: Env<'a>, input: &[u8], options: &ParseOptions) -> Term<'a> {
    match parse_with_lines(input, options) {
        Ok(doc) => document_to_term(env, &doc),
        Err(err) => error_to_term(env, &err),
    }
}

/// Parse XML into `{:ok, {:element, name, attrs, children, line}}`
/// Lenient mode - repairs unclosed and stray tags
#[rustler::nif(name = "parse_with_lines")]
fn parse_with_lines_nif<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    Ok(parse_to_term(env, input.as_slice(), &ParseOptions::default()))
}

/// Parse XML in strict mode (returns {:ok, tree} or {:error, reason})
#[rustler::nif]
fn parse_with_lines_strict<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    Ok(parse_to_term(env, input.as_slice(), &ParseOptions::strict()))
}

// ============================================================================
// Element Lines
// ============================================================================

/// `[{name, line}]` for every element, in document order
#[rustler::nif(name = "element_lines")]
fn element_lines_nif<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let term = match parse_with_lines(input.as_slice(), &ParseOptions::default()) {
        Ok(doc) => element_lines_to_term(env, &element_lines(&doc)),
        Err(err) => error_to_term(env, &err),
    };
    Ok(term)
}

/// Element lines for many documents, computed in parallel
/// Results keep input order; a failed document yields {:error, reason}
#[rustler::nif(schedule = "DirtyCpu")]
fn element_lines_batch<'a>(env: Env<'a>, inputs: Vec<Binary<'a>>) -> NifResult<Term<'a>> {
    let slices: Vec<&[u8]> = inputs.iter().map(|b| b.as_slice()).collect();
    let results = strategy::element_lines_parallel(&slices, &ParseOptions::default());

    let mut list = Term::list_new_empty(env);
    for result in results.into_iter().rev() {
        let term = match result {
            Ok(lines) => element_lines_to_term(env, &lines),
            Err(err) => error_to_term(env, &err),
        };
        list = list.list_prepend(term);
    }
    Ok(list)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlPos.Native");
